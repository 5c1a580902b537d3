//! Turns one file's coverage summary into a summary-table record.

use tracing::debug;

use crate::context::ReportContext;
use crate::model::{
    CoverageSummary, FileCoverage, FileSummaryRecord, MetricKind, ReportClasses,
};

/// A file as seen by the report driver.
pub trait CoverageNode {
    fn coverage_summary(&self) -> CoverageSummary;
    /// Path relative to the report root; the record's unique key.
    fn relative_name(&self) -> &str;
    fn file_coverage(&self) -> &FileCoverage;
}

/// A parsed file paired with its display name.
pub struct FileNode<'a> {
    pub coverage: &'a FileCoverage,
    pub name: String,
}

impl CoverageNode for FileNode<'_> {
    fn coverage_summary(&self) -> CoverageSummary {
        self.coverage.summary()
    }

    fn relative_name(&self) -> &str {
        &self.name
    }

    fn file_coverage(&self) -> &FileCoverage {
        self.coverage
    }
}

/// Build the summary record for `node`, or `None` when it is empty and
/// `skip_empty` is set.
///
/// Empty files get every percentage forced to 0 and every class forced to
/// `empty`; the classifier is only consulted for files with data.
pub fn aggregate(
    node: &dyn CoverageNode,
    ctx: &ReportContext<'_>,
    skip_empty: bool,
) -> Option<FileSummaryRecord> {
    let mut metrics = node.coverage_summary();
    let file = node.relative_name().to_string();

    if metrics.is_empty() {
        if skip_empty {
            debug!(file = %file, "skipping empty file");
            return None;
        }
        for kind in MetricKind::ALL {
            metrics.get_mut(kind).pct = 0.0;
        }
        return Some(FileSummaryRecord {
            file,
            metrics,
            report_classes: ReportClasses::EMPTY,
        });
    }

    let report_classes = ReportClasses {
        statements: ctx.classify(MetricKind::Statements, metrics.statements.pct),
        branches: ctx.classify(MetricKind::Branches, metrics.branches.pct),
        functions: ctx.classify(MetricKind::Functions, metrics.functions.pct),
        lines: ctx.classify(MetricKind::Lines, metrics.lines.pct),
    };
    Some(FileSummaryRecord {
        file,
        metrics,
        report_classes,
    })
}
