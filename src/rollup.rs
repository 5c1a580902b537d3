//! Totals across every file in the summary table.

use crate::model::{CoverageMetric, FileSummaryRecord, MetricKind};

/// Sum covered/total for `kind` over all records. The percentage is rounded
/// to two decimals and is 0 when nothing is coverable.
#[must_use]
pub fn rollup(records: &[FileSummaryRecord], kind: MetricKind) -> CoverageMetric {
    let (covered, total) = records
        .iter()
        .map(|r| r.metrics.get(kind))
        .fold((0u64, 0u64), |(c, t), m| (c + m.covered, t + m.total));
    CoverageMetric::new(covered, total)
}

/// Roll-up for every metric kind, in display order.
#[must_use]
pub fn rollup_all(records: &[FileSummaryRecord]) -> Vec<(MetricKind, CoverageMetric)> {
    MetricKind::ALL
        .into_iter()
        .map(|kind| (kind, rollup(records, kind)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CoverageSummary, ReportClasses};

    fn record(file: &str, covered: u64, total: u64) -> FileSummaryRecord {
        let m = CoverageMetric::new(covered, total);
        FileSummaryRecord {
            file: file.to_string(),
            metrics: CoverageSummary {
                statements: m.clone(),
                branches: CoverageMetric::new(0, 0),
                functions: m.clone(),
                lines: m,
            },
            report_classes: ReportClasses::EMPTY,
        }
    }

    #[test]
    fn test_rollup_sums() {
        let records = vec![record("a.js", 8, 10), record("b.js", 0, 0), record("c.js", 1, 2)];
        let total = rollup(&records, MetricKind::Statements);
        assert_eq!(total.covered, 9);
        assert_eq!(total.total, 12);
        assert_eq!(total.pct, 75.0);
    }

    #[test]
    fn test_rollup_zero_total() {
        let records = vec![record("a.js", 8, 10)];
        let branches = rollup(&records, MetricKind::Branches);
        assert_eq!(branches, CoverageMetric::new(0, 0));
        assert_eq!(branches.pct, 0.0);
        assert_eq!(rollup(&[], MetricKind::Lines).pct, 0.0);
    }

    #[test]
    fn test_rollup_rounds_two_decimals() {
        let records = vec![record("a.js", 1, 3)];
        assert_eq!(rollup(&records, MetricKind::Lines).pct, 33.33);
    }

    #[test]
    fn test_rollup_all_order() {
        let kinds: Vec<MetricKind> = rollup_all(&[]).into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, MetricKind::ALL.to_vec());
    }
}
