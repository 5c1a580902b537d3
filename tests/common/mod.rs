#![allow(dead_code)]

use std::collections::BTreeMap;

use covpage::model::{
    CoverageMetric, CoverageSummary, FileCoverage, FileSummaryRecord, LineCoverage,
    ReportClasses, StatsDocument, StatementCoverage,
};

/// A file whose statements hit `covered` of `total` statements, all on
/// separate lines.
pub fn file_with_statements(path: &str, covered: u64, total: u64) -> FileCoverage {
    let mut file = FileCoverage::new(path.to_string());
    for i in 0..total {
        let hit_count = u64::from(i < covered);
        let line_number = i as u32 + 1;
        file.statements.push(StatementCoverage {
            start_line: line_number,
            hit_count,
        });
        file.lines.push(LineCoverage {
            line_number,
            hit_count,
        });
    }
    file
}

/// Summary record with the same counts for every metric kind.
pub fn record(file: &str, covered: u64, total: u64) -> FileSummaryRecord {
    let m = CoverageMetric::new(covered, total);
    FileSummaryRecord {
        file: file.to_string(),
        metrics: CoverageSummary {
            statements: m.clone(),
            branches: m.clone(),
            functions: m.clone(),
            lines: m,
        },
        report_classes: ReportClasses::EMPTY,
    }
}

pub fn document(records: Vec<FileSummaryRecord>) -> StatsDocument {
    let details = records
        .iter()
        .map(|r| (r.file.clone(), serde_json::json!({ "maxLines": 0 })))
        .collect::<BTreeMap<_, _>>();
    StatsDocument {
        datetime: 1_718_000_000_123,
        summary: records,
        details,
    }
}
