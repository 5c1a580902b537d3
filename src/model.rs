//! Data model shared by the whole pipeline.
//!
//! The first half is the uniform, format-independent coverage input that
//! parsers produce. The second half is the stats document that gets embedded
//! into the HTML artifact; its serde layout is the wire format read back by
//! the page bootstrap, so field names there are fixed.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CovpageError;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Coverage percentage rounded to two decimal places. Zero totals give 0.
#[must_use]
pub fn round_pct(covered: u64, total: u64) -> f64 {
    (rate(covered, total) * 100.0 * 100.0).round() / 100.0
}

// ── Input model ──────────────────────────────────────────────────────

/// A single line that was instrumentable.
#[derive(Debug, Clone, PartialEq)]
pub struct LineCoverage {
    pub line_number: u32,
    pub hit_count: u64,
}

/// A single statement. Only formats with statement granularity fill these.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementCoverage {
    pub start_line: u32,
    pub hit_count: u64,
}

/// A single branch arm on a given line.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchCoverage {
    pub line_number: u32,
    pub branch_index: u32,
    pub hit_count: u64,
}

/// A function/method that was instrumentable.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCoverage {
    pub name: String,
    pub start_line: Option<u32>,
    pub hit_count: u64,
}

/// Coverage data for a single source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileCoverage {
    pub path: String,
    pub lines: Vec<LineCoverage>,
    pub statements: Vec<StatementCoverage>,
    pub branches: Vec<BranchCoverage>,
    pub functions: Vec<FunctionCoverage>,
}

impl FileCoverage {
    pub fn new(path: String) -> Self {
        Self {
            path,
            ..Default::default()
        }
    }

    /// Roll the raw hit counts up into the four display metrics.
    ///
    /// Formats without statement data (LCOV) report statements equal to lines.
    #[must_use]
    pub fn summary(&self) -> CoverageSummary {
        let lines = count(self.lines.iter().map(|l| l.hit_count));
        let statements = if self.statements.is_empty() {
            lines.clone()
        } else {
            count(self.statements.iter().map(|s| s.hit_count))
        };
        CoverageSummary {
            statements,
            branches: count(self.branches.iter().map(|b| b.hit_count)),
            functions: count(self.functions.iter().map(|f| f.hit_count)),
            lines,
        }
    }
}

fn count(hits: impl Iterator<Item = u64>) -> CoverageMetric {
    let (covered, total) = hits.fold((0, 0), |(c, t), h| (c + u64::from(h > 0), t + 1));
    CoverageMetric::new(covered, total)
}

/// The complete result of parsing a single coverage file.
#[derive(Debug, Clone, Default)]
pub struct CoverageData {
    pub files: Vec<FileCoverage>,
}

impl CoverageData {
    pub fn new() -> Self {
        Self::default()
    }
}

// ── Stats document ───────────────────────────────────────────────────

/// The four metric kinds shown for every file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Statements,
    Branches,
    Functions,
    Lines,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Statements,
        MetricKind::Branches,
        MetricKind::Functions,
        MetricKind::Lines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Statements => "statements",
            MetricKind::Branches => "branches",
            MetricKind::Functions => "functions",
            MetricKind::Lines => "lines",
        }
    }
}

impl FromStr for MetricKind {
    type Err = CovpageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s.to_lowercase())
            .ok_or_else(|| {
                CovpageError::Parse(format!(
                    "Unknown metric: '{}'. Supported: statements, branches, functions, lines",
                    s
                ))
            })
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Covered/total counts for one metric kind, with the rounded percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageMetric {
    pub covered: u64,
    pub total: u64,
    pub pct: f64,
}

impl CoverageMetric {
    pub fn new(covered: u64, total: u64) -> Self {
        Self {
            covered,
            total,
            pct: round_pct(covered, total),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Coverage summary of one file: one metric per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageSummary {
    pub statements: CoverageMetric,
    pub branches: CoverageMetric,
    pub functions: CoverageMetric,
    pub lines: CoverageMetric,
}

impl CoverageSummary {
    pub fn get(&self, kind: MetricKind) -> &CoverageMetric {
        match kind {
            MetricKind::Statements => &self.statements,
            MetricKind::Branches => &self.branches,
            MetricKind::Functions => &self.functions,
            MetricKind::Lines => &self.lines,
        }
    }

    pub fn get_mut(&mut self, kind: MetricKind) -> &mut CoverageMetric {
        match kind {
            MetricKind::Statements => &mut self.statements,
            MetricKind::Branches => &mut self.branches,
            MetricKind::Functions => &mut self.functions,
            MetricKind::Lines => &mut self.lines,
        }
    }

    /// True when no metric has anything to cover.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        MetricKind::ALL.iter().all(|k| self.get(*k).is_empty())
    }
}

/// Qualitative bucket for a coverage percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportClass {
    Low,
    Medium,
    High,
    Empty,
}

impl ReportClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportClass::Low => "low",
            ReportClass::Medium => "medium",
            ReportClass::High => "high",
            ReportClass::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportClasses {
    pub statements: ReportClass,
    pub branches: ReportClass,
    pub functions: ReportClass,
    pub lines: ReportClass,
}

impl ReportClasses {
    pub const EMPTY: ReportClasses = ReportClasses {
        statements: ReportClass::Empty,
        branches: ReportClass::Empty,
        functions: ReportClass::Empty,
        lines: ReportClass::Empty,
    };

    pub fn get(&self, kind: MetricKind) -> ReportClass {
        match kind {
            MetricKind::Statements => self.statements,
            MetricKind::Branches => self.branches,
            MetricKind::Functions => self.functions,
            MetricKind::Lines => self.lines,
        }
    }
}

/// One row of the summary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummaryRecord {
    pub file: String,
    pub metrics: CoverageSummary,
    #[serde(rename = "reportClasses")]
    pub report_classes: ReportClasses,
}

/// Everything a report page displays, produced once per generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    /// Generation time, epoch milliseconds.
    pub datetime: i64,
    #[serde(rename = "Summary")]
    pub summary: Vec<FileSummaryRecord>,
    /// Per-file annotation payloads keyed by relative path. Opaque here.
    #[serde(rename = "Details")]
    pub details: BTreeMap<String, Value>,
}

impl StatsDocument {
    /// Annotation for a file. `None` just means there is nothing to show.
    pub fn detail(&self, file: &str) -> Option<&Value> {
        self.details.get(file)
    }

    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.datetime).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_pct() {
        assert_eq!(round_pct(8, 10), 80.0);
        assert_eq!(round_pct(1, 3), 33.33);
        assert_eq!(round_pct(2, 3), 66.67);
        assert_eq!(round_pct(0, 0), 0.0);
        assert_eq!(round_pct(5, 0), 0.0);
    }

    #[test]
    fn test_summary_statements_fall_back_to_lines() {
        let mut file = FileCoverage::new("src/lib.rs".to_string());
        file.lines.push(LineCoverage { line_number: 1, hit_count: 3 });
        file.lines.push(LineCoverage { line_number: 2, hit_count: 0 });

        let summary = file.summary();
        assert_eq!(summary.lines, CoverageMetric::new(1, 2));
        assert_eq!(summary.statements, summary.lines);
        assert_eq!(summary.lines.pct, 50.0);
        assert!(summary.branches.is_empty());
        assert_eq!(summary.branches.pct, 0.0);
        assert!(!summary.is_empty());
    }

    #[test]
    fn test_summary_uses_statements_when_present() {
        let mut file = FileCoverage::new("app.js".to_string());
        file.lines.push(LineCoverage { line_number: 1, hit_count: 1 });
        file.statements.push(StatementCoverage { start_line: 1, hit_count: 1 });
        file.statements.push(StatementCoverage { start_line: 1, hit_count: 0 });

        let summary = file.summary();
        assert_eq!(summary.statements, CoverageMetric::new(1, 2));
        assert_eq!(summary.lines, CoverageMetric::new(1, 1));
    }

    #[test]
    fn test_empty_file_summary() {
        let file = FileCoverage::new("empty.js".to_string());
        let summary = file.summary();
        assert!(summary.is_empty());
        for kind in MetricKind::ALL {
            assert_eq!(summary.get(kind).pct, 0.0);
        }
    }

    #[test]
    fn test_metric_kind_from_str() {
        assert_eq!("Branches".parse::<MetricKind>().unwrap(), MetricKind::Branches);
        assert!("cycles".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_wire_field_names() {
        let doc = StatsDocument {
            datetime: 1,
            summary: vec![FileSummaryRecord {
                file: "a.js".to_string(),
                metrics: FileCoverage::new("a.js".to_string()).summary(),
                report_classes: ReportClasses::EMPTY,
            }],
            details: BTreeMap::new(),
        };
        let json = serde_json::to_string(&doc).unwrap();
        assert!(json.starts_with(r#"{"datetime":1,"Summary":[{"file":"a.js""#));
        assert!(json.contains(r#""reportClasses":{"statements":"empty""#));
        assert!(json.ends_with(r#""Details":{}}"#));
    }

    #[test]
    fn test_missing_detail_is_none() {
        let doc = StatsDocument {
            datetime: 0,
            summary: vec![],
            details: BTreeMap::new(),
        };
        assert!(doc.detail("nope.js").is_none());
        assert_eq!(doc.generated_at().unwrap().timestamp(), 0);
    }
}
