//! Orderings for the summary table.
//!
//! All sorts are stable: records that compare equal keep their original
//! (discovery) order, in both directions.

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::CovpageError;
use crate::model::{FileSummaryRecord, MetricKind};

/// Which number of a metric to order by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricField {
    Pct,
    Total,
}

impl FromStr for MetricField {
    type Err = CovpageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pct" | "percent" => Ok(MetricField::Pct),
            "total" => Ok(MetricField::Total),
            _ => Err(CovpageError::Parse(format!(
                "Unknown sort field: '{}'. Supported: pct, total",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    File,
    Metric(MetricKind, MetricField),
}

/// Case-insensitive comparison of file paths, lowercase first on ties.
pub fn compare_file(a: &FileSummaryRecord, b: &FileSummaryRecord) -> Ordering {
    let folded = a
        .file
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.file.chars().flat_map(char::to_lowercase));
    folded.then_with(|| b.file.cmp(&a.file))
}

pub fn compare_metric(
    kind: MetricKind,
    field: MetricField,
) -> impl Fn(&FileSummaryRecord, &FileSummaryRecord) -> Ordering {
    move |a: &FileSummaryRecord, b: &FileSummaryRecord| {
        let (ma, mb) = (a.metrics.get(kind), b.metrics.get(kind));
        match field {
            MetricField::Pct => ma.pct.total_cmp(&mb.pct),
            MetricField::Total => ma.total.cmp(&mb.total),
        }
    }
}

/// Stable in-place sort of `records` by `key`.
pub fn sort_records(records: &mut [FileSummaryRecord], key: SortKey, descending: bool) {
    let cmp: Box<dyn Fn(&FileSummaryRecord, &FileSummaryRecord) -> Ordering> = match key {
        SortKey::File => Box::new(compare_file),
        SortKey::Metric(kind, field) => Box::new(compare_metric(kind, field)),
    };
    if descending {
        records.sort_by(|a, b| cmp(b, a));
    } else {
        records.sort_by(|a, b| cmp(a, b));
    }
}
