//! Accumulates one report run into a [`StatsDocument`].

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::Value;

use crate::aggregate::{aggregate, CoverageNode};
use crate::annotate::Annotator;
use crate::context::ReportContext;
use crate::error::Result;
use crate::model::{FileSummaryRecord, StatsDocument};

/// Owned builder for a single report run. Consumed by [`ReportBuilder::finish`].
#[derive(Debug, Default)]
pub struct ReportBuilder {
    skip_empty: bool,
    summary: Vec<FileSummaryRecord>,
    details: BTreeMap<String, Value>,
}

impl ReportBuilder {
    pub fn new(skip_empty: bool) -> Self {
        Self {
            skip_empty,
            ..Default::default()
        }
    }

    /// Append summary records for `children`, in visiting order.
    pub fn on_summary<'n>(
        &mut self,
        children: impl IntoIterator<Item = &'n dyn CoverageNode>,
        ctx: &ReportContext<'_>,
    ) {
        for child in children {
            if let Some(record) = aggregate(child, ctx, self.skip_empty) {
                self.summary.push(record);
            }
        }
    }

    /// Record the detail payload for one file.
    pub fn on_detail(
        &mut self,
        node: &dyn CoverageNode,
        annotator: &dyn Annotator,
        ctx: &ReportContext<'_>,
    ) -> Result<()> {
        let payload = annotator.annotate(node, ctx)?;
        self.details.insert(node.relative_name().to_string(), payload);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.summary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }

    /// Stamp the current time and hand over the finished document.
    pub fn finish(self) -> StatsDocument {
        self.finish_at(Utc::now().timestamp_millis())
    }

    pub fn finish_at(self, datetime: i64) -> StatsDocument {
        StatsDocument {
            datetime,
            summary: self.summary,
            details: self.details,
        }
    }
}
