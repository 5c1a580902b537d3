//! Command handler functions for the covpage CLI.
//!
//! Each `cmd_*` function returns its output as a `String`, making them easy
//! to test without capturing stdout.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing::info;

use crate::annotate::LineAnnotator;
use crate::chunk::MIN_CHUNK_SIZE;
use crate::context::{FsWriter, ReportContext, WatermarkOverride, Watermarks};
use crate::error::CovpageError;
use crate::generate::{generate, write_report, ReportOptions};
use crate::model::{CoverageMetric, MetricKind, ReportClass, StatsDocument};
use crate::parsers::{detect_format, Format};
use crate::rollup::rollup_all;
use crate::sort::{sort_records, MetricField, SortKey};
use crate::{codec, html};

/// Column to order the `summary` listing by.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortColumn {
    File,
    Statements,
    Branches,
    Functions,
    Lines,
}

/// Metric number used when sorting by a metric column.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortBy {
    Pct,
    Total,
}

impl SortColumn {
    pub fn key(self, by: SortBy) -> SortKey {
        let field = match by {
            SortBy::Pct => MetricField::Pct,
            SortBy::Total => MetricField::Total,
        };
        match self {
            SortColumn::File => SortKey::File,
            SortColumn::Statements => SortKey::Metric(MetricKind::Statements, field),
            SortColumn::Branches => SortKey::Metric(MetricKind::Branches, field),
            SortColumn::Functions => SortKey::Metric(MetricKind::Functions, field),
            SortColumn::Lines => SortKey::Metric(MetricKind::Lines, field),
        }
    }
}

/// Parse `--chunk-size`, refusing sizes that cannot hold a decimal byte.
pub fn parse_chunk_size(s: &str) -> std::result::Result<usize, String> {
    let size: usize = s.parse().map_err(|e| format!("invalid chunk size '{s}': {e}"))?;
    if size < MIN_CHUNK_SIZE {
        return Err(format!("chunk size must be at least {MIN_CHUNK_SIZE}, got {size}"));
    }
    Ok(size)
}

pub fn cmd_generate(
    input: &Path,
    format: Option<&str>,
    output_dir: &Path,
    watermarks: &[WatermarkOverride],
    options: &ReportOptions,
) -> Result<String> {
    let content =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;

    let format = match format {
        Some(f) => f.parse::<Format>()?,
        None => detect_format(input, &content).ok_or(CovpageError::UnknownFormat)?,
    };
    let data = format
        .parser()
        .parse(&content)
        .with_context(|| format!("Failed to parse {} as {}", input.display(), format))?;
    info!(format = %format, files = data.files.len(), "parsed coverage input");
    if data.files.is_empty() {
        tracing::warn!("{} contains no source files", input.display());
    }

    let classifier = Watermarks::default().with_overrides(watermarks);
    let mut ctx = ReportContext::new(&classifier);
    if let Some(root) = options.source_root.as_deref() {
        ctx = ctx.with_source_root(root);
    }

    let doc = generate(&data, &ctx, &LineAnnotator, options)?;
    let mut writer = FsWriter::new(output_dir);
    write_report(&doc, &mut writer, options).context("Failed to write report")?;

    Ok(format!(
        "Wrote {} ({} files, format '{}')\n",
        output_dir.join(&options.file).display(),
        doc.summary.len(),
        format,
    ))
}

/// Decode an existing report page.
pub fn load_report(path: &Path) -> Result<StatsDocument> {
    let page = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let payload = html::extract_payload(&page)?;
    let doc = codec::decode(&payload)
        .with_context(|| format!("Coverage data in {} is corrupt", path.display()))?;
    Ok(doc)
}

fn metric_cell(m: &CoverageMetric) -> String {
    format!("{}/{} ({:.2}%)", m.covered, m.total, m.pct)
}

fn classed_cell(m: &CoverageMetric, class: ReportClass) -> String {
    format!("{} {}", metric_cell(m), class.as_str())
}

pub fn cmd_summary(path: &Path, sort: Option<SortKey>, descending: bool) -> Result<String> {
    let doc = load_report(path)?;
    let mut records = doc.summary.clone();
    if let Some(key) = sort {
        sort_records(&mut records, key, descending);
    }

    let mut out = String::new();
    if let Some(at) = doc.generated_at() {
        writeln!(out, "Generated:  {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
    }
    writeln!(out, "Files:      {}", records.len())?;
    writeln!(out)?;

    let width = records
        .iter()
        .map(|r| r.file.len())
        .max()
        .unwrap_or(0)
        .max(7);
    write!(out, "{:<width$}", "FILE")?;
    for kind in MetricKind::ALL {
        write!(out, "  {:>30}", kind.as_str().to_uppercase())?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(width + 4 * 32))?;

    for record in &records {
        write!(out, "{:<width$}", record.file)?;
        for kind in MetricKind::ALL {
            let cell = classed_cell(record.metrics.get(kind), record.report_classes.get(kind));
            write!(out, "  {:>30}", cell)?;
        }
        writeln!(out)?;
    }

    write!(out, "{:<width$}", "Summary")?;
    for (_, total) in rollup_all(&doc.summary) {
        write!(out, "  {:>30}", metric_cell(&total))?;
    }
    writeln!(out)?;
    Ok(out)
}
