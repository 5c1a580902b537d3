//! Report driver: walks parsed coverage, builds the stats document and
//! writes the finished page.

use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::aggregate::{CoverageNode, FileNode};
use crate::annotate::Annotator;
use crate::assemble::ReportBuilder;
use crate::chunk::{chunk, CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::codec;
use crate::context::{ArtifactWriter, ReportContext};
use crate::error::{CovpageError, Result};
use crate::html;
use crate::model::{CoverageData, StatsDocument};

/// Knobs for one report run.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Artifact name, relative to the writer's output location.
    pub file: String,
    /// Leave files with nothing to cover out of the summary table.
    pub skip_empty: bool,
    pub chunk_size: usize,
    pub source_root: Option<PathBuf>,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            file: "index.html".to_string(),
            skip_empty: false,
            chunk_size: CHUNK_SIZE,
            source_root: None,
        }
    }
}

/// Strip the longest shared directory prefix so files are keyed by short
/// relative paths. A lone file keeps only its file name.
pub fn relative_names(paths: &[&str]) -> Vec<String> {
    let split: Vec<Vec<&str>> = paths
        .iter()
        .map(|p| p.split(['/', '\\']).collect())
        .collect();

    let common = split
        .iter()
        .map(|parts| &parts[..parts.len().saturating_sub(1)])
        .reduce(|acc, dirs| {
            let shared = acc.iter().zip(dirs).take_while(|(a, b)| a == b).count();
            &acc[..shared]
        })
        .map_or(0, |dirs| dirs.len());

    split.iter().map(|parts| parts[common..].join("/")).collect()
}

/// Build the stats document for `data`, visiting files in input order.
/// Fails only if the annotator cannot produce a detail payload.
pub fn generate(
    data: &CoverageData,
    ctx: &ReportContext<'_>,
    annotator: &dyn Annotator,
    options: &ReportOptions,
) -> Result<StatsDocument> {
    let paths: Vec<&str> = data.files.iter().map(|f| f.path.as_str()).collect();
    let names = relative_names(&paths);

    let mut seen = HashSet::new();
    let mut nodes = Vec::with_capacity(data.files.len());
    for (coverage, name) in data.files.iter().zip(names) {
        if !seen.insert(name.clone()) {
            warn!(file = %name, "duplicate file in coverage data, keeping the first entry");
            continue;
        }
        nodes.push(FileNode { coverage, name });
    }

    let mut builder = ReportBuilder::new(options.skip_empty);
    builder.on_summary(nodes.iter().map(|n| n as &dyn CoverageNode), ctx);
    for node in &nodes {
        builder.on_detail(node, annotator, ctx)?;
    }
    info!(
        files = nodes.len(),
        listed = builder.len(),
        "assembled stats document"
    );
    if builder.is_empty() && !nodes.is_empty() {
        warn!(files = nodes.len(), "every file was skipped, summary table is empty");
    }
    Ok(builder.finish())
}

/// Encode `doc` and write the finished page as `options.file`.
///
/// The whole page is rendered before the artifact is opened, so a failure
/// never leaves a partial file behind.
pub fn write_report(
    doc: &StatsDocument,
    writer: &mut dyn ArtifactWriter,
    options: &ReportOptions,
) -> Result<()> {
    if options.chunk_size < MIN_CHUNK_SIZE {
        return Err(CovpageError::Build(format!(
            "chunk size {} is below the minimum of {}",
            options.chunk_size, MIN_CHUNK_SIZE
        )));
    }
    let encoded = codec::encode(doc)?;
    let chunks = chunk(&encoded, options.chunk_size);
    let page = html::render(html::TEMPLATE, &chunks)?;

    let mut sink = writer.write_artifact(&options.file)?;
    sink.write_all(page.as_bytes())?;
    sink.flush()?;
    info!(
        file = %options.file,
        bytes = page.len(),
        fragments = chunks.len(),
        "wrote report"
    );
    Ok(())
}
