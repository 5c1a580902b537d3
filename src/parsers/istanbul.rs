//! Parser for Istanbul / NYC `coverage-final.json`.
//!
//! Reference: https://github.com/istanbuljs/istanbuljs
//!
//! The document is a JSON object keyed by file path. Each entry holds three
//! map/count pairs sharing string indices:
//!   - `statementMap` + `s`: statement locations and hit counts
//!   - `branchMap` + `b`:    branch locations and per-arm hit counts
//!   - `fnMap` + `f`:        function declarations and hit counts
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::{CoverageParser, Format};
use crate::model::*;

/// Istanbul / NYC JSON parser.
pub struct IstanbulParser;

impl CoverageParser for IstanbulParser {
    fn format(&self) -> Format {
        Format::Istanbul
    }

    fn can_parse(&self, path: &Path, head: &str) -> bool {
        let by_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case("coverage-final.json"));
        by_name || looks_like_istanbul(head)
    }

    fn parse(&self, input: &[u8]) -> Result<CoverageData> {
        parse(input)
    }
}

/// A JSON object mentioning both `statementMap` and `fnMap`.
fn looks_like_istanbul(head: &str) -> bool {
    let trimmed = head.trim_start();
    trimmed.starts_with('{') && trimmed.contains("\"statementMap\"") && trimmed.contains("\"fnMap\"")
}

#[derive(Deserialize, Default)]
struct Position {
    line: Option<u32>,
}

#[derive(Deserialize, Default)]
struct Range {
    #[serde(default)]
    start: Position,
}

#[derive(Deserialize)]
struct BranchEntry {
    #[serde(default)]
    loc: Option<Range>,
    #[serde(default)]
    locations: Vec<Range>,
}

#[derive(Deserialize)]
struct FnEntry {
    name: Option<String>,
    decl: Option<Range>,
    loc: Option<Range>,
}

#[derive(Deserialize)]
struct FileEntry {
    #[serde(rename = "statementMap", default)]
    statement_map: HashMap<String, Range>,
    #[serde(default)]
    s: HashMap<String, u64>,
    #[serde(rename = "branchMap", default)]
    branch_map: HashMap<String, BranchEntry>,
    #[serde(default)]
    b: HashMap<String, Vec<u64>>,
    #[serde(rename = "fnMap", default)]
    fn_map: HashMap<String, FnEntry>,
    #[serde(default)]
    f: HashMap<String, u64>,
}

/// Istanbul keys are stringified integers; order them numerically.
fn by_index<V>(map: &HashMap<String, V>) -> Vec<(&str, &V)> {
    let mut entries: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v)).collect();
    entries.sort_by_key(|(k, _)| (k.parse::<u64>().unwrap_or(u64::MAX), *k));
    entries
}

/// Parse Istanbul JSON from raw bytes. Files come out sorted by path.
pub fn parse(input: &[u8]) -> Result<CoverageData> {
    let mut data = CoverageData::new();
    if input.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(data);
    }

    let entries: BTreeMap<String, FileEntry> =
        serde_json::from_slice(input).context("Invalid JSON in Istanbul file")?;

    for (path, entry) in entries {
        data.files.push(convert(path, &entry));
    }
    Ok(data)
}

fn convert(path: String, entry: &FileEntry) -> FileCoverage {
    let mut file = FileCoverage::new(path);

    // Several statements can share a line; the line keeps the highest count.
    let mut line_hits: BTreeMap<u32, u64> = BTreeMap::new();
    for (idx, range) in by_index(&entry.statement_map) {
        let Some(line) = range.start.line else {
            continue;
        };
        let hit_count = entry.s.get(idx).copied().unwrap_or(0);
        file.statements.push(StatementCoverage {
            start_line: line,
            hit_count,
        });
        let slot = line_hits.entry(line).or_insert(0);
        *slot = (*slot).max(hit_count);
    }
    file.lines = line_hits
        .into_iter()
        .map(|(line_number, hit_count)| LineCoverage {
            line_number,
            hit_count,
        })
        .collect();

    let mut arms_per_line: HashMap<u32, u32> = HashMap::new();
    for (idx, branch) in by_index(&entry.branch_map) {
        let line = branch
            .loc
            .as_ref()
            .and_then(|r| r.start.line)
            .or_else(|| branch.locations.first().and_then(|r| r.start.line));
        let (Some(line_number), Some(counts)) = (line, entry.b.get(idx)) else {
            continue;
        };
        for &hit_count in counts {
            let arm = arms_per_line.entry(line_number).or_insert(0);
            file.branches.push(BranchCoverage {
                line_number,
                branch_index: *arm,
                hit_count,
            });
            *arm += 1;
        }
    }

    for (idx, func) in by_index(&entry.fn_map) {
        let start_line = func
            .decl
            .as_ref()
            .or(func.loc.as_ref())
            .and_then(|r| r.start.line);
        file.functions.push(FunctionCoverage {
            name: func.name.clone().unwrap_or_else(|| "(anonymous)".to_string()),
            start_line,
            hit_count: entry.f.get(idx).copied().unwrap_or(0),
        });
    }

    file
}
