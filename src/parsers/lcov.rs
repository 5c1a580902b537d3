//! Parser for the LCOV `.info` format.
//!
//! Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
//!
//! Records used:
//!   SF:<path>                              start of a file section
//!   FN:<line>,<name>                       function definition
//!   FNDA:<count>,<name>                    function hit count
//!   DA:<line>,<count>[,<checksum>]         line hit count
//!   BRDA:<line>,<block>,<branch>,<taken>   branch arm ("-" means 0)
//!   end_of_record
//!
//! Summary records (LF/LH/FNF/FNH/BRF/BRH) are ignored; totals are derived
//! from the detail records.
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use anyhow::{Context, Result};

use super::{CoverageParser, Format};
use crate::model::*;

/// LCOV format parser.
pub struct LcovParser;

impl CoverageParser for LcovParser {
    fn format(&self) -> Format {
        Format::Lcov
    }

    fn can_parse(&self, path: &Path, head: &str) -> bool {
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            let ext = ext.to_lowercase();
            if ext == "info" || ext == "lcov" {
                return true;
            }
        }

        // Tags must start a line; merely containing "SF:" is not enough.
        let has_sf = head.lines().any(|l| l.starts_with("SF:"));
        let has_da_or_fn = head
            .lines()
            .any(|l| l.starts_with("DA:") || l.starts_with("FN:"));
        has_sf && has_da_or_fn
    }

    fn parse(&self, input: &[u8]) -> Result<CoverageData> {
        parse(input)
    }
}

/// Per-file state while a section is open.
struct Section {
    file: FileCoverage,
    branch_indices: HashMap<u32, u32>,
    functions: HashMap<String, usize>,
}

impl Section {
    fn new(path: &str) -> Self {
        Self {
            file: FileCoverage::new(path.to_string()),
            branch_indices: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    fn function_mut(&mut self, name: &str) -> &mut FunctionCoverage {
        let idx = match self.functions.get(name) {
            Some(&idx) => idx,
            None => {
                self.file.functions.push(FunctionCoverage {
                    name: name.to_string(),
                    start_line: None,
                    hit_count: 0,
                });
                let idx = self.file.functions.len() - 1;
                self.functions.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.file.functions[idx]
    }

    fn record(&mut self, tag: &str, value: &str) {
        match tag {
            "FN" => {
                // Newer lcov writes FN:<start>,<end>,<name>; the name is always last.
                let mut parts = value.split(',');
                let start = parts.next().and_then(|s| s.parse::<u32>().ok());
                if let (Some(start), Some(name)) = (start, value.rsplit(',').next()) {
                    self.function_mut(name).start_line = Some(start);
                }
            }
            "FNDA" => {
                if let Some((count, name)) = value.split_once(',') {
                    self.function_mut(name).hit_count = count.parse().unwrap_or(0);
                }
            }
            "DA" => {
                // Negative counts mark non-instrumentable lines in some tools.
                let mut parts = value.splitn(3, ',');
                let line = parts.next().and_then(|s| s.parse::<u32>().ok());
                let count = parts.next().and_then(|s| s.parse::<i64>().ok());
                if let (Some(line_number), Some(count)) = (line, count) {
                    if count >= 0 {
                        self.file.lines.push(LineCoverage {
                            line_number,
                            hit_count: count as u64,
                        });
                    }
                }
            }
            "BRDA" => {
                let parts: Vec<&str> = value.splitn(4, ',').collect();
                if let [line, _block, _branch, taken] = parts[..] {
                    if let Ok(line_number) = line.parse::<u32>() {
                        let hit_count = taken.parse::<u64>().unwrap_or(0);
                        let idx = self.branch_indices.entry(line_number).or_insert(0);
                        self.file.branches.push(BranchCoverage {
                            line_number,
                            branch_index: *idx,
                            hit_count,
                        });
                        *idx += 1;
                    }
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> FileCoverage {
        let mut file = self.file;
        file.lines.sort_by_key(|l| l.line_number);
        file
    }
}

/// Parse LCOV format coverage data from raw bytes.
pub fn parse(input: &[u8]) -> Result<CoverageData> {
    let mut data = CoverageData::new();
    let mut current: Option<Section> = None;

    for (idx, raw) in input.lines().enumerate() {
        let raw = raw.with_context(|| format!("Invalid UTF-8 in LCOV data at line {}", idx + 1))?;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line == "end_of_record" {
            if let Some(section) = current.take() {
                data.files.push(section.finish());
            }
            continue;
        }

        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };

        if tag == "SF" {
            if let Some(section) = current.replace(Section::new(value)) {
                data.files.push(section.finish());
            }
        } else if let Some(section) = current.as_mut() {
            section.record(tag, value);
        }
    }

    // Tolerate a missing trailing end_of_record.
    if let Some(section) = current.take() {
        data.files.push(section.finish());
    }

    Ok(data)
}
