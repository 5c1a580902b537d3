//! Capabilities the report driver hands to the pipeline: a percentage
//! classifier and a sink for output artifacts.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::str::FromStr;

use crate::error::{CovpageError, Result};
use crate::model::{MetricKind, ReportClass};

/// Maps a metric percentage to a display bucket.
pub trait Classifier {
    fn classify(&self, kind: MetricKind, pct: f64) -> ReportClass;
}

/// A `[low, high]` threshold pair for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Watermark {
    pub low: f64,
    pub high: f64,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            low: 50.0,
            high: 80.0,
        }
    }
}

impl Watermark {
    fn classify(&self, pct: f64) -> ReportClass {
        if pct < self.low {
            ReportClass::Low
        } else if pct >= self.high {
            ReportClass::High
        } else {
            ReportClass::Medium
        }
    }
}

/// Threshold-based classifier, one watermark per metric kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Watermarks {
    pub statements: Watermark,
    pub branches: Watermark,
    pub functions: Watermark,
    pub lines: Watermark,
}

impl Watermarks {
    pub fn get_mut(&mut self, kind: MetricKind) -> &mut Watermark {
        match kind {
            MetricKind::Statements => &mut self.statements,
            MetricKind::Branches => &mut self.branches,
            MetricKind::Functions => &mut self.functions,
            MetricKind::Lines => &mut self.lines,
        }
    }

    /// Apply overrides of the form `lines=60,90`.
    pub fn with_overrides(mut self, overrides: &[WatermarkOverride]) -> Self {
        for o in overrides {
            *self.get_mut(o.kind) = o.mark;
        }
        self
    }
}

impl Classifier for Watermarks {
    fn classify(&self, kind: MetricKind, pct: f64) -> ReportClass {
        let mark = match kind {
            MetricKind::Statements => &self.statements,
            MetricKind::Branches => &self.branches,
            MetricKind::Functions => &self.functions,
            MetricKind::Lines => &self.lines,
        };
        mark.classify(pct)
    }
}

/// A parsed `KIND=LOW,HIGH` command-line value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkOverride {
    pub kind: MetricKind,
    pub mark: Watermark,
}

impl FromStr for WatermarkOverride {
    type Err = CovpageError;

    fn from_str(s: &str) -> Result<Self> {
        let bad = || CovpageError::Parse(format!("Invalid watermark '{}', expected KIND=LOW,HIGH", s));
        let (kind, range) = s.split_once('=').ok_or_else(bad)?;
        let (low, high) = range.split_once(',').ok_or_else(bad)?;
        let kind = kind.trim().parse::<MetricKind>()?;
        let low: f64 = low.trim().parse().map_err(|_| bad())?;
        let high: f64 = high.trim().parse().map_err(|_| bad())?;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low > high {
            return Err(bad());
        }
        Ok(Self {
            kind,
            mark: Watermark { low, high },
        })
    }
}

/// Opens named output artifacts.
pub trait ArtifactWriter {
    fn write_artifact(&mut self, name: &str) -> Result<Box<dyn Write>>;
}

/// Writes artifacts as files under an output directory.
pub struct FsWriter {
    dir: PathBuf,
}

impl FsWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactWriter for FsWriter {
    fn write_artifact(&mut self, name: &str) -> Result<Box<dyn Write>> {
        fs::create_dir_all(&self.dir)?;
        let file = File::create(self.dir.join(name))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

/// Keeps artifacts in memory, keyed by name.
#[derive(Default)]
pub struct MemoryWriter {
    artifacts: BTreeMap<String, Rc<RefCell<Vec<u8>>>>,
}

struct SharedBuf(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contents of an artifact as text, if it was opened.
    pub fn get(&self, name: &str) -> Option<String> {
        self.artifacts
            .get(name)
            .map(|buf| String::from_utf8_lossy(&buf.borrow()).into_owned())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }
}

impl ArtifactWriter for MemoryWriter {
    fn write_artifact(&mut self, name: &str) -> Result<Box<dyn Write>> {
        let buf = Rc::new(RefCell::new(Vec::new()));
        self.artifacts.insert(name.to_string(), Rc::clone(&buf));
        Ok(Box::new(SharedBuf(buf)))
    }
}

/// Rendering context handed to the aggregator and annotator.
pub struct ReportContext<'a> {
    pub classifier: &'a dyn Classifier,
    /// Directory source paths are resolved against when annotating.
    pub source_root: Option<&'a Path>,
}

impl<'a> ReportContext<'a> {
    pub fn new(classifier: &'a dyn Classifier) -> Self {
        Self {
            classifier,
            source_root: None,
        }
    }

    pub fn with_source_root(mut self, root: &'a Path) -> Self {
        self.source_root = Some(root);
        self
    }

    pub fn classify(&self, kind: MetricKind, pct: f64) -> ReportClass {
        self.classifier.classify(kind, pct)
    }
}
