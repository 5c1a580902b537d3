//! Coverage input formats.
//!
//! Detection strategy:
//!   1. Ask every parser whether the file name or the first bytes look like
//!      its format, in registration order
//!   2. Fall back to the `--format` override (handled by the caller)
pub mod istanbul;
pub mod lcov;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;

use crate::error::CovpageError;
use crate::model::CoverageData;

/// Number of leading bytes inspected for content sniffing.
const SNIFF_LEN: usize = 4096;

/// Supported coverage formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Lcov,
    Istanbul,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Lcov => "lcov",
            Format::Istanbul => "istanbul",
        }
    }

    pub fn parser(&self) -> &'static dyn CoverageParser {
        match self {
            Format::Lcov => &lcov::LcovParser,
            Format::Istanbul => &istanbul::IstanbulParser,
        }
    }
}

impl FromStr for Format {
    type Err = CovpageError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lcov" => Ok(Format::Lcov),
            "istanbul" | "nyc" => Ok(Format::Istanbul),
            _ => Err(CovpageError::Parse(format!(
                "Unknown format: '{}'. Supported: lcov, istanbul",
                s
            ))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every input format implements this trait.
pub trait CoverageParser: Sync {
    fn format(&self) -> Format;

    /// Cheap check on the file name and the sniffed head of the content.
    fn can_parse(&self, path: &Path, head: &str) -> bool;

    /// Parse the input bytes into the uniform coverage model.
    fn parse(&self, input: &[u8]) -> Result<CoverageData>;
}

const PARSERS: &[&dyn CoverageParser] = &[&lcov::LcovParser, &istanbul::IstanbulParser];

/// Lossy UTF-8 view of the first few KB of the content.
pub(crate) fn sniff_head(content: &[u8]) -> String {
    let head_len = content.len().min(SNIFF_LEN);
    String::from_utf8_lossy(&content[..head_len]).into_owned()
}

/// Detect the coverage format from filename and file content.
pub fn detect_format(path: &Path, content: &[u8]) -> Option<Format> {
    let head = sniff_head(content);
    PARSERS
        .iter()
        .find(|p| p.can_parse(path, &head))
        .map(|p| p.format())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_lcov_by_extension() {
        assert_eq!(detect_format(Path::new("coverage.info"), b""), Some(Format::Lcov));
        assert_eq!(detect_format(Path::new("lcov.LCOV"), b""), Some(Format::Lcov));
    }

    #[test]
    fn test_detect_lcov_by_content() {
        let content = b"TN:test\nSF:/src/lib.rs\nDA:1,5\nend_of_record\n";
        assert_eq!(detect_format(Path::new("coverage.txt"), content), Some(Format::Lcov));
    }

    #[test]
    fn test_detect_istanbul() {
        assert_eq!(
            detect_format(Path::new("out/coverage-final.json"), b""),
            Some(Format::Istanbul)
        );
        let content = br#"{"/a.js": {"statementMap": {}, "s": {}, "fnMap": {}, "f": {}}}"#;
        assert_eq!(detect_format(Path::new("cov.json"), content), Some(Format::Istanbul));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format(Path::new("random.dat"), b"hello world"), None);
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("LCOV".parse::<Format>().unwrap(), Format::Lcov);
        assert_eq!("nyc".parse::<Format>().unwrap(), Format::Istanbul);
        assert!("cobertura".parse::<Format>().is_err());
    }
}
