//! Per-file detail payloads for the `Details` map.
//!
//! The payload is opaque to the rest of the pipeline; only the page
//! bootstrap interprets it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::aggregate::CoverageNode;
use crate::context::ReportContext;
use crate::error::Result;

/// Produces the detail view for one file.
pub trait Annotator {
    fn annotate(&self, node: &dyn CoverageNode, ctx: &ReportContext<'_>) -> Result<Value>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum LineState {
    Yes,
    No,
    Neutral,
}

#[derive(Debug, Serialize)]
struct LineEntry {
    covered: LineState,
    hits: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Annotation {
    max_lines: u32,
    line_coverage: Vec<LineEntry>,
    annotated_code: Vec<String>,
}

/// Line-by-line hit annotation, with escaped source text when the file can
/// be read.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineAnnotator;

impl LineAnnotator {
    fn source_path(path: &str, root: Option<&Path>) -> PathBuf {
        match root {
            Some(root) if Path::new(path).is_relative() => root.join(path),
            _ => PathBuf::from(path),
        }
    }
}

impl Annotator for LineAnnotator {
    fn annotate(&self, node: &dyn CoverageNode, ctx: &ReportContext<'_>) -> Result<Value> {
        let file = node.file_coverage();
        let hits: HashMap<u32, u64> = file
            .lines
            .iter()
            .map(|l| (l.line_number, l.hit_count))
            .collect();

        let path = Self::source_path(&file.path, ctx.source_root);
        let source = match std::fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "source not available");
                None
            }
        };

        let annotated_code: Vec<String> = source
            .as_deref()
            .map(|text| text.lines().map(escape_html).collect())
            .unwrap_or_default();
        let last_hit_line = file.lines.iter().map(|l| l.line_number).max().unwrap_or(0);
        let max_lines = if annotated_code.is_empty() {
            last_hit_line
        } else {
            annotated_code.len() as u32
        };

        let line_coverage = (1..=max_lines)
            .map(|n| match hits.get(&n) {
                Some(&h) if h > 0 => LineEntry {
                    covered: LineState::Yes,
                    hits: format!("{h}x"),
                },
                Some(_) => LineEntry {
                    covered: LineState::No,
                    hits: "&nbsp;".to_string(),
                },
                None => LineEntry {
                    covered: LineState::Neutral,
                    hits: "&nbsp;".to_string(),
                },
            })
            .collect();

        let annotation = Annotation {
            max_lines,
            line_coverage,
            annotated_code,
        };
        Ok(serde_json::to_value(annotation)?)
    }
}

/// Escape text for inclusion in HTML element content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FileNode;
    use crate::context::Watermarks;
    use crate::model::{FileCoverage, LineCoverage};

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; &quot;d&quot;");
        assert_eq!(escape_html("</script>"), "&lt;/script&gt;");
    }

    #[test]
    fn test_annotate_without_source() {
        let mut cov = FileCoverage::new("does/not/exist.js".to_string());
        cov.lines.push(LineCoverage { line_number: 1, hit_count: 2 });
        cov.lines.push(LineCoverage { line_number: 3, hit_count: 0 });
        let node = FileNode { coverage: &cov, name: "exist.js".to_string() };
        let marks = Watermarks::default();
        let ctx = ReportContext::new(&marks);

        let value = LineAnnotator.annotate(&node, &ctx).unwrap();
        assert_eq!(value["maxLines"], 3);
        assert_eq!(value["lineCoverage"][0]["covered"], "yes");
        assert_eq!(value["lineCoverage"][0]["hits"], "2x");
        assert_eq!(value["lineCoverage"][1]["covered"], "neutral");
        assert_eq!(value["lineCoverage"][2]["covered"], "no");
        assert_eq!(value["annotatedCode"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_annotate_with_source_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.js"), "let a = 1 < 2;\nrun();\n").unwrap();

        let mut cov = FileCoverage::new("app.js".to_string());
        cov.lines.push(LineCoverage { line_number: 2, hit_count: 1 });
        let node = FileNode { coverage: &cov, name: "app.js".to_string() };
        let marks = Watermarks::default();
        let ctx = ReportContext::new(&marks).with_source_root(dir.path());

        let value = LineAnnotator.annotate(&node, &ctx).unwrap();
        assert_eq!(value["maxLines"], 2);
        assert_eq!(value["annotatedCode"][0], "let a = 1 &lt; 2;");
        assert_eq!(value["lineCoverage"][1]["covered"], "yes");
    }
}
