//! Embedding the payload into the page template and reading it back.

use regex::Regex;

use crate::codec::Payload;
use crate::error::{CovpageError, Result};

/// The page shipped with the crate.
pub const TEMPLATE: &str = include_str!("../assets/index.html");

/// Tag in the template that the payload assignment replaces.
pub const PLACEHOLDER: &str = r#"<script src="docs/StatsData.js">"#;

/// Global the page bootstrap reads the payload from.
pub const GLOBAL: &str = "window.StatsData";

const ASSIGNMENT: &str =
    r#"<script>\s*window\.StatsData\s*=\s*(\[[^\]]*\]|'[^']*'|"[^"]*")"#;

/// Splice the fragments into `template` as an inline array literal.
pub fn render(template: &str, chunks: &[String]) -> Result<String> {
    if !template.contains(PLACEHOLDER) {
        return Err(CovpageError::Build(format!(
            "template has no payload placeholder `{}`",
            PLACEHOLDER
        )));
    }
    let literal = serde_json::to_string(chunks)
        .map_err(|e| CovpageError::Build(format!("failed to render payload literal: {e}")))?;
    let script = format!("<script>{} = {}", GLOBAL, literal);
    Ok(template.replacen(PLACEHOLDER, &script, 1))
}

/// Find the payload assignment in a rendered page.
pub fn extract_payload(html: &str) -> Result<Payload> {
    let re = Regex::new(ASSIGNMENT).map_err(|e| CovpageError::Other(e.to_string()))?;
    let literal = re
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .ok_or_else(|| CovpageError::Decode(format!("no `{}` assignment found", GLOBAL)))?;

    if let Some(inner) = literal.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return Ok(Payload::Joined(inner.to_string()));
    }
    serde_json::from_str(literal)
        .map_err(|e| CovpageError::Decode(format!("payload literal is malformed: {e}")))
}
