//! Transport encoding of a [`StatsDocument`].
//!
//! Encoding is JSON, then raw deflate (no zlib or gzip framing), then one
//! decimal number per compressed byte joined with commas. The result is
//! plain ASCII digits and commas, so it can sit inside a script literal
//! without escaping. Decoding reverses each step and fails on anything
//! that does not make it all the way back to a document.

use std::borrow::Cow;
use std::io::Write;

use flate2::write::DeflateEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CovpageError, Result};
use crate::model::{MetricKind, StatsDocument};

/// Growth step for the inflate output buffer.
const INFLATE_STEP: usize = 32 * 1024;

/// An embedded payload: either the whole decimal text or its fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Joined(String),
    Chunks(Vec<String>),
}

impl Payload {
    /// The full decimal text. Fragments are rejoined with commas.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Payload::Joined(s) => Cow::Borrowed(s),
            Payload::Chunks(parts) => Cow::Owned(parts.join(",")),
        }
    }
}

/// Serialize, compress and render `doc` as comma-joined decimal bytes.
pub fn encode(doc: &StatsDocument) -> Result<String> {
    let json = to_json(doc)?;
    let compressed = deflate(json.as_bytes())?;
    debug!(
        json_bytes = json.len(),
        compressed_bytes = compressed.len(),
        "encoded stats document"
    );
    Ok(to_decimal_text(&compressed))
}

/// Reverse of [`encode`], accepting either payload shape.
pub fn decode(payload: &Payload) -> Result<StatsDocument> {
    let bytes = from_decimal_text(&payload.text())?;
    let json = inflate(&bytes)?;
    let doc: StatsDocument = serde_json::from_str(&json)
        .map_err(|e| CovpageError::Decode(format!("inflated payload is not a stats document: {e}")))?;
    debug!(files = doc.summary.len(), "decoded stats document");
    Ok(doc)
}

/// JSON text of the document. Non-finite percentages are refused rather
/// than silently written as `null`.
pub fn to_json(doc: &StatsDocument) -> Result<String> {
    for record in &doc.summary {
        for kind in MetricKind::ALL {
            let pct = record.metrics.get(kind).pct;
            if !pct.is_finite() {
                return Err(CovpageError::Build(format!(
                    "non-finite {} percentage for '{}'",
                    kind, record.file
                )));
            }
        }
    }
    serde_json::to_string(doc)
        .map_err(|e| CovpageError::Build(format!("failed to serialize stats document: {e}")))
}

/// Raw deflate at the default level.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| CovpageError::Build(format!("compression failed: {e}")))
}

/// Raw inflate of a complete stream into UTF-8 text.
///
/// A stream that stops before its final block, or that is followed by
/// extra bytes, is an error.
pub fn inflate(data: &[u8]) -> Result<String> {
    let mut inflater = Decompress::new(false);
    let mut out: Vec<u8> = Vec::with_capacity(data.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            out.reserve(INFLATE_STEP);
        }
        let consumed = inflater.total_in() as usize;
        let produced = inflater.total_out();
        let status = inflater
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CovpageError::Decode(format!("corrupt deflate stream: {e}")))?;

        match status {
            Status::StreamEnd => break,
            Status::Ok | Status::BufError => {
                let stalled =
                    inflater.total_in() as usize == consumed && inflater.total_out() == produced;
                if stalled && out.len() < out.capacity() {
                    return Err(CovpageError::Decode(
                        "truncated deflate stream".to_string(),
                    ));
                }
            }
        }
    }

    let used = inflater.total_in() as usize;
    if used != data.len() {
        return Err(CovpageError::Decode(format!(
            "{} trailing bytes after deflate stream",
            data.len() - used
        )));
    }

    String::from_utf8(out)
        .map_err(|e| CovpageError::Decode(format!("inflated payload is not UTF-8: {e}")))
}

/// `[120, 1, 255]` → `"120,1,255"`.
pub fn to_decimal_text(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse comma-separated decimal bytes. Every token must be 0..=255.
pub fn from_decimal_text(text: &str) -> Result<Vec<u8>> {
    if text.trim().is_empty() {
        return Err(CovpageError::Decode("payload is empty".to_string()));
    }
    text.split(',')
        .enumerate()
        .map(|(idx, token)| {
            token.trim().parse::<u8>().map_err(|_| {
                CovpageError::Decode(format!("invalid byte '{}' at position {}", token, idx))
            })
        })
        .collect()
}
