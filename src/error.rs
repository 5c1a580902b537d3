use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovpageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown coverage format")]
    UnknownFormat,

    /// Report generation cannot produce a sound artifact; nothing is written.
    #[error("Report build failed: {0}")]
    Build(String),

    /// An embedded payload is malformed, truncated, or not compressed JSON.
    #[error("Payload decode failed: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CovpageError>;
