//! Error types for the relaymap core library.

/// Top-level error enum for the relaymap core library.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Source error: {0}")]
    Source(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Override map error: {0}")]
    Overrides(String),

    #[error("Duplicate relay name: {0}")]
    DuplicateRelay(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type MapResult<T> = Result<T, MapError>;
