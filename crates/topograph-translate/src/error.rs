//! Translation error types.

use thiserror::Error;

/// Result type alias for translation operations.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Errors that can occur while rendering a topology graph.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("block topology requested but the graph has no block forest")]
    MissingBlockForest,

    #[error("block sizes not configured; set the \"block_sizes\" option")]
    MissingBlockSizes,

    #[error("invalid block sizes {0:?}: {1}")]
    InvalidBlockSizes(String, String),

    #[error("unsupported topology plugin: {0}")]
    UnsupportedPlugin(String),

    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}
