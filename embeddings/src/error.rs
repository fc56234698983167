//! Error types for the embeddings system.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for similarity computations.
pub type Result<T> = std::result::Result<T, SimilarityError>;

/// Errors raised by vector math. These are deterministic and never worth retrying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimilarityError {
    /// Vectors have different lengths.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A vector has zero magnitude, so the cosine is undefined.
    #[error("zero-magnitude vector")]
    ZeroVector,

    /// A vector contains NaN or infinite components.
    #[error("vector contains non-finite values")]
    NonFinite,
}

/// Errors from the external embedding extraction service.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Extractor has no credentials.
    #[error("embedding extractor not configured")]
    NotConfigured,

    /// The request timed out.
    #[error("embedding request timed out")]
    Timeout,

    /// The service answered with a server-side failure.
    #[error("embedding service unavailable (status {status})")]
    Unavailable { status: u16 },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The service refused the request.
    #[error("embedding request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The response body did not contain a usable embedding.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The returned embedding has an unexpected dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ExtractionError {
    /// Whether the failure is externally caused and may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Unavailable { .. } | Self::RateLimited { .. } => true,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::NotConfigured
            | Self::Rejected { .. }
            | Self::InvalidResponse(_)
            | Self::DimensionMismatch { .. } => false,
        }
    }
    /// Wait requested by the service before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after_secs } => Some(Duration::from_secs(*retry_after_secs)),
            _ => None,
        }
    }
}

/// Errors from the reference vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached or failed to answer.
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    /// Embedding does not match the store's dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
