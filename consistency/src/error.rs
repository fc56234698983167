//! Error types for consistency scoring.

use std::path::PathBuf;
use std::time::Duration;

use continuity_embeddings::{ExtractionError, SimilarityError, StoreError};
use continuity_retry::{PolicyError, Retryable};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for consistency operations.
pub type Result<T> = std::result::Result<T, ConsistencyError>;

/// Errors that can abort a consistency analysis.
#[derive(Error, Debug)]
pub enum ConsistencyError {
    /// Similarity math failed on the content embedding.
    #[error("similarity error: {0}")]
    Similarity(#[from] SimilarityError),

    /// No entity produced a score, so there is nothing to average.
    #[error("no entities to score")]
    NoEntities,

    /// The generation or its entity set does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The extraction service failed to embed the generated content.
    #[error("embedding extraction failed: {0}")]
    EmbeddingExtractionFailed(#[source] ExtractionError),

    /// The vector store could not return reference embeddings.
    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(#[source] StoreError),

    /// The score could not be written back to the generation.
    #[error("failed to persist score: {0}")]
    Persistence(String),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ConsistencyError {
    /// Whether retrying the whole analysis could change the outcome.
    ///
    /// Only externally caused failures qualify; logic errors are deterministic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::EmbeddingExtractionFailed(err) => err.is_transient(),
            Self::VectorStoreUnavailable(err) => matches!(err, StoreError::Unavailable(_)),
            Self::Similarity(_)
            | Self::NoEntities
            | Self::NotFound(_)
            | Self::Persistence(_)
            | Self::Config(_) => false,
        }
    }
}

impl Retryable for ConsistencyError {
    fn is_retryable(&self) -> bool {
        ConsistencyError::is_retryable(self)
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::EmbeddingExtractionFailed(err) => err.retry_after(),
            _ => None,
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Threshold values are out of range or out of order.
    #[error("invalid thresholds: {0}")]
    InvalidThresholds(String),

    /// A required collaborator was not supplied.
    #[error("missing {0}")]
    Missing(String),

    /// Retry policy is unusable.
    #[error("invalid retry policy: {0}")]
    InvalidRetry(#[from] PolicyError),

    /// Failed to read the config file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A reference embedding that could not be compared and was scored 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceFailure {
    /// Entity whose reference was malformed.
    pub entity_id: String,

    /// Why the comparison failed.
    pub reason: String,
}

impl ReferenceFailure {
    pub fn new(entity_id: impl Into<String>, error: &SimilarityError) -> Self {
        Self {
            entity_id: entity_id.into(),
            reason: error.to_string(),
        }
    }
}
