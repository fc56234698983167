//! Error types for retry policies.

use thiserror::Error;

/// Result type alias for policy validation.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Invalid retry policy settings.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// At least one attempt is required.
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    /// Backoff must not shrink between attempts.
    #[error("multiplier must be a finite number >= 1.0, got {0}")]
    InvalidMultiplier(f64),

    /// The first delay exceeds the cap.
    #[error("base delay {base_ms}ms exceeds max delay {max_ms}ms")]
    DelayOutOfBounds { base_ms: u64, max_ms: u64 },
}
