//! Configuration for consistency scoring.

use std::path::Path;

use continuity_retry::RetryPolicy;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Lowest overall score that is accepted as-is.
pub const DEFAULT_ACCEPT_THRESHOLD: u8 = 90;

/// Lowest overall score that is sent for review rather than regeneration.
pub const DEFAULT_REVIEW_THRESHOLD: u8 = 75;

/// Entities scoring below this are reported as drifted.
pub const DEFAULT_DRIFT_THRESHOLD: u8 = 90;

/// Drift below this score is `high` severity.
pub const DEFAULT_HIGH_SEVERITY_BELOW: u8 = 60;

/// Drift below this score (and at or above the high cutoff) is `medium` severity.
pub const DEFAULT_MEDIUM_SEVERITY_BELOW: u8 = 75;

/// Score cutoffs for recommendations and drift severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Overall score at or above which content is accepted.
    pub accept: u8,

    /// Overall score at or above which content is reviewed.
    pub review: u8,

    /// Entity score below which drift is reported.
    pub drift: u8,

    /// Entity score below which drift is high severity.
    pub high_severity_below: u8,

    /// Entity score below which drift is medium severity.
    pub medium_severity_below: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            accept: DEFAULT_ACCEPT_THRESHOLD,
            review: DEFAULT_REVIEW_THRESHOLD,
            drift: DEFAULT_DRIFT_THRESHOLD,
            high_severity_below: DEFAULT_HIGH_SEVERITY_BELOW,
            medium_severity_below: DEFAULT_MEDIUM_SEVERITY_BELOW,
        }
    }
}

impl Thresholds {
    /// Check that every cutoff is a percentage and the bands are ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("accept", self.accept),
            ("review", self.review),
            ("drift", self.drift),
            ("high_severity_below", self.high_severity_below),
            ("medium_severity_below", self.medium_severity_below),
        ] {
            if value > 100 {
                return Err(ConfigError::InvalidThresholds(format!(
                    "{name} must be at most 100, got {value}"
                )));
            }
        }

        if self.review > self.accept {
            return Err(ConfigError::InvalidThresholds(format!(
                "review ({}) must not exceed accept ({})",
                self.review, self.accept
            )));
        }

        if !(self.high_severity_below <= self.medium_severity_below
            && self.medium_severity_below <= self.drift)
        {
            return Err(ConfigError::InvalidThresholds(format!(
                "severity cutoffs must satisfy high ({}) <= medium ({}) <= drift ({})",
                self.high_severity_below, self.medium_severity_below, self.drift
            )));
        }

        Ok(())
    }
}

/// Top-level configuration for a [`ConsistencyScorer`](crate::ConsistencyScorer).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Score cutoffs.
    pub thresholds: Thresholds,

    /// Retry policy applied by background analysis.
    pub retry: RetryPolicy,

    /// Expected content embedding dimension. `None` accepts whatever the
    /// extractor returns.
    pub embedding_dimension: Option<usize>,
}

impl ConsistencyConfig {
    /// Set the thresholds.
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Require content embeddings of a fixed dimension.
    pub fn with_embedding_dimension(mut self, dimension: usize) -> Self {
        self.embedding_dimension = Some(dimension);
        self
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.thresholds.validate()?;
        self.retry.validate()?;
        Ok(())
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
