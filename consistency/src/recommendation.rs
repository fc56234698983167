//! Mapping an overall score to a recommendation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;

/// Shown for scores in the accept band.
pub const ACCEPT_MESSAGE: &str =
    "Excellent consistency! The generated content closely matches your entity references.";

/// Shown for scores in the review band.
pub const REVIEW_MESSAGE: &str = "Good consistency with minor variations. Review the content to ensure it meets your expectations.";

/// Shown for scores below the review band.
pub const REGENERATE_MESSAGE: &str = "Low consistency detected. Consider regenerating with more specific prompts or adjusting entity references.";

/// What the creator should do with the generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Accept,
    Review,
    Regenerate,
}

impl Recommendation {
    /// User-facing message for this recommendation.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Accept => ACCEPT_MESSAGE,
            Self::Review => REVIEW_MESSAGE,
            Self::Regenerate => REGENERATE_MESSAGE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Review => "review",
            Self::Regenerate => "regenerate",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the band containing `overall_score`.
pub fn recommend(overall_score: u8, thresholds: &Thresholds) -> (Recommendation, &'static str) {
    let recommendation = if overall_score >= thresholds.accept {
        Recommendation::Accept
    } else if overall_score >= thresholds.review {
        Recommendation::Review
    } else {
        Recommendation::Regenerate
    };
    (recommendation, recommendation.message())
}
