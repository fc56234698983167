//! Drift detection: which entities strayed from their references, and how far.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::entity::EntityProfile;
use crate::scoring::ScoreSet;

/// Number of description sentences quoted back as the expected appearance.
const EXPECTED_SENTENCES: usize = 3;

/// How badly an entity drifted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftSeverity {
    Low,
    Medium,
    High,
}

impl DriftSeverity {
    /// Severity of an entity score that is already known to be below the drift cutoff.
    pub fn from_score(score: u8, thresholds: &Thresholds) -> Self {
        if score < thresholds.high_severity_below {
            Self::High
        } else if score < thresholds.medium_severity_below {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// A detected deviation of generated content from an entity's reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDrift {
    /// Name of the drifted entity.
    pub subject_name: String,

    /// What the entity is supposed to look like.
    pub expected_description: String,

    /// Human-readable summary of the issue.
    pub issue_text: String,

    /// How far the entity drifted.
    pub severity: DriftSeverity,
}

/// Report every entity whose score is below the drift cutoff.
///
/// Output follows the order of `entities`. Entities without a score (no
/// reference embedding) are skipped, as are those at or above the cutoff.
pub fn identify_drift(
    entities: &[EntityProfile],
    scores: &ScoreSet,
    thresholds: &Thresholds,
) -> Vec<AttributeDrift> {
    entities
        .iter()
        .filter_map(|entity| {
            let score = scores.get(&entity.id)?;
            if score >= thresholds.drift {
                return None;
            }

            Some(AttributeDrift {
                subject_name: entity.name.clone(),
                expected_description: expected_description(&entity.description),
                issue_text: format!(
                    "{} matches its reference at {score}%, below the {}% consistency target",
                    entity.name, thresholds.drift
                ),
                severity: DriftSeverity::from_score(score, thresholds),
            })
        })
        .collect()
}

/// The first three sentence-like segments of a description.
///
/// Splits on `.`, `!` and `?`, drops blank segments, and rejoins the rest as
/// `"A. B. C."`.
pub fn expected_description(description: &str) -> String {
    let sentences: Vec<&str> = description
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(EXPECTED_SENTENCES)
        .collect();

    if sentences.is_empty() {
        String::new()
    } else {
        format!("{}.", sentences.join(". "))
    }
}
