//! Per-entity scoring and aggregation.

use continuity_embeddings::SimilarityError;
use continuity_embeddings::similarity::{cosine_similarity, similarity_to_percentage, validate};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ConsistencyError, ReferenceFailure, Result};

/// Scores for each entity that had a reference embedding.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreSet {
    /// Percentage per entity, in reference order. Degraded entities hold 0.
    pub scores: IndexMap<String, u8>,

    /// References that could not be compared.
    pub failures: Vec<ReferenceFailure>,
}

impl ScoreSet {
    /// Score of one entity.
    pub fn get(&self, entity_id: &str) -> Option<u8> {
        self.scores.get(entity_id).copied()
    }

    /// Number of scored entities, degraded ones included.
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Rounded mean of all scores.
    pub fn overall(&self) -> Result<u8> {
        overall_score(&self.scores)
    }
}

/// Compare `content` against every reference embedding.
///
/// A reference that cannot be compared (wrong length, zero magnitude,
/// non-finite values) is scored 0 and recorded in [`ScoreSet::failures`];
/// the rest are still scored. A malformed `content` embedding fails the whole
/// call since no comparison could be meaningful, and so does a content
/// embedding whose length matches none of the references.
pub fn score_entities(
    content: &[f32],
    references: &IndexMap<String, Vec<f32>>,
) -> Result<ScoreSet> {
    validate(content)?;

    if let Some(first) = references.values().next()
        && references.values().all(|r| r.len() != content.len())
    {
        return Err(SimilarityError::DimensionMismatch {
            expected: first.len(),
            actual: content.len(),
        }
        .into());
    }

    let mut set = ScoreSet::default();

    for (entity_id, reference) in references {
        let score = match cosine_similarity(content, reference) {
            Ok(similarity) => similarity_to_percentage(similarity),
            Err(err) => {
                warn!(%entity_id, error = %err, "Malformed reference embedding, scoring as 0");
                set.failures.push(ReferenceFailure::new(entity_id.as_str(), &err));
                0
            }
        };

        debug!(%entity_id, score, "Scored entity");
        set.scores.insert(entity_id.clone(), score);
    }

    Ok(set)
}

/// Rounded arithmetic mean of per-entity scores.
///
/// An empty mapping is an error, never a score: "could not be evaluated" is
/// not the same as "0% consistent".
pub fn overall_score(scores: &IndexMap<String, u8>) -> Result<u8> {
    if scores.is_empty() {
        return Err(ConsistencyError::NoEntities);
    }

    let sum: u64 = scores.values().map(|s| u64::from(*s)).sum();
    let mean = sum as f64 / scores.len() as f64;
    Ok(mean.round().clamp(0.0, 100.0) as u8)
}
