//! Result of one consistency analysis.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::drift::AttributeDrift;
use crate::error::ReferenceFailure;
use crate::recommendation::Recommendation;

/// Outcome of scoring one generation against its entities.
///
/// Only `overall_score` is persisted; everything else is for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyAnalysis {
    /// Generation the analysis belongs to.
    pub generation_id: String,

    /// Rounded mean of the per-entity scores.
    pub overall_score: u8,

    /// Visual consistency. Currently the same value as `overall_score`.
    pub visual_score: u8,

    /// Semantic consistency. Currently the same value as `overall_score`:
    /// there is no separate text-embedding comparison yet.
    pub semantic_score: u8,

    /// Score per entity that had a reference embedding.
    pub entity_scores: IndexMap<String, u8>,

    /// Entities below the drift cutoff, in entity order.
    pub drifted_attributes: Vec<AttributeDrift>,

    /// References that were malformed and scored 0.
    pub reference_failures: Vec<ReferenceFailure>,

    /// Suggested next step.
    pub recommendation: Recommendation,

    /// Message shown alongside the recommendation.
    pub message: String,

    /// When the analysis finished.
    pub analyzed_at: DateTime<Utc>,
}

impl ConsistencyAnalysis {
    /// Whether any entity drifted.
    pub fn has_drift(&self) -> bool {
        !self.drifted_attributes.is_empty()
    }

    /// Whether the content can be used without changes.
    pub fn is_accepted(&self) -> bool {
        self.recommendation == Recommendation::Accept
    }
}
