//! Generation persistence collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::entity::EntityProfile;
use crate::error::{ConsistencyError, Result};

/// Access to generation records and the entities they reference.
#[async_trait]
pub trait GenerationRepository: Send + Sync {
    /// Entities attached to a generation, in display order.
    ///
    /// Returns [`ConsistencyError::NotFound`] if the generation does not exist.
    async fn generation_entities(&self, generation_id: &str) -> Result<Vec<EntityProfile>>;

    /// Record the overall consistency score on the generation.
    ///
    /// Concurrent writes for the same generation are last-write-wins.
    async fn persist_score(&self, generation_id: &str, overall_score: u8) -> Result<()>;
}

/// A persisted consistency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreRecord {
    pub score: u8,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct GenerationRecord {
    entities: Vec<EntityProfile>,
    score: Option<ScoreRecord>,
}

/// In-memory [`GenerationRepository`].
#[derive(Debug, Default)]
pub struct InMemoryGenerations {
    records: RwLock<HashMap<String, GenerationRecord>>,
}

impl InMemoryGenerations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generation and the entities it references.
    pub async fn insert(&self, generation_id: impl Into<String>, entities: Vec<EntityProfile>) {
        let generation_id = generation_id.into();
        debug!(%generation_id, entities = entities.len(), "Registered generation");
        self.records.write().await.insert(
            generation_id,
            GenerationRecord {
                entities,
                score: None,
            },
        );
    }

    /// Last persisted score of a generation.
    pub async fn score(&self, generation_id: &str) -> Option<ScoreRecord> {
        self.records
            .read()
            .await
            .get(generation_id)
            .and_then(|r| r.score)
    }
}

#[async_trait]
impl GenerationRepository for InMemoryGenerations {
    async fn generation_entities(&self, generation_id: &str) -> Result<Vec<EntityProfile>> {
        self.records
            .read()
            .await
            .get(generation_id)
            .map(|r| r.entities.clone())
            .ok_or_else(|| ConsistencyError::NotFound(format!("generation {generation_id}")))
    }

    async fn persist_score(&self, generation_id: &str, overall_score: u8) -> Result<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(generation_id)
            .ok_or_else(|| ConsistencyError::NotFound(format!("generation {generation_id}")))?;

        record.score = Some(ScoreRecord {
            score: overall_score,
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}
