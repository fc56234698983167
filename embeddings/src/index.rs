//! In-memory reference index.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::StoreError;
use crate::store::ReferenceStore;

/// An entry in the reference index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Entity identifier.
    pub entity_id: String,

    /// The reference embedding, stored as given.
    pub embedding: Embedding,
}

/// A reference store kept in memory, optionally snapshotted to JSON.
///
/// Embeddings are stored unnormalized so that a malformed vector written by an
/// upstream job is surfaced to the scorer instead of being silently repaired.
pub struct ReferenceIndex {
    /// Stored entries.
    entries: RwLock<HashMap<String, IndexEntry>>,

    /// Expected dimension of embeddings. `None` accepts any length.
    dimension: Option<usize>,
}

impl ReferenceIndex {
    /// Create an index that accepts embeddings of any length.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dimension: None,
        }
    }

    /// Create an index that rejects embeddings whose length is not `dimension`.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dimension: Some(dimension),
        }
    }

    /// Add or replace the reference embedding of an entity.
    pub async fn insert(
        &self,
        entity_id: impl Into<String>,
        embedding: Embedding,
    ) -> Result<(), StoreError> {
        let entity_id = entity_id.into();

        if let Some(expected) = self.dimension
            && embedding.len() != expected
        {
            return Err(StoreError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        let entry = IndexEntry {
            entity_id: entity_id.clone(),
            embedding,
        };

        self.entries.write().await.insert(entity_id.clone(), entry);
        debug!(%entity_id, "Stored reference embedding");

        Ok(())
    }

    /// Remove the reference embedding of an entity.
    pub async fn remove(&self, entity_id: &str) -> Option<IndexEntry> {
        self.entries.write().await.remove(entity_id)
    }

    /// Get the reference embedding of an entity.
    pub async fn get(&self, entity_id: &str) -> Option<Embedding> {
        self.entries
            .read()
            .await
            .get(entity_id)
            .map(|e| e.embedding.clone())
    }

    /// Check if an entity has a reference embedding.
    pub async fn contains(&self, entity_id: &str) -> bool {
        self.entries.read().await.contains_key(entity_id)
    }

    /// Get the number of entries in the index.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the index is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Clear the index.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        info!("Cleared reference index");
    }

    /// Serialize the index to JSON.
    pub async fn to_json(&self) -> Result<String, StoreError> {
        let entries = self.entries.read().await;
        let mut sorted: Vec<&IndexEntry> = entries.values().collect();
        sorted.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        Ok(serde_json::to_string(&sorted)?)
    }

    /// Load an index from JSON.
    pub fn from_json(json: &str, dimension: Option<usize>) -> Result<Self, StoreError> {
        let entries: Vec<IndexEntry> = serde_json::from_str(json)?;

        let mut map = HashMap::with_capacity(entries.len());
        for entry in entries {
            if let Some(expected) = dimension
                && entry.embedding.len() != expected
            {
                return Err(StoreError::DimensionMismatch {
                    expected,
                    actual: entry.embedding.len(),
                });
            }
            map.insert(entry.entity_id.clone(), entry);
        }

        info!(entries = map.len(), "Loaded reference index");
        Ok(Self {
            entries: RwLock::new(map),
            dimension,
        })
    }

    /// Write a JSON snapshot to disk.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let content = self.to_json().await?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(path, content).await?;
        debug!(path = %path.display(), "Saved reference index");
        Ok(())
    }

    /// Read a JSON snapshot from disk.
    pub async fn load(path: impl AsRef<Path>, dimension: Option<usize>) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).await?;
        Self::from_json(&content, dimension)
    }
}

impl Default for ReferenceIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceStore for ReferenceIndex {
    async fn fetch_reference_embeddings(
        &self,
        entity_ids: &[String],
    ) -> Result<IndexMap<String, Embedding>, StoreError> {
        let entries = self.entries.read().await;

        let found: IndexMap<String, Embedding> = entity_ids
            .iter()
            .filter_map(|id| {
                entries
                    .get(id)
                    .map(|entry| (id.clone(), entry.embedding.clone()))
            })
            .collect();

        debug!(
            requested = entity_ids.len(),
            found = found.len(),
            "Fetched reference embeddings"
        );

        Ok(found)
    }
}
