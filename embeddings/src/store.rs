//! Reference embedding lookup.

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::Embedding;
use crate::error::StoreError;

/// A vector store holding one reference embedding per entity.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Fetch reference embeddings for `entity_ids`.
    ///
    /// IDs with no stored embedding are omitted from the result rather than
    /// reported as errors. The returned map follows the order of `entity_ids`.
    async fn fetch_reference_embeddings(
        &self,
        entity_ids: &[String],
    ) -> Result<IndexMap<String, Embedding>, StoreError>;
}
