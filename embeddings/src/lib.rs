//! # Embeddings
//!
//! Vector math and collaborator interfaces used to score generated content
//! against entity reference embeddings.
//!
//! ## Features
//!
//! - **Similarity**: Cosine similarity with explicit failure modes and the
//!   bipolar-to-percentage mapping used for consistency scores
//! - **Extraction**: Turn an image or video URL into an embedding via an
//!   external service
//! - **Reference Store**: Look up previously computed reference embeddings
//!   by entity ID
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embeddings System                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingExtractor ──► Embedding ◄── ReferenceStore            │
//! │       │                    │              │                     │
//! │       ▼                    ▼              ▼                     │
//! │  HttpEmbeddingExtractor  similarity   ReferenceIndex            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod extractor;
pub mod index;
pub mod similarity;
pub mod store;

pub use error::{ExtractionError, Result, SimilarityError, StoreError};
pub use extractor::{ContentType, EmbeddingExtractor, HttpEmbeddingExtractor};
pub use index::ReferenceIndex;
pub use similarity::{cosine_similarity, similarity_to_percentage};
pub use store::ReferenceStore;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Dimension of embeddings produced by the default extraction model.
pub const DEFAULT_DIMENSION: usize = 1536;
