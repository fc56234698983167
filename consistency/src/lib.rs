//! # Entity Consistency
//!
//! Scores AI-generated content for consistency with the persistent entities
//! (characters, locations, objects, styles) it is supposed to depict.
//!
//! - **Scoring**: Cosine similarity of the content embedding against each
//!   entity's reference embedding, mapped to a percentage
//! - **Aggregation**: Rounded mean across entities; an empty set is an error
//! - **Drift**: Per-entity severity for entities below the drift cutoff
//! - **Recommendation**: Accept, review, or regenerate
//! - **Prompt Enhancement**: Entity descriptions appended to prompts
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Consistency Scorer                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  GenerationRepository ──► entities                              │
//! │  EmbeddingExtractor   ──► content embedding                     │
//! │  ReferenceStore       ──► reference embeddings                  │
//! │                              │                                  │
//! │                              ▼                                  │
//! │   score_entities ──► overall_score ──► identify_drift           │
//! │                              │                                  │
//! │                              ▼                                  │
//! │             recommend ──► ConsistencyAnalysis ──► persist_score │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use continuity_consistency::ConsistencyScorer;
//!
//! let scorer = ConsistencyScorer::builder()
//!     .with_extractor(extractor)
//!     .with_references(reference_store)
//!     .with_generations(repository)
//!     .build()?;
//!
//! let analysis = scorer
//!     .analyze("gen-42", "https://cdn.example/gen-42.png", ContentType::Image)
//!     .await?;
//! ```

pub mod analysis;
pub mod config;
pub mod drift;
pub mod entity;
pub mod error;
pub mod prompt;
pub mod recommendation;
pub mod repository;
pub mod scorer;
pub mod scoring;

pub use analysis::ConsistencyAnalysis;
pub use config::{ConsistencyConfig, Thresholds};
pub use drift::{AttributeDrift, DriftSeverity, identify_drift};
pub use entity::{EntityKind, EntityProfile};
pub use error::{ConfigError, ConsistencyError, ReferenceFailure, Result};
pub use prompt::enhance_prompt;
pub use recommendation::{Recommendation, recommend};
pub use repository::{GenerationRepository, InMemoryGenerations, ScoreRecord};
pub use scorer::{ConsistencyScorer, ConsistencyScorerBuilder};
pub use scoring::{ScoreSet, overall_score, score_entities};

// Re-export from dependencies for convenience
pub use continuity_embeddings::{ContentType, EmbeddingExtractor, ReferenceStore};
pub use continuity_retry::RetryPolicy;
