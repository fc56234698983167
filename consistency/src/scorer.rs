//! Consistency scorer: the end-to-end analysis of one generation.

use std::sync::Arc;

use chrono::Utc;
use continuity_embeddings::{ContentType, EmbeddingExtractor, ReferenceStore, SimilarityError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::analysis::ConsistencyAnalysis;
use crate::config::ConsistencyConfig;
use crate::drift::identify_drift;
use crate::error::{ConfigError, ConsistencyError, Result};
use crate::recommendation::recommend;
use crate::repository::GenerationRepository;
use crate::scoring::score_entities;

/// Scores generated content against the reference embeddings of its entities.
///
/// Holds no per-analysis state: every [`analyze`](Self::analyze) call is
/// independent, so one scorer can serve concurrent requests.
pub struct ConsistencyScorer {
    /// Configuration.
    config: ConsistencyConfig,

    /// Embeds generated content.
    extractor: Arc<dyn EmbeddingExtractor>,

    /// Supplies reference embeddings per entity.
    references: Arc<dyn ReferenceStore>,

    /// Generation lookup and score persistence.
    generations: Arc<dyn GenerationRepository>,
}

impl ConsistencyScorer {
    /// Create a new scorer builder.
    pub fn builder() -> ConsistencyScorerBuilder {
        ConsistencyScorerBuilder::new()
    }

    /// Create a scorer from a validated configuration and its collaborators.
    pub fn new(
        config: ConsistencyConfig,
        extractor: Arc<dyn EmbeddingExtractor>,
        references: Arc<dyn ReferenceStore>,
        generations: Arc<dyn GenerationRepository>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor,
            references,
            generations,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &ConsistencyConfig {
        &self.config
    }

    /// Score one generation and persist its overall score.
    ///
    /// No retries happen here; see [`spawn_analysis`](Self::spawn_analysis)
    /// for the retrying, non-blocking variant. Nothing is persisted unless the
    /// whole analysis succeeds.
    pub async fn analyze(
        &self,
        generation_id: &str,
        content_url: &str,
        content_type: ContentType,
    ) -> Result<ConsistencyAnalysis> {
        debug!(%generation_id, %content_type, "Starting consistency analysis");

        let entities = self.generations.generation_entities(generation_id).await?;
        if entities.is_empty() {
            return Err(ConsistencyError::NotFound(format!(
                "entities for generation {generation_id}"
            )));
        }

        let content = self
            .extractor
            .extract_embedding(content_url, content_type)
            .await
            .map_err(ConsistencyError::EmbeddingExtractionFailed)?;

        if let Some(expected) = self.config.embedding_dimension
            && content.len() != expected
        {
            return Err(SimilarityError::DimensionMismatch {
                expected,
                actual: content.len(),
            }
            .into());
        }

        let entity_ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        let references = self
            .references
            .fetch_reference_embeddings(&entity_ids)
            .await
            .map_err(ConsistencyError::VectorStoreUnavailable)?;

        if references.len() < entity_ids.len() {
            debug!(
                %generation_id,
                missing = entity_ids.len() - references.len(),
                "Some entities have no reference embedding"
            );
        }

        let scores = score_entities(&content, &references)?;
        let overall_score = scores.overall()?;

        let thresholds = &self.config.thresholds;
        let drifted_attributes = identify_drift(&entities, &scores, thresholds);
        let (recommendation, message) = recommend(overall_score, thresholds);

        self.generations
            .persist_score(generation_id, overall_score)
            .await?;

        info!(
            %generation_id,
            overall_score,
            %recommendation,
            drifted = drifted_attributes.len(),
            degraded = scores.failures.len(),
            "Consistency analysis complete"
        );

        Ok(ConsistencyAnalysis {
            generation_id: generation_id.to_string(),
            overall_score,
            visual_score: overall_score,
            semantic_score: overall_score,
            entity_scores: scores.scores,
            drifted_attributes,
            reference_failures: scores.failures,
            recommendation,
            message: message.to_string(),
            analyzed_at: Utc::now(),
        })
    }

    /// Run [`analyze`](Self::analyze) in the background with the configured
    /// retry policy.
    ///
    /// Failures are logged and yield `None`; they never reach the caller, so a
    /// generation's own lifecycle is not held up by scoring.
    pub fn spawn_analysis(
        self: Arc<Self>,
        generation_id: impl Into<String>,
        content_url: impl Into<String>,
        content_type: ContentType,
    ) -> JoinHandle<Option<ConsistencyAnalysis>> {
        let generation_id = generation_id.into();
        let content_url = content_url.into();

        tokio::spawn(async move {
            let result = self
                .config
                .retry
                .run(|attempt| {
                    debug!(%generation_id, attempt, "Consistency analysis attempt");
                    self.analyze(&generation_id, &content_url, content_type)
                })
                .await;

            match result {
                Ok(analysis) => Some(analysis),
                Err(err) => {
                    warn!(
                        %generation_id,
                        error = %err,
                        retryable = err.is_retryable(),
                        "Consistency analysis failed; generation left unscored"
                    );
                    None
                }
            }
        })
    }
}

/// Builder for [`ConsistencyScorer`].
pub struct ConsistencyScorerBuilder {
    config: ConsistencyConfig,
    extractor: Option<Arc<dyn EmbeddingExtractor>>,
    references: Option<Arc<dyn ReferenceStore>>,
    generations: Option<Arc<dyn GenerationRepository>>,
}

impl ConsistencyScorerBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: ConsistencyConfig::default(),
            extractor: None,
            references: None,
            generations: None,
        }
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: ConsistencyConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the embedding extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn EmbeddingExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the reference store.
    pub fn with_references(mut self, references: Arc<dyn ReferenceStore>) -> Self {
        self.references = Some(references);
        self
    }

    /// Set the generation repository.
    pub fn with_generations(mut self, generations: Arc<dyn GenerationRepository>) -> Self {
        self.generations = Some(generations);
        self
    }

    /// Build the scorer.
    pub fn build(self) -> Result<ConsistencyScorer> {
        let missing = |what: &str| ConsistencyError::Config(ConfigError::Missing(what.to_string()));

        ConsistencyScorer::new(
            self.config,
            self.extractor.ok_or_else(|| missing("extractor"))?,
            self.references.ok_or_else(|| missing("reference store"))?,
            self.generations.ok_or_else(|| missing("generation repository"))?,
        )
    }
}

impl Default for ConsistencyScorerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
