//! End-to-end tests for consistency analysis.
//!
//! These wire a real HTTP extractor (against a mock embedding service), the
//! in-memory reference index and the in-memory generation repository.

use std::sync::Arc;

use async_trait::async_trait;
use continuity_consistency::{
    ConsistencyConfig, ConsistencyError, ConsistencyScorer, ContentType, DriftSeverity,
    EntityKind, EntityProfile, InMemoryGenerations, Recommendation, ReferenceStore, RetryPolicy,
};
use continuity_embeddings::{
    Embedding, HttpEmbeddingExtractor, ReferenceIndex, SimilarityError, StoreError,
};
use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

async fn embedding_service(embedding: &[f32]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [{ "embedding": embedding }],
        })))
        .mount(&server)
        .await;
    server
}

fn entities() -> Vec<EntityProfile> {
    vec![
        EntityProfile::new(
            "e1",
            "Mira",
            EntityKind::Character,
            "A young cartographer. Copper braid! Green coat. Carries a brass compass.",
        ),
        EntityProfile::new("e2", "Harbor", EntityKind::Location, "Fog-bound docks."),
    ]
}

struct Harness {
    scorer: ConsistencyScorer,
    generations: Arc<InMemoryGenerations>,
    references: Arc<ReferenceIndex>,
    _server: MockServer,
}

async fn harness(content: &[f32]) -> anyhow::Result<Harness> {
    init_tracing();

    let server = embedding_service(content).await;
    let extractor = Arc::new(HttpEmbeddingExtractor::new(server.uri()).with_api_key("key"));

    let generations = Arc::new(InMemoryGenerations::new());
    generations.insert("gen-1", entities()).await;

    let references = Arc::new(ReferenceIndex::new());
    references.insert("e1", vec![1.0, 0.0]).await?;
    references.insert("e2", vec![0.0, 1.0]).await?;

    let scorer = ConsistencyScorer::builder()
        .with_extractor(extractor)
        .with_references(references.clone())
        .with_generations(generations.clone())
        .build()?;

    Ok(Harness {
        scorer,
        generations,
        references,
        _server: server,
    })
}

#[tokio::test]
async fn test_two_entity_scenario() -> anyhow::Result<()> {
    let h = harness(&[1.0, 0.0]).await?;

    let analysis = assert_ok!(
        h.scorer
            .analyze("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
            .await
    );

    let scores: Vec<(&str, u8)> = analysis
        .entity_scores
        .iter()
        .map(|(id, s)| (id.as_str(), *s))
        .collect();
    assert_eq!(scores, vec![("e1", 100), ("e2", 50)]);
    assert_eq!(analysis.overall_score, 75);
    assert_eq!(analysis.recommendation, Recommendation::Review);
    assert_eq!(
        analysis.message,
        "Good consistency with minor variations. Review the content to ensure it meets your expectations."
    );

    assert_eq!(analysis.drifted_attributes.len(), 1);
    let drift = &analysis.drifted_attributes[0];
    assert_eq!(drift.subject_name, "Harbor");
    assert_eq!(drift.expected_description, "Fog-bound docks.");
    assert_eq!(drift.severity, DriftSeverity::High);

    let record = h.generations.score("gen-1").await;
    assert_eq!(record.map(|r| r.score), Some(75));
    Ok(())
}

#[tokio::test]
async fn test_malformed_reference_does_not_block_others() -> anyhow::Result<()> {
    let h = harness(&[1.0, 0.0]).await?;
    h.references.insert("e2", vec![0.0, 0.0, 0.0]).await?;

    let analysis = h
        .scorer
        .analyze("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
        .await?;

    assert_eq!(analysis.entity_scores.get("e1"), Some(&100));
    assert_eq!(analysis.entity_scores.get("e2"), Some(&0));
    assert_eq!(analysis.reference_failures.len(), 1);
    assert_eq!(analysis.reference_failures[0].entity_id, "e2");
    assert_eq!(analysis.overall_score, 50);
    assert_eq!(analysis.recommendation, Recommendation::Regenerate);
    Ok(())
}

#[tokio::test]
async fn test_entities_without_references_are_skipped() -> anyhow::Result<()> {
    let h = harness(&[1.0, 0.0]).await?;
    h.references.remove("e2").await;

    let analysis = h
        .scorer
        .analyze("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
        .await?;

    assert_eq!(analysis.entity_scores.len(), 1);
    assert_eq!(analysis.overall_score, 100);
    assert!(analysis.is_accepted());
    assert!(!analysis.has_drift());
    Ok(())
}

#[tokio::test]
async fn test_no_reference_embeddings_is_no_entities() -> anyhow::Result<()> {
    let h = harness(&[1.0, 0.0]).await?;
    h.references.clear().await;

    let err = assert_err!(
        h.scorer
            .analyze("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
            .await
    );

    assert!(matches!(err, ConsistencyError::NoEntities));
    assert!(!err.is_retryable());
    assert_eq!(h.generations.score("gen-1").await, None);
    Ok(())
}

#[tokio::test]
async fn test_content_dimension_unlike_references_is_not_scored() -> anyhow::Result<()> {
    let h = harness(&[1.0, 0.0, 0.0]).await?;

    let err = assert_err!(
        h.scorer
            .analyze("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
            .await
    );

    assert!(
        matches!(
            err,
            ConsistencyError::Similarity(SimilarityError::DimensionMismatch {
                expected: 2,
                actual: 3,
            })
        ),
        "{err}"
    );
    assert!(!err.is_retryable());
    assert_eq!(h.generations.score("gen-1").await, None);
    Ok(())
}

#[tokio::test]
async fn test_unknown_or_empty_generation_is_not_found() -> anyhow::Result<()> {
    let h = harness(&[1.0, 0.0]).await?;
    h.generations.insert("gen-empty", Vec::new()).await;

    for generation_id in ["gen-missing", "gen-empty"] {
        let err = assert_err!(
            h.scorer
                .analyze(generation_id, "https://cdn.example/x.png", ContentType::Image)
                .await
        );
        assert!(matches!(err, ConsistencyError::NotFound(_)), "{err}");
    }
    Ok(())
}

#[tokio::test]
async fn test_extraction_outage_is_retryable() -> anyhow::Result<()> {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let generations = Arc::new(InMemoryGenerations::new());
    generations.insert("gen-1", entities()).await;

    let scorer = ConsistencyScorer::builder()
        .with_extractor(Arc::new(
            HttpEmbeddingExtractor::new(server.uri()).with_api_key("key"),
        ))
        .with_references(Arc::new(ReferenceIndex::new()))
        .with_generations(generations.clone())
        .build()?;

    let err = assert_err!(
        scorer
            .analyze("gen-1", "https://cdn.example/gen-1.mp4", ContentType::Video)
            .await
    );
    assert!(matches!(err, ConsistencyError::EmbeddingExtractionFailed(_)));
    assert!(err.is_retryable());
    assert_eq!(generations.score("gen-1").await, None);
    Ok(())
}

/// A vector store that is always down.
struct OfflineStore;

#[async_trait]
impl ReferenceStore for OfflineStore {
    async fn fetch_reference_embeddings(
        &self,
        _entity_ids: &[String],
    ) -> Result<IndexMap<String, Embedding>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_vector_store_outage_leaves_generation_unscored() -> anyhow::Result<()> {
    init_tracing();

    let server = embedding_service(&[1.0, 0.0]).await;
    let generations = Arc::new(InMemoryGenerations::new());
    generations.insert("gen-1", entities()).await;

    let config = ConsistencyConfig::default().with_retry(
        RetryPolicy::default()
            .with_max_attempts(2)
            .with_base_delay(std::time::Duration::ZERO)
            .with_jitter(false),
    );

    let scorer = Arc::new(
        ConsistencyScorer::builder()
            .with_config(config)
            .with_extractor(Arc::new(
                HttpEmbeddingExtractor::new(server.uri()).with_api_key("key"),
            ))
            .with_references(Arc::new(OfflineStore))
            .with_generations(generations.clone())
            .build()?,
    );

    let direct = scorer
        .analyze("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
        .await;
    assert!(matches!(
        direct,
        Err(ConsistencyError::VectorStoreUnavailable(_))
    ));

    let background = scorer
        .spawn_analysis("gen-1", "https://cdn.example/gen-1.png", ContentType::Image)
        .await?;
    assert!(background.is_none());

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 3);
    assert_eq!(generations.score("gen-1").await, None);
    Ok(())
}
