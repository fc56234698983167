//! Embedding extractors.
//!
//! An extractor turns a piece of generated content (addressed by URL) into a
//! dense vector. The HTTP implementation talks to any service exposing an
//! OpenAI-style `/embeddings` endpoint that accepts media URLs.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Embedding;
use crate::error::ExtractionError;

/// Kind of media being embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trait for services that embed generated media.
#[async_trait]
pub trait EmbeddingExtractor: Send + Sync {
    /// Get the name of this extractor.
    fn name(&self) -> &str;

    /// Embed the content found at `content_url`.
    async fn extract_embedding(
        &self,
        content_url: &str,
        content_type: ContentType,
    ) -> Result<Embedding, ExtractionError>;
}

/// Extractor backed by a JSON-over-HTTP embedding service.
pub struct HttpEmbeddingExtractor {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model requested from the service.
    model: String,

    /// Expected output dimension, if the caller wants it enforced.
    dimension: Option<usize>,

    /// Per-request timeout.
    timeout: Duration,
}

impl HttpEmbeddingExtractor {
    /// Create a new extractor pointed at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_key: std::env::var("EMBEDDING_API_KEY").ok(),
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            model: "multimodal-embedding-1".to_string(),
            dimension: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Reject embeddings whose length differs from `dimension`.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check if the extractor has credentials.
    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl EmbeddingExtractor for HttpEmbeddingExtractor {
    fn name(&self) -> &str {
        "http"
    }

    async fn extract_embedding(
        &self,
        content_url: &str,
        content_type: ContentType,
    ) -> Result<Embedding, ExtractionError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ExtractionError::NotConfigured)?;

        debug!(
            model = %self.model,
            %content_type,
            "Requesting content embedding"
        );

        let body = serde_json::json!({
            "model": self.model,
            "input": content_url,
            "content_type": content_type,
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    ExtractionError::Timeout
                } else {
                    ExtractionError::Http(err)
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(ExtractionError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status.is_server_error() {
            return Err(ExtractionError::Unavailable {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExtractionError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let result: ExtractionResponse = response
            .json()
            .await
            .map_err(|err| ExtractionError::InvalidResponse(err.to_string()))?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ExtractionError::InvalidResponse("no embedding in response".to_string()))?
            .embedding;

        if embedding.is_empty() {
            return Err(ExtractionError::InvalidResponse(
                "empty embedding in response".to_string(),
            ));
        }

        if let Some(expected) = self.dimension
            && embedding.len() != expected
        {
            return Err(ExtractionError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }

        info!(dimension = embedding.len(), "Extracted content embedding");

        Ok(embedding)
    }
}

/// Service response format.
#[derive(Debug, Deserialize)]
struct ExtractionResponse {
    data: Vec<ExtractionData>,
}

#[derive(Debug, Deserialize)]
struct ExtractionData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn extractor(server: &MockServer) -> HttpEmbeddingExtractor {
        HttpEmbeddingExtractor::new(server.uri()).with_api_key("test-key")
    }

    #[tokio::test]
    async fn test_extracts_first_embedding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "input": "https://cdn.example/frame.png",
                "content_type": "image",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.25, -0.5, 1.0], "index": 0 }],
                "model": "multimodal-embedding-1",
            })))
            .mount(&server)
            .await;

        let embedding = extractor(&server)
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap();

        assert_eq!(embedding, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn test_rate_limit_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let err = extractor(&server)
            .extract_embedding("https://cdn.example/clip.mp4", ContentType::Video)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::RateLimited {
                retry_after_secs: 7
            }
        ));
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpEmbeddingExtractor::new(format!("http://{addr}"))
            .with_api_key("test-key")
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Http(_)), "{err:?}");
        assert!(err.is_transient());
        assert_eq!(err.retry_after(), None);
    }

    #[tokio::test]
    async fn test_malformed_http_response_is_not_transient() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"not http at all\r\n\r\n").await;
                let _ = socket.shutdown().await;
            }
        });

        let err = HttpEmbeddingExtractor::new(format!("http://{addr}"))
            .with_api_key("test-key")
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Http(_)), "{err:?}");
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = extractor(&server)
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::Unavailable { status: 503 }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_client_error_is_not_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported media"))
            .mount(&server)
            .await;

        let err = extractor(&server)
            .extract_embedding("ftp://nowhere", ContentType::Image)
            .await
            .unwrap_err();

        match &err {
            ExtractionError::Rejected { status, message } => {
                assert_eq!(*status, 400);
                assert_eq!(message, "unsupported media");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_dimension_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [1.0, 0.0] }],
            })))
            .mount(&server)
            .await;

        let err = extractor(&server)
            .with_dimension(3)
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_data_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": [] })),
            )
            .mount(&server)
            .await;

        let err = extractor(&server)
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let extractor = HttpEmbeddingExtractor {
            api_key: None,
            ..HttpEmbeddingExtractor::new("http://127.0.0.1:9")
        };
        assert!(!extractor.is_available());

        let err = extractor
            .extract_embedding("https://cdn.example/frame.png", ContentType::Image)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NotConfigured));
    }

    #[test]
    fn test_content_type_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(ContentType::Video).unwrap(),
            serde_json::json!("video")
        );
        assert_eq!(ContentType::Image.to_string(), "image");
    }
}
