//! Text embeddings for job-description and resume similarity deduplication.
//!
//! `HttpEmbedder` talks to any OpenAI-compatible `/embeddings` endpoint (a local
//! sentence-transformers server or a hosted API). Failures never abort a write:
//! [`embed_or_degrade`] turns them into an empty vector plus a warning.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embeddings are not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding response contained no vector")]
    Empty,
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Used when no embedding endpoint is configured. Every record is stored
/// without a vector and never takes part in similarity deduplication.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            url,
            model,
            api_key,
        }
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body: EmbeddingResponse = response.json().await?;
        let vector = first_vector(body)?;
        debug!("Embedded {} chars into {} dims", text.len(), vector.len());
        Ok(vector)
    }
}

fn first_vector(body: EmbeddingResponse) -> Result<Vec<f32>, EmbeddingError> {
    body.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .filter(|v| !v.is_empty())
        .ok_or(EmbeddingError::Empty)
}

/// Embeds `text`, degrading to an empty vector on failure. The second value
/// carries the failure so callers can report "stored without embedding".
pub async fn embed_or_degrade(embedder: &dyn Embedder, text: &str) -> (Vec<f32>, Option<String>) {
    match embedder.embed(text).await {
        Ok(vector) => (vector, None),
        Err(EmbeddingError::NotConfigured) => {
            debug!("Embeddings not configured; storing without a vector");
            (Vec::new(), Some(EmbeddingError::NotConfigured.to_string()))
        }
        Err(e) => {
            warn!("Embedding failed, storing without a vector: {e}");
            (Vec::new(), Some(e.to_string()))
        }
    }
}
