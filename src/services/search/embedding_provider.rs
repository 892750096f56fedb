//! The embedding provider is an external collaborator:
//! `embed(text) -> float[d]`, dimension fixed at startup. This module is
//! the thin HTTP client satisfying that contract.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider error: {0}")]
    ProviderError(String),
    #[error("embedding provider timed out")]
    Timeout,
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
    fn model_tag(&self) -> &str;
    fn dimension(&self) -> usize;
}

pub struct HttpEmbeddingProvider {
    http: Client,
    api_base: String,
    model: String,
    dimension: usize,
}

impl HttpEmbeddingProvider {
    pub fn new(api_base: String, model: String, dimension: usize) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");
        Self { http, api_base, model, dimension }
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.api_base.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .json(&EmbedRequest { model: self.model.clone(), input: text.to_string() })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::ProviderError(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(EmbeddingError::ProviderError(format!("status {}", response.status())));
        }

        let body: EmbedResponse =
            response.json().await.map_err(|e| EmbeddingError::ProviderError(e.to_string()))?;

        let vector = body
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::ProviderError("empty embedding response".to_string()))?;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    /// A single retry on transient failure — failures here are assumed
    /// transient and retried once.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        match self.embed_once(text).await {
            Ok(vector) => Ok(vector),
            Err(EmbeddingError::DimensionMismatch { .. }) => self.embed_once(text).await,
            Err(_) => self.embed_once(text).await,
        }
    }

    fn model_tag(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: String,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbedDatum {
    embedding: Vec<f32>,
}
