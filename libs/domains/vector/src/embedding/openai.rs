use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingProvider, tokens};
use crate::error::{VectorError, VectorResult};
use crate::models::EmbeddingResult;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible embedding endpoint configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimension: usize,
    pub timeout: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: model.into(),
            dimension,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Only the text-embedding-3 family accepts a requested output size.
    fn supports_dimensions(&self) -> bool {
        self.model.starts_with("text-embedding-3")
    }
}

/// Remote embeddings over the OpenAI `/embeddings` API
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> VectorResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VectorError::ModelUnavailable(format!("HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create the provider and confirm the endpoint answers with vectors of
    /// the configured size.
    pub async fn connect(config: OpenAIConfig) -> VectorResult<Self> {
        let provider = Self::new(config)?;
        provider.probe().await?;
        Ok(provider)
    }

    async fn probe(&self) -> VectorResult<()> {
        let probe = self
            .request(&["dimension probe".to_string()])
            .await
            .map_err(|e| VectorError::ModelUnavailable(e.to_string()))?;

        match probe.first() {
            Some(values) if values.len() == self.config.dimension => Ok(()),
            Some(values) => Err(VectorError::ModelUnavailable(format!(
                "model '{}' returned {} dimensions, expected {}",
                self.config.model,
                values.len(),
                self.config.dimension
            ))),
            None => Err(VectorError::ModelUnavailable(format!(
                "model '{}' returned no embedding",
                self.config.model
            ))),
        }
    }

    async fn request(&self, input: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model,
            input,
            dimensions: self
                .config
                .supports_dimensions()
                .then_some(self.config.dimension),
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response.json().await?;

        // Sort by index to maintain order
        let mut data = embedding_response.data;
        data.sort_by_key(|d| d.index);

        if data.len() != input.len() {
            return Err(VectorError::Embedding(format!(
                "expected {} embeddings, got {}",
                input.len(),
                data.len()
            )));
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str, max_tokens: usize) -> VectorResult<EmbeddingResult> {
        let results = self.embed_batch(&[text.to_string()], max_tokens).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        max_tokens: usize,
    ) -> VectorResult<Vec<EmbeddingResult>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut input = Vec::with_capacity(texts.len());
        let mut meta = Vec::with_capacity(texts.len());
        for text in texts {
            let (kept, truncated) = tokens::truncate_words(text, max_tokens);
            input.push(kept.to_string());
            meta.push((self.count_tokens(text), truncated));
        }

        let vectors = self.request(&input).await?;
        Ok(vectors
            .into_iter()
            .zip(meta)
            .map(|(values, (tokens, truncated))| EmbeddingResult {
                values,
                tokens,
                truncated,
            })
            .collect())
    }

    async fn health(&self) -> VectorResult<()> {
        self.probe().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_only_sent_for_v3_models() {
        let v3 = OpenAIConfig::new("k", "text-embedding-3-small", 384);
        let ada = OpenAIConfig::new("k", "text-embedding-ada-002", 1536);
        assert!(v3.supports_dimensions());
        assert!(!ada.supports_dimensions());
    }

    #[test]
    fn test_request_body_shape() {
        let input = vec!["hello".to_string()];
        let body = serde_json::to_value(EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: Some(384),
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "model": "text-embedding-3-small",
                "input": ["hello"],
                "dimensions": 384
            })
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = OpenAIConfig::new("k", "m", 8).with_base_url("http://localhost:9000/v1/");
        assert_eq!(config.base_url, "http://localhost:9000/v1");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_model_unavailable() {
        let config = OpenAIConfig::new("k", "text-embedding-3-small", 8)
            .with_base_url("http://127.0.0.1:1")
            .with_timeout(Duration::from_millis(200));
        let result = OpenAIProvider::connect(config).await;
        assert!(matches!(result, Err(VectorError::ModelUnavailable(_))));
    }
}
