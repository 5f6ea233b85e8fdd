//! Local ONNX embeddings through fastembed.
//!
//! Model loading and inference are CPU-bound, so both run on the blocking
//! pool. The model is loaded once and shared by every request.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::info;

use super::{EmbeddingProvider, tokens};
use crate::error::{VectorError, VectorResult};
use crate::models::EmbeddingResult;

/// Supported model names and their output dimension.
const MODELS: &[(&str, EmbeddingModel, usize)] = &[
    ("all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2, 384),
    ("all-MiniLM-L12-v2", EmbeddingModel::AllMiniLML12V2, 384),
    ("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15, 384),
    ("bge-base-en-v1.5", EmbeddingModel::BGEBaseENV15, 768),
    ("nomic-embed-text-v1.5", EmbeddingModel::NomicEmbedTextV15, 768),
    (
        "paraphrase-multilingual-MiniLM-L12-v2",
        EmbeddingModel::ParaphraseMLMiniLML12V2,
        384,
    ),
];

fn resolve_model(name: &str) -> VectorResult<(EmbeddingModel, usize)> {
    let wanted = name.rsplit('/').next().unwrap_or(name);
    MODELS
        .iter()
        .find(|(known, _, _)| known.eq_ignore_ascii_case(wanted))
        .map(|(_, model, dim)| (model.clone(), *dim))
        .ok_or_else(|| {
            VectorError::ModelUnavailable(format!("unsupported fastembed model '{}'", name))
        })
}

pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    name: String,
    dimension: usize,
}

impl FastEmbedProvider {
    /// Load (downloading on first use) the named model and verify its output size.
    pub async fn load(
        name: &str,
        expected_dimension: usize,
        max_tokens: usize,
        cache_dir: Option<PathBuf>,
    ) -> VectorResult<Self> {
        let (model_kind, dimension) = resolve_model(name)?;
        if dimension != expected_dimension {
            return Err(VectorError::ModelUnavailable(format!(
                "model '{}' produces {} dimensions but {} are configured",
                name, dimension, expected_dimension
            )));
        }

        let mut options = InitOptions::new(model_kind).with_show_download_progress(false);
        if max_tokens > 0 {
            options = options.with_max_length(max_tokens);
        }
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let model = tokio::task::spawn_blocking(move || TextEmbedding::try_new(options))
            .await
            .map_err(|e| VectorError::ModelUnavailable(e.to_string()))?
            .map_err(|e| VectorError::ModelUnavailable(e.to_string()))?;

        let provider = Self {
            model: Arc::new(model),
            name: name.to_string(),
            dimension,
        };

        let probe = provider.run(vec!["dimension probe".to_string()]).await?;
        match probe.first() {
            Some(values) if values.len() == dimension => {}
            _ => {
                return Err(VectorError::ModelUnavailable(format!(
                    "model '{}' failed its dimension probe",
                    name
                )));
            }
        }

        info!(model = %name, dimension, "Loaded fastembed model");
        Ok(provider)
    }

    async fn run(&self, texts: Vec<String>) -> VectorResult<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || model.embed(texts, None))
            .await
            .map_err(|e| VectorError::Embedding(e.to_string()))?
            .map_err(|e| VectorError::Embedding(e.to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
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

        let vectors = self.run(input).await?;
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_accepts_hub_prefix() {
        let (_, dim) = resolve_model("sentence-transformers/all-MiniLM-L6-v2").unwrap();
        assert_eq!(dim, 384);
        let (_, dim) = resolve_model("BGE-BASE-EN-V1.5").unwrap();
        assert_eq!(dim, 768);
    }

    #[test]
    fn test_unknown_model_is_unavailable() {
        assert!(matches!(
            resolve_model("not-a-model"),
            Err(VectorError::ModelUnavailable(_))
        ));
    }
}
