use async_trait::async_trait;

use super::tokens;
use crate::error::VectorResult;
use crate::models::EmbeddingResult;

/// Text-to-vector model handle.
///
/// Implementations are loaded once at startup and shared behind an `Arc` by
/// every request. `embed` must be deterministic for a given model and must
/// truncate over-long input to `max_tokens` instead of failing.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier reported by health checks.
    fn model_name(&self) -> &str;

    /// Length of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Token count used for truncation and payload bookkeeping.
    fn count_tokens(&self, text: &str) -> usize {
        tokens::count_words(text)
    }

    /// Embed one text, keeping only its first `max_tokens` tokens.
    async fn embed(&self, text: &str, max_tokens: usize) -> VectorResult<EmbeddingResult>;

    /// Embed several texts. Output order matches input order.
    async fn embed_batch(
        &self,
        texts: &[String],
        max_tokens: usize,
    ) -> VectorResult<Vec<EmbeddingResult>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text, max_tokens).await?);
        }
        Ok(results)
    }

    /// Liveness of the loaded model. Local models are healthy once loaded.
    async fn health(&self) -> VectorResult<()> {
        Ok(())
    }
}
