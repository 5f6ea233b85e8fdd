//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric word is hashed with SHA-256 into one signed
//! bucket of a fixed-size vector, which is then L2-normalised. Texts sharing
//! words have positive cosine similarity; identical texts score 1.0. There is
//! no model to download, so it backs tests and offline development.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{EmbeddingProvider, tokens};
use crate::error::{VectorError, VectorResult};
use crate::models::EmbeddingResult;

pub const HASHING_MODEL_NAME: &str = "feature-hashing-sha256";

#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    pub fn new(dimension: usize) -> VectorResult<Self> {
        if dimension == 0 {
            return Err(VectorError::ModelUnavailable(
                "hashing embedder needs a positive dimension".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0f32; self.dimension];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            values[bucket] += sign;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut values {
                *v /= norm;
            }
        }
        values
    }
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn model_name(&self) -> &str {
        HASHING_MODEL_NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str, max_tokens: usize) -> VectorResult<EmbeddingResult> {
        let (kept, truncated) = tokens::truncate_words(text, max_tokens);
        Ok(EmbeddingResult {
            values: self.encode(kept),
            tokens: self.count_tokens(text),
            truncated,
        })
    }
}
