#[cfg(feature = "fastembed")]
mod fastembed;
mod hashing;
mod openai;
mod provider;
pub mod tokens;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::info;

use crate::error::{VectorError, VectorResult};

#[cfg(feature = "fastembed")]
pub use self::fastembed::FastEmbedProvider;
pub use hashing::{HASHING_MODEL_NAME, HashingProvider};
pub use openai::{DEFAULT_OPENAI_BASE_URL, OpenAIConfig, OpenAIProvider};
pub use provider::EmbeddingProvider;

/// Which embedding backend to load at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ProviderKind {
    Fastembed,
    Openai,
    Hashing,
}

impl Default for ProviderKind {
    fn default() -> Self {
        if cfg!(feature = "fastembed") {
            ProviderKind::Fastembed
        } else {
            ProviderKind::Hashing
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub openai_base_url: String,
    pub openai_api_key: Option<String>,
    /// Where fastembed keeps downloaded model files.
    pub cache_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            model: "all-MiniLM-L6-v2".to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_api_key: None,
            cache_dir: None,
            timeout_secs: 5,
        }
    }
}

/// Load the configured embedder. Any failure here is fatal for the process.
pub async fn build_provider(
    config: &EmbeddingConfig,
    dimension: usize,
    max_tokens: usize,
) -> VectorResult<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Hashing => Arc::new(HashingProvider::new(dimension)?),
        ProviderKind::Openai => {
            let api_key = config.openai_api_key.clone().ok_or_else(|| {
                VectorError::ModelUnavailable("embedding.openai_api_key is not set".to_string())
            })?;
            let openai = OpenAIConfig::new(api_key, config.model.clone(), dimension)
                .with_base_url(config.openai_base_url.clone())
                .with_timeout(Duration::from_secs(config.timeout_secs));
            Arc::new(OpenAIProvider::connect(openai).await?)
        }
        #[cfg(feature = "fastembed")]
        ProviderKind::Fastembed => Arc::new(
            FastEmbedProvider::load(&config.model, dimension, max_tokens, config.cache_dir.clone())
                .await?,
        ),
        #[cfg(not(feature = "fastembed"))]
        ProviderKind::Fastembed => {
            let _ = max_tokens;
            return Err(VectorError::ModelUnavailable(
                "built without the `fastembed` feature".to_string(),
            ));
        }
    };

    info!(
        provider = %config.provider,
        model = provider.model_name(),
        dimension = provider.dimension(),
        "Embedding provider ready"
    );
    Ok(provider)
}
