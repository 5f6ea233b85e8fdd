//! Gateway configuration, resolved once at startup.
//!
//! Defaults are compiled in; a YAML/JSON/TOML file, `QDRANT_MCP__SECTION__KEY`
//! environment variables and command-line overrides are layered on top in that
//! order. The resolved value is shared read-only for the life of the process.

use std::path::PathBuf;
use std::time::Duration;

use axum_helpers::RouterOptions;
use core_config::LayeredSources;
use core_config::server::ServerConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::embedding::EmbeddingConfig;
use crate::error::{VectorError, VectorResult};
use crate::models::{CollectionOptions, CollectionSpec, DistanceMetric};
use crate::qdrant::QdrantConfig;

pub const ENV_PREFIX: &str = "QDRANT_MCP";
/// Environment variable naming a configuration file.
pub const CONFIG_FILE_ENV: &str = "QDRANT_MCP_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorSettings {
    /// Collection used when a request names none
    pub collection_name: String,
    pub vector_size: u64,
    pub distance: DistanceMetric,
    /// Longest text embedded; the rest is dropped
    pub max_tokens: usize,
    pub top_k: u64,
    pub min_score: f32,
    pub on_disk_payload: bool,
    /// Search only indexed segments, which can miss the newest writes
    pub indexed_only: bool,
    pub max_vector_size: u64,
    pub max_batch_points: usize,
    pub max_search_limit: u64,
}

impl Default for VectorSettings {
    fn default() -> Self {
        Self {
            collection_name: "claude_vectors".to_string(),
            vector_size: 384,
            distance: DistanceMetric::Cosine,
            max_tokens: 512,
            top_k: 10,
            min_score: 0.22,
            on_disk_payload: false,
            indexed_only: false,
            max_vector_size: 4096,
            max_batch_points: 100,
            max_search_limit: 100,
        }
    }
}

impl VectorSettings {
    pub fn collection_options(&self) -> CollectionOptions {
        CollectionOptions {
            on_disk_payload: self.on_disk_payload,
        }
    }

    /// Shape of a collection created implicitly for `name`.
    pub fn default_spec(&self, name: &str, vector_size: u64) -> CollectionSpec {
        CollectionSpec {
            name: name.to_string(),
            vector_size,
            distance: self.distance,
            options: self.collection_options(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub max_request_size_mb: usize,
    pub request_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_request_size_mb: 10,
            request_timeout_secs: 10,
            shutdown_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    pub server_name: String,
    pub version: String,
    pub host: String,
    pub port: u16,
    /// HTTP sessions unused for this long are forgotten
    pub session_idle_secs: u64,
    /// Most HTTP sessions remembered at once
    pub max_sessions: usize,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            server_name: "qdrant-mcp".to_string(),
            version: "1.0.0".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8001,
            session_idle_secs: 1800,
            max_sessions: 1024,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub qdrant: QdrantConfig,
    pub vector: VectorSettings,
    pub embedding: EmbeddingConfig,
    pub api: ApiSettings,
    pub mcp: McpSettings,
}

/// Highest-precedence values, normally from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub qdrant_url: Option<String>,
    pub api_host: Option<String>,
    pub api_port: Option<u16>,
    pub mcp_port: Option<u16>,
    pub collection: Option<String>,
    pub embedding_provider: Option<String>,
    pub embedding_model: Option<String>,
}

impl GatewayConfig {
    /// Resolve every layer and validate the result.
    pub fn load(overrides: &ConfigOverrides) -> VectorResult<Self> {
        let file = overrides.config_file.clone().or_else(|| {
            std::env::var(CONFIG_FILE_ENV)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        });

        let config: GatewayConfig = LayeredSources::new(ENV_PREFIX)
            .with_file(file)
            .with_list_key("api.cors_origins")
            .with_override("qdrant.url", overrides.qdrant_url.clone())
            .with_override("api.host", overrides.api_host.clone())
            .with_override("api.port", overrides.api_port)
            .with_override("mcp.port", overrides.mcp_port)
            .with_override("vector.collection_name", overrides.collection.clone())
            .with_override("embedding.provider", overrides.embedding_provider.clone())
            .with_override("embedding.model", overrides.embedding_model.clone())
            .resolve(&GatewayConfig::default())?;

        config.validate()?;
        info!(
            qdrant = %config.qdrant.url,
            collection = %config.vector.collection_name,
            provider = %config.embedding.provider,
            model = %config.embedding.model,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn validate(&self) -> VectorResult<()> {
        let v = &self.vector;
        let fail = |msg: String| Err(VectorError::Config(msg));

        if v.collection_name.trim().is_empty() {
            return fail("vector.collection_name must not be empty".into());
        }
        if v.vector_size == 0 || v.vector_size > v.max_vector_size {
            return fail(format!(
                "vector.vector_size must be between 1 and {}",
                v.max_vector_size
            ));
        }
        if v.top_k == 0 || v.top_k > v.max_search_limit {
            return fail(format!(
                "vector.top_k must be between 1 and {}",
                v.max_search_limit
            ));
        }
        if !(0.0..=1.0).contains(&v.min_score) {
            return fail("vector.min_score must be between 0 and 1".into());
        }
        if v.max_batch_points == 0 {
            return fail("vector.max_batch_points must be positive".into());
        }
        if self.api.cors_origins.is_empty() {
            return fail("api.cors_origins must not be empty".into());
        }
        if self.api.max_request_size_mb == 0 || self.api.request_timeout_secs == 0 {
            return fail("api limits must be positive".into());
        }
        if self.qdrant.url.trim().is_empty() {
            return fail("qdrant.url must not be empty".into());
        }
        if self.mcp.session_idle_secs == 0 || self.mcp.max_sessions == 0 {
            return fail("mcp session limits must be positive".into());
        }
        Ok(())
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            cors_origins: self.api.cors_origins.clone(),
            body_limit_bytes: self.api.max_request_size_mb * 1024 * 1024,
            request_timeout: Duration::from_secs(self.api.request_timeout_secs),
        }
    }

    pub fn api_server(&self) -> ServerConfig {
        ServerConfig::new(self.api.host.clone(), self.api.port)
    }

    pub fn mcp_server(&self) -> ServerConfig {
        ServerConfig::new(self.mcp.host.clone(), self.mcp.port)
    }

    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.mcp.session_idle_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.api.shutdown_timeout_secs)
    }
}
