//! Where the gateway lives and how to talk to it, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_flag, env_or_default, env_parse_or};

pub const DEFAULT_COLLECTION: &str = "claude_vectors";

#[derive(Debug, Clone, PartialEq)]
pub struct HookConfig {
    /// Gateway base URL without a trailing slash
    pub endpoint: String,
    pub collection: String,
    pub verify_tls: bool,
    /// PEM file added to the trusted roots
    pub ca_bundle: Option<PathBuf>,
    pub timeout: Duration,
    /// Entries with more estimated tokens than this are vectorized
    pub token_threshold: usize,
    pub top_k: u64,
    pub min_score: f32,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000".to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            verify_tls: true,
            ca_bundle: None,
            timeout: Duration::from_secs(5),
            token_threshold: 512,
            top_k: 10,
            min_score: 0.22,
        }
    }
}

impl HookConfig {
    pub fn is_https(&self) -> bool {
        self.endpoint.starts_with("https://")
    }
}

/// `QDRANT_MCP_API` wins; otherwise host, port and scheme are combined.
fn resolve_endpoint() -> Result<String, ConfigError> {
    let endpoint = match std::env::var("QDRANT_MCP_API") {
        Ok(api) if !api.trim().is_empty() => {
            let api = api.trim();
            if api.starts_with("http://") || api.starts_with("https://") {
                api.to_string()
            } else {
                format!("http://{}", api)
            }
        }
        _ => {
            let host = env_or_default("QDRANT_MCP_HOST", "localhost");
            let port: u16 = env_parse_or("QDRANT_MCP_PORT", 8000)?;
            let default_scheme = if host.starts_with("https://") || port == 443 {
                "https"
            } else {
                "http"
            };
            let scheme = env_or_default("QDRANT_MCP_SCHEME", default_scheme).to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(ConfigError::ParseError {
                    key: "QDRANT_MCP_SCHEME".to_string(),
                    details: format!("'{}' is not http or https", scheme),
                });
            }
            let host = host
                .trim_start_matches("https://")
                .trim_start_matches("http://");
            format!("{}://{}:{}", scheme, host, port)
        }
    };
    Ok(endpoint.trim_end_matches('/').to_string())
}

fn ca_bundle() -> Option<PathBuf> {
    ["QDRANT_MCP_SSL_CERT", "QDRANT_MCP_CA_BUNDLE"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .find(|path| path.exists())
}

impl FromEnv for HookConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = HookConfig::default();
        Ok(Self {
            endpoint: resolve_endpoint()?,
            collection: env_or_default("QDRANT_MCP_COLLECTION", DEFAULT_COLLECTION),
            verify_tls: env_flag("QDRANT_MCP_VERIFY_SSL", true)?,
            ca_bundle: ca_bundle(),
            timeout: Duration::from_secs(env_parse_or("QDRANT_MCP_TIMEOUT_SECS", 5u64)?),
            token_threshold: env_parse_or("QDRANT_MCP_TOKEN_THRESHOLD", defaults.token_threshold)?,
            top_k: defaults.top_k,
            min_score: defaults.min_score,
        })
    }
}
