//! Minimal client for the gateway REST API.

use reqwest::{Certificate, Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::config::HookConfig;
use crate::error::{HookError, HookResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    pub id: Value,
    pub score: f32,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct UpsertResponse {
    #[serde(default)]
    acknowledged: Vec<Value>,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    endpoint: String,
}

/// 5xx, 408 and 429 mean "try later"; other failures mean the request was wrong.
fn classify(status: StatusCode, body: String) -> HookError {
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        HookError::Unavailable(format!("{}: {}", status, body))
    } else {
        HookError::Rejected {
            status: status.as_u16(),
            body,
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> HookResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(classify(status, body))
}

impl GatewayClient {
    pub fn new(config: &HookConfig) -> HookResult<Self> {
        let mut builder = Client::builder().timeout(config.timeout);

        if config.is_https() {
            if !config.verify_tls {
                builder = builder.danger_accept_invalid_certs(true);
            } else if let Some(path) = &config.ca_bundle {
                let pem = std::fs::read(path).map_err(|e| {
                    HookError::Input(format!("cannot read CA bundle {}: {}", path.display(), e))
                })?;
                let certificate = Certificate::from_pem(&pem).map_err(|e| {
                    HookError::Input(format!("invalid CA bundle {}: {}", path.display(), e))
                })?;
                builder = builder.add_root_certificate(certificate);
            }
        }

        let http = builder
            .build()
            .map_err(|e| HookError::Input(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn collection_exists(&self, collection: &str) -> HookResult<bool> {
        let response = self
            .http
            .get(format!("{}/collections/{}", self.endpoint, collection))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ensure_success(response).await?;
        Ok(true)
    }

    /// Store one text under `id`; the gateway embeds it.
    pub async fn store(
        &self,
        collection: &str,
        id: &str,
        content: &str,
        payload: Map<String, Value>,
    ) -> HookResult<String> {
        let body = json!({
            "collection": collection,
            "points": [{"id": id, "content": content, "payload": payload}],
        });
        let response = self
            .http
            .post(format!("{}/vectors/upsert", self.endpoint))
            .json(&body)
            .send()
            .await?;
        let upserted: UpsertResponse = ensure_success(response).await?.json().await?;

        match upserted.acknowledged.first() {
            Some(Value::String(acked)) => Ok(acked.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(HookError::Rejected {
                status: StatusCode::OK.as_u16(),
                body: "upsert acknowledged no points".to_string(),
            }),
        }
    }

    pub async fn search(
        &self,
        collection: &str,
        query: &str,
        limit: u64,
        score_threshold: f32,
    ) -> HookResult<Vec<Hit>> {
        let body = json!({
            "collection": collection,
            "query": query,
            "limit": limit,
            "score_threshold": score_threshold,
        });
        let response = self
            .http
            .post(format!("{}/vectors/search", self.endpoint))
            .json(&body)
            .send()
            .await?;
        let found: SearchResponse = ensure_success(response).await?.json().await?;
        debug!(hits = found.results.len(), "Search finished");
        Ok(found.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert!(matches!(
            classify(StatusCode::BAD_GATEWAY, String::new()),
            HookError::Unavailable(_)
        ));
        assert!(matches!(
            classify(StatusCode::TOO_MANY_REQUESTS, String::new()),
            HookError::Unavailable(_)
        ));
        assert!(matches!(
            classify(StatusCode::PAYLOAD_TOO_LARGE, String::new()),
            HookError::Rejected { status: 413, .. }
        ));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_unavailable() {
        let config = HookConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout: std::time::Duration::from_millis(500),
            ..HookConfig::default()
        };
        let client = GatewayClient::new(&config).unwrap();
        let err = client.collection_exists("anything").await.unwrap_err();
        assert_eq!(err.kind(), "unavailable");
    }
}
