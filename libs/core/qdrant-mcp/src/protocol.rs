//! JSON-RPC 2.0 envelope for MCP

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol revisions this server speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

pub const LATEST_PROTOCOL_VERSION: &str = "2025-03-26";

/// Echo the client's revision when supported, otherwise offer the latest.
pub fn negotiate_version(requested: Option<&str>) -> &'static str {
    requested
        .and_then(|wanted| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|supported| *supported == wanted)
        })
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

/// Incoming request or notification
#[derive(Debug, Clone, PartialEq)]
pub struct McpRequest {
    /// `None` for notifications, which never get a response
    pub id: Option<Value>,
    pub method: String,
    pub params: Value,
}

impl McpRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Validate the envelope of an already-parsed JSON message.
    ///
    /// On failure the error carries whatever id could be recovered so the
    /// client can still correlate it.
    pub fn from_value(message: Value) -> Result<Self, (Option<Value>, RpcError)> {
        let Value::Object(mut object) = message else {
            return Err((
                None,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        let id = object.remove("id");
        if let Some(bad) = id
            .as_ref()
            .filter(|id| !(id.is_string() || id.is_number() || id.is_null()))
        {
            return Err((
                None,
                RpcError::invalid_request(format!("Invalid id: {}", bad)),
            ));
        }

        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err((id, RpcError::invalid_request("jsonrpc must be \"2.0\"")));
        }

        let Some(Value::String(method)) = object.remove("method") else {
            return Err((id, RpcError::invalid_request("method must be a string")));
        };

        let params = object.remove("params").unwrap_or(Value::Null);
        if !(params.is_object() || params.is_array() || params.is_null()) {
            return Err((
                id,
                RpcError::invalid_request("params must be an object or array"),
            ));
        }

        Ok(Self { id, method, params })
    }
}

/// Outgoing response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl McpResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(error),
        }
    }
}
