//! Error types for the MCP adapter
//!
//! `RpcError` is the JSON-RPC error object sent to clients. `McpError` covers
//! failures of the transports themselves.

use domain_vector::{ErrorKind, VectorError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Stable JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Session has not completed `initialize`
    pub const NOT_READY: i32 = -32002;

    // Gateway error kinds
    pub const GATEWAY_INVALID_REQUEST: i32 = -32010;
    pub const GATEWAY_NOT_FOUND: i32 = -32011;
    pub const COLLECTION_MISMATCH: i32 = -32012;
    pub const MODEL_UNAVAILABLE: i32 = -32013;
    pub const EMBEDDING_ERROR: i32 = -32014;
    pub const STORE_UNAVAILABLE: i32 = -32015;
    pub const STORE_REJECTED: i32 = -32016;
    pub const BATCH_TOO_LARGE: i32 = -32017;
}

/// JSON-RPC error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(details: impl std::fmt::Display) -> Self {
        Self::new(codes::PARSE_ERROR, format!("Parse error: {}", details))
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_REQUEST, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(codes::INTERNAL_ERROR, message)
    }

    pub fn not_ready(method: &str) -> Self {
        Self::new(
            codes::NOT_READY,
            format!("Session not initialized; '{}' requires initialize first", method),
        )
    }
}

fn kind_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidRequest => codes::GATEWAY_INVALID_REQUEST,
        ErrorKind::NotFound => codes::GATEWAY_NOT_FOUND,
        ErrorKind::CollectionMismatch => codes::COLLECTION_MISMATCH,
        ErrorKind::ModelUnavailable => codes::MODEL_UNAVAILABLE,
        ErrorKind::EmbeddingError => codes::EMBEDDING_ERROR,
        ErrorKind::StoreUnavailable => codes::STORE_UNAVAILABLE,
        ErrorKind::StoreRejected => codes::STORE_REJECTED,
        ErrorKind::BatchTooLarge => codes::BATCH_TOO_LARGE,
        ErrorKind::Internal => codes::INTERNAL_ERROR,
    }
}

impl From<VectorError> for RpcError {
    fn from(err: VectorError) -> Self {
        let kind = err.kind();
        Self {
            code: kind_code(kind),
            message: err.to_string(),
            data: Some(json!({
                "kind": kind,
                "retryable": kind.is_retryable(),
            })),
        }
    }
}

/// Transport failure
#[derive(Debug, Error)]
pub enum McpError {
    #[error("I/O error on {transport} transport: {source}")]
    Io {
        transport: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl McpError {
    pub fn io(transport: &'static str, source: std::io::Error) -> Self {
        McpError::Io { transport, source }
    }
}

pub type McpResult<T> = Result<T, McpError>;
