use axum::response::{IntoResponse, Response};
use axum_helpers::{AppError, ErrorCode};
use serde::{Deserialize, Serialize};
use strum::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VectorError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Collection '{name}' exists with {actual}, requested {requested}")]
    CollectionMismatch {
        name: String,
        requested: String,
        actual: String,
    },

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector store unavailable ({context}): {message}")]
    StoreUnavailable { context: String, message: String },

    #[error("Vector store rejected {context}: {message}")]
    StoreRejected { context: String, message: String },

    #[error("Batch of {size} points exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// A create raced with another creator. Absorbed by the collection manager.
    #[error("Collection '{0}' already exists")]
    CollectionExists(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VectorResult<T> = Result<T, VectorError>;

/// Stable, transport-independent classification of a [`VectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    CollectionMismatch,
    ModelUnavailable,
    EmbeddingError,
    StoreUnavailable,
    StoreRejected,
    BatchTooLarge,
    Internal,
}

impl ErrorKind {
    /// Whether the same request may succeed if retried later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StoreUnavailable)
    }

    pub fn error_code(&self) -> ErrorCode {
        match self {
            ErrorKind::InvalidRequest => ErrorCode::InvalidRequest,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::CollectionMismatch => ErrorCode::CollectionMismatch,
            ErrorKind::ModelUnavailable => ErrorCode::ModelUnavailable,
            ErrorKind::EmbeddingError => ErrorCode::EmbeddingError,
            ErrorKind::StoreUnavailable => ErrorCode::StoreUnavailable,
            ErrorKind::StoreRejected => ErrorCode::StoreRejected,
            ErrorKind::BatchTooLarge => ErrorCode::BatchTooLarge,
            ErrorKind::Internal => ErrorCode::InternalError,
        }
    }
}

impl VectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VectorError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            VectorError::NotFound(_) => ErrorKind::NotFound,
            VectorError::CollectionMismatch { .. } => ErrorKind::CollectionMismatch,
            VectorError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            VectorError::Embedding(_) => ErrorKind::EmbeddingError,
            VectorError::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            VectorError::StoreRejected { .. } => ErrorKind::StoreRejected,
            VectorError::BatchTooLarge { .. } => ErrorKind::BatchTooLarge,
            VectorError::CollectionExists(_)
            | VectorError::Config(_)
            | VectorError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn collection_not_found(name: &str) -> Self {
        VectorError::NotFound(format!("collection '{}' does not exist", name))
    }

    pub fn store_unavailable(
        operation: &str,
        collection: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        VectorError::StoreUnavailable {
            context: describe_operation(operation, collection),
            message: message.into(),
        }
    }

    pub fn store_rejected(
        operation: &str,
        collection: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        VectorError::StoreRejected {
            context: describe_operation(operation, collection),
            message: message.into(),
        }
    }
}

fn describe_operation(operation: &str, collection: Option<&str>) -> String {
    match collection {
        Some(name) => format!("{} on '{}'", operation, name),
        None => operation.to_string(),
    }
}

impl From<validator::ValidationErrors> for VectorError {
    fn from(err: validator::ValidationErrors) -> Self {
        VectorError::InvalidRequest(err.to_string())
    }
}

impl From<reqwest::Error> for VectorError {
    fn from(err: reqwest::Error) -> Self {
        VectorError::Embedding(err.to_string())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        VectorError::Internal(format!("JSON error: {}", err))
    }
}

impl From<core_config::ConfigError> for VectorError {
    fn from(err: core_config::ConfigError) -> Self {
        VectorError::Config(err.to_string())
    }
}

/// Convert VectorError to AppError for standardized HTTP error responses
impl From<VectorError> for AppError {
    fn from(err: VectorError) -> Self {
        let kind = err.kind();
        AppError::Coded {
            code: kind.error_code(),
            message: err.to_string(),
            details: Some(serde_json::json!({
                "kind": kind,
                "retryable": kind.is_retryable(),
            })),
        }
    }
}

impl IntoResponse for VectorError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
