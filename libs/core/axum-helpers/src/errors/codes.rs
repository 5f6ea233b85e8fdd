//! Type-safe error codes for API responses.
//!
//! Each error code carries:
//! - a string identifier for clients (e.g. `"STORE_UNAVAILABLE"`)
//! - an integer code for logs and dashboards (e.g. `2003`)
//! - the HTTP status it is served with
//! - a default human-readable message
//!
//! # Example
//!
//! ```rust
//! use axum_helpers::errors::ErrorCode;
//!
//! let code = ErrorCode::CollectionMismatch;
//! assert_eq!(code.as_str(), "COLLECTION_MISMATCH");
//! assert_eq!(code.code(), 1005);
//! assert_eq!(code.status().as_u16(), 409);
//! ```

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Client errors (1000-1999)
    /// Request body failed field validation
    ValidationError,

    /// Request body is not valid JSON for the endpoint
    InvalidJson,

    /// Request is well-formed but out of bounds
    InvalidRequest,

    /// Collection or point does not exist
    NotFound,

    /// Existing collection disagrees with the requested parameters
    CollectionMismatch,

    /// Request body exceeds the configured size cap
    PayloadTooLarge,

    /// Upsert batch exceeds the configured point count
    BatchTooLarge,

    /// The vector store refused the request as invalid
    StoreRejected,

    /// No route for this path
    RouteNotFound,

    /// Route exists but not for this method
    MethodNotAllowed,

    // Server errors (1500-1999)
    /// An unexpected internal error occurred
    InternalError,

    /// The service cannot take requests right now
    ServiceUnavailable,

    /// The request did not complete within the gateway deadline
    RequestTimeout,

    // Downstream errors (2000-2999)
    /// The embedding model could not be loaded
    ModelUnavailable,

    /// Embedding a single input failed
    EmbeddingError,

    /// The vector store could not be reached or timed out
    StoreUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::InvalidJson => "INVALID_JSON",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::CollectionMismatch => "COLLECTION_MISMATCH",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::BatchTooLarge => "BATCH_TOO_LARGE",
            Self::StoreRejected => "STORE_REJECTED",
            Self::RouteNotFound => "ROUTE_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::RequestTimeout => "REQUEST_TIMEOUT",
            Self::ModelUnavailable => "MODEL_UNAVAILABLE",
            Self::EmbeddingError => "EMBEDDING_ERROR",
            Self::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }

    /// Integer code for structured logs.
    ///
    /// - 1000-1499: caller errors
    /// - 1500-1999: gateway errors
    /// - 2000-2999: downstream (model, vector store) errors
    pub fn code(&self) -> i32 {
        match self {
            Self::ValidationError => 1001,
            Self::InvalidJson => 1002,
            Self::InvalidRequest => 1003,
            Self::NotFound => 1004,
            Self::CollectionMismatch => 1005,
            Self::PayloadTooLarge => 1006,
            Self::BatchTooLarge => 1007,
            Self::StoreRejected => 1008,
            Self::RouteNotFound => 1009,
            Self::MethodNotAllowed => 1010,

            Self::InternalError => 1501,
            Self::ServiceUnavailable => 1502,
            Self::RequestTimeout => 1503,

            Self::ModelUnavailable => 2001,
            Self::EmbeddingError => 2002,
            Self::StoreUnavailable => 2003,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ValidationError
            | Self::InvalidJson
            | Self::InvalidRequest
            | Self::StoreRejected => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::RouteNotFound => StatusCode::NOT_FOUND,
            Self::CollectionMismatch => StatusCode::CONFLICT,
            Self::PayloadTooLarge | Self::BatchTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::InternalError | Self::EmbeddingError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable | Self::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::RequestTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::StoreUnavailable => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::ValidationError => "Request validation failed",
            Self::InvalidJson => "Request body is not valid JSON for this endpoint",
            Self::InvalidRequest => "Request is invalid",
            Self::NotFound => "Resource not found",
            Self::CollectionMismatch => "Collection exists with different parameters",
            Self::PayloadTooLarge => "Request body is too large",
            Self::BatchTooLarge => "Too many points in one batch",
            Self::StoreRejected => "The vector store rejected the request",
            Self::RouteNotFound => "The requested resource was not found",
            Self::MethodNotAllowed => "The HTTP method is not allowed for this resource",
            Self::InternalError => "An internal server error occurred",
            Self::ServiceUnavailable => "Service is temporarily unavailable",
            Self::RequestTimeout => "The request did not complete in time",
            Self::ModelUnavailable => "The embedding model is not available",
            Self::EmbeddingError => "Failed to embed the input",
            Self::StoreUnavailable => "The vector store is unavailable",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
