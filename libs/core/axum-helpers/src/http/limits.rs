//! Request admission limits: declared body size and end-to-end deadline.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::CONTENT_LENGTH,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::{AppError, ErrorCode};

/// Reject a request whose declared `Content-Length` exceeds `max_bytes`
/// before any of the body is read.
///
/// Bodies without a declared length are capped while buffering by
/// `axum::extract::DefaultBodyLimit`, which `create_router` installs with the
/// same limit.
pub async fn enforce_body_limit(
    State(max_bytes): State<usize>,
    request: Request,
    next: Next,
) -> Response {
    let declared = request
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    match declared {
        Some(len) if len > max_bytes => AppError::PayloadTooLarge(format!(
            "request body of {} bytes exceeds the {} byte limit",
            len, max_bytes
        ))
        .into_response(),
        _ => next.run(request).await,
    }
}

/// Bound the whole request by `deadline`. An expired request is answered with
/// `REQUEST_TIMEOUT` (504) and the handler future is dropped.
pub async fn enforce_deadline(
    State(deadline): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    match tokio::time::timeout(deadline, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(%path, deadline_ms = deadline.as_millis() as u64, "Request deadline exceeded");
            AppError::coded(
                ErrorCode::RequestTimeout,
                format!("{} did not complete within {}ms", path, deadline.as_millis()),
            )
            .into_response()
        }
    }
}
