//! JSON-RPC over HTTP: one message per `POST /mcp`.
//!
//! `initialize` issues a session id in the `Mcp-Session-Id` response header;
//! later requests send it back. Sessions only remember the negotiated
//! protocol version, so a restart drops them and clients re-initialize.
//! Idle sessions expire and the table holds at most `max_sessions` entries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_helpers::{RouterOptions, run_health_checks, security_headers, with_limits};
use domain_vector::{GatewayConfig, VectorRepository};
use serde_json::Value;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::RpcError;
use crate::protocol::McpResponse;
use crate::server::{McpServer, encode};
use crate::session::McpSession;

pub const SESSION_HEADER: &str = "mcp-session-id";

/// Bounds for the HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Request deadline and body cap, shared with the REST API.
    pub limits: RouterOptions,
    pub session_idle_timeout: Duration,
    pub max_sessions: usize,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            limits: RouterOptions::default(),
            session_idle_timeout: Duration::from_secs(1800),
            max_sessions: 1024,
        }
    }
}

impl HttpOptions {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            limits: config.router_options(),
            session_idle_timeout: config.session_idle_timeout(),
            max_sessions: config.mcp.max_sessions,
        }
    }
}

struct SessionEntry {
    protocol_version: String,
    last_seen: Instant,
}

/// Session id -> negotiated protocol version, bounded by idle time and count.
struct SessionTable {
    entries: HashMap<String, SessionEntry>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl SessionTable {
    fn new(idle_timeout: Duration, max_sessions: usize) -> Self {
        Self {
            entries: HashMap::new(),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Protocol version of a live session, refreshing its idle clock.
    fn resume(&mut self, id: &str, now: Instant) -> Option<String> {
        let entry = self.entries.get_mut(id)?;
        if now.saturating_duration_since(entry.last_seen) < self.idle_timeout {
            entry.last_seen = now;
            return Some(entry.protocol_version.clone());
        }
        self.entries.remove(id);
        debug!(session_id = %id, "MCP HTTP session expired");
        None
    }

    fn insert(&mut self, id: String, protocol_version: String, now: Instant) {
        let idle_timeout = self.idle_timeout;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.last_seen) < idle_timeout);

        while self.entries.len() >= self.max_sessions {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(oldest) => {
                    debug!(session_id = %oldest, "Evicting least recently used MCP session");
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.entries.insert(
            id,
            SessionEntry {
                protocol_version,
                last_seen: now,
            },
        );
    }

    fn remove(&mut self, id: &str) -> bool {
        self.entries.remove(id).is_some()
    }
}

struct HttpState<R: VectorRepository> {
    server: Arc<McpServer<R>>,
    sessions: RwLock<SessionTable>,
}

type SharedState<R> = State<Arc<HttpState<R>>>;

/// MCP endpoints plus `GET /health`, bounded by `options.limits`.
pub fn router<R: VectorRepository + 'static>(
    server: Arc<McpServer<R>>,
    options: &HttpOptions,
) -> Router {
    let state = Arc::new(HttpState {
        server,
        sessions: RwLock::new(SessionTable::new(
            options.session_idle_timeout,
            options.max_sessions,
        )),
    });

    let routes = Router::new()
        .route("/mcp", post(handle_message::<R>).delete(close_session::<R>))
        .route("/", post(handle_message::<R>))
        .route("/health", get(health::<R>))
        .with_state(state);

    with_limits(routes, &options.limits)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security_headers))
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn json_response(status: StatusCode, response: &McpResponse) -> Response {
    match encode(response) {
        Ok(body) => (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            Body::from(body),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode MCP response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn handle_message<R: VectorRepository + 'static>(
    State(state): SharedState<R>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &McpResponse::error(None, RpcError::parse_error(e)),
            );
        }
    };

    let is_initialize = message.get("method").and_then(Value::as_str) == Some("initialize");

    let mut session = match session_id(&headers) {
        Some(id) if !is_initialize => {
            let known = state.sessions.write().await.resume(&id, Instant::now());
            match known {
                Some(version) => McpSession::resumed(version),
                None => {
                    debug!(session_id = %id, "Unknown MCP session");
                    let request_id = message.get("id").cloned();
                    return json_response(
                        StatusCode::NOT_FOUND,
                        &McpResponse::error(request_id, RpcError::not_ready("unknown session")),
                    );
                }
            }
        }
        _ => McpSession::new(),
    };

    let Some(response) = state.server.handle_value(&mut session, message).await else {
        return StatusCode::ACCEPTED.into_response();
    };

    let mut reply = json_response(StatusCode::OK, &response);

    if is_initialize && response.error.is_none() {
        if let Some(version) = session.protocol_version() {
            let id = Uuid::new_v4().to_string();
            state
                .sessions
                .write()
                .await
                .insert(id.clone(), version.to_string(), Instant::now());
            info!(session_id = %id, protocol_version = version, "MCP HTTP session opened");
            if let Ok(value) = HeaderValue::from_str(&id) {
                reply.headers_mut().insert(SESSION_HEADER, value);
            }
        }
    }

    reply
}

async fn close_session<R: VectorRepository + 'static>(
    State(state): SharedState<R>,
    headers: HeaderMap,
) -> StatusCode {
    let Some(id) = session_id(&headers) else {
        return StatusCode::BAD_REQUEST;
    };
    if state.sessions.write().await.remove(&id) {
        info!(session_id = %id, "MCP HTTP session closed");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn health<R: VectorRepository + 'static>(State(state): SharedState<R>) -> impl IntoResponse {
    run_health_checks(state.server.service().health_checks()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_sessions_expire() {
        let start = Instant::now();
        let mut table = SessionTable::new(Duration::from_secs(60), 16);
        table.insert("a".to_string(), "2025-03-26".to_string(), start);

        let seen = start + Duration::from_secs(30);
        assert_eq!(table.resume("a", seen).as_deref(), Some("2025-03-26"));

        // Resuming refreshed the clock, so 59s after that is still live.
        assert!(table.resume("a", seen + Duration::from_secs(59)).is_some());
        assert!(table.resume("a", seen + Duration::from_secs(59 + 60)).is_none());
        assert!(table.entries.is_empty());
    }

    #[test]
    fn test_insert_drops_expired_and_caps_count() {
        let start = Instant::now();
        let mut table = SessionTable::new(Duration::from_secs(60), 2);
        table.insert("old".to_string(), "v".to_string(), start);
        table.insert("b".to_string(), "v".to_string(), start + Duration::from_secs(50));

        // "old" is idle past the timeout and goes first.
        table.insert("c".to_string(), "v".to_string(), start + Duration::from_secs(70));
        assert!(!table.entries.contains_key("old"));
        assert_eq!(table.entries.len(), 2);

        // At capacity, the least recently used live session makes room.
        let later = start + Duration::from_secs(80);
        assert!(table.resume("b", later).is_some());
        table.insert("d".to_string(), "v".to_string(), later);
        assert_eq!(table.entries.len(), 2);
        assert!(table.entries.contains_key("b"));
        assert!(table.entries.contains_key("d"));
        assert!(!table.entries.contains_key("c"));
    }

    #[test]
    fn test_remove_reports_presence() {
        let mut table = SessionTable::new(Duration::from_secs(60), 4);
        table.insert("a".to_string(), "v".to_string(), Instant::now());
        assert!(table.remove("a"));
        assert!(!table.remove("a"));
    }
}
