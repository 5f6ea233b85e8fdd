//! Transport-independent request handling
//!
//! Both transports feed parsed messages through [`McpServer::handle_value`]
//! and encode the reply with [`encode`], so a given call produces the same
//! bytes over stdio and HTTP.

use std::sync::Arc;

use domain_vector::settings::McpSettings;
use domain_vector::{VectorRepository, VectorService};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{McpResult, RpcError};
use crate::protocol::{McpRequest, McpResponse, negotiate_version};
use crate::session::McpSession;
use crate::tools::{ToolCall, ToolKind, tool_result};

#[derive(Debug, Clone, Serialize)]
struct ServerInfo {
    name: String,
    version: String,
}

/// MCP request handler over a shared gateway service
pub struct McpServer<R: VectorRepository> {
    service: Arc<VectorService<R>>,
    info: ServerInfo,
}

impl<R: VectorRepository + 'static> McpServer<R> {
    pub fn new(
        service: Arc<VectorService<R>>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            service,
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
        }
    }

    pub fn from_settings(service: Arc<VectorService<R>>, settings: &McpSettings) -> Self {
        Self::new(service, &settings.server_name, &settings.version)
    }

    pub fn service(&self) -> &Arc<VectorService<R>> {
        &self.service
    }

    /// Handle one raw message. `None` means nothing is sent back.
    pub async fn handle_line(
        &self,
        session: &mut McpSession,
        line: &str,
    ) -> McpResult<Option<String>> {
        let response = match serde_json::from_str::<Value>(line) {
            Ok(message) => self.handle_value(session, message).await,
            Err(e) => Some(McpResponse::error(None, RpcError::parse_error(e))),
        };
        response.as_ref().map(encode).transpose()
    }

    /// Handle one parsed message.
    pub async fn handle_value(
        &self,
        session: &mut McpSession,
        message: Value,
    ) -> Option<McpResponse> {
        let request = match McpRequest::from_value(message) {
            Ok(request) => request,
            Err((id, error)) => return Some(McpResponse::error(id, error)),
        };

        if request.is_notification() {
            debug!(method = %request.method, "Notification received");
            return None;
        }

        let id = request.id.clone();
        let outcome = self.dispatch(session, request).await;
        Some(match outcome {
            Ok(result) => McpResponse::success(id, result),
            Err(error) => McpResponse::error(id, error),
        })
    }

    async fn dispatch(
        &self,
        session: &mut McpSession,
        request: McpRequest,
    ) -> Result<Value, RpcError> {
        if session.is_closed() {
            return Err(RpcError::invalid_request("Session is closed"));
        }

        match request.method.as_str() {
            "initialize" => self.initialize(session, &request.params),
            "ping" => Ok(json!({})),
            "tools/list" | "tools/call" if !session.is_ready() => {
                Err(RpcError::not_ready(&request.method))
            }
            "tools/list" => Ok(ToolKind::catalog()),
            "tools/call" => {
                session.begin();
                let result = self.call_tool(&request.params).await;
                session.finish();
                result
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    fn initialize(&self, session: &mut McpSession, params: &Value) -> Result<Value, RpcError> {
        let requested = params.get("protocolVersion").and_then(Value::as_str);
        let version = negotiate_version(requested);

        if !session.initialize(version) {
            return Err(RpcError::invalid_request("Session already initialized"));
        }

        info!(
            requested = requested.unwrap_or("none"),
            negotiated = version,
            "MCP session initialized"
        );

        Ok(json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": {"listChanged": false}
            },
            "serverInfo": self.info,
        }))
    }

    async fn call_tool(&self, params: &Value) -> Result<Value, RpcError> {
        let call = ToolCall::parse(params)?;
        let tool = call.kind();

        match call.execute(&self.service).await {
            Ok(structured) => {
                debug!(%tool, "Tool call succeeded");
                Ok(tool_result(structured))
            }
            Err(e) => {
                warn!(%tool, error = %e, error_code = %e.kind(), "Tool call failed");
                Err(e.into())
            }
        }
    }
}

/// Wire form of a response, shared by every transport.
pub fn encode(response: &McpResponse) -> McpResult<String> {
    Ok(serde_json::to_string(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::session::SessionState;
    use domain_vector::settings::VectorSettings;
    use domain_vector::{HashingProvider, InMemoryRepository};

    fn server() -> McpServer<InMemoryRepository> {
        let embedder = Arc::new(HashingProvider::new(64).unwrap());
        let settings = VectorSettings {
            collection_name: "notes".to_string(),
            vector_size: 64,
            ..VectorSettings::default()
        };
        let service = VectorService::new(Arc::new(InMemoryRepository::new()), embedder, settings);
        McpServer::new(Arc::new(service), "qdrant-mcp", "test")
    }

    fn request(id: u64, method: &str, params: Value) -> Value {
        json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params})
    }

    async fn initialized(server: &McpServer<InMemoryRepository>) -> McpSession {
        let mut session = McpSession::new();
        let response = server
            .handle_value(
                &mut session,
                request(1, "initialize", json!({"protocolVersion": "2024-11-05"})),
            )
            .await
            .unwrap();
        assert_eq!(response.result.unwrap()["protocolVersion"], "2024-11-05");
        session
    }

    #[tokio::test]
    async fn test_tools_require_initialize() {
        let server = server();
        let mut session = McpSession::new();

        for method in ["tools/list", "tools/call"] {
            let response = server
                .handle_value(&mut session, request(1, method, json!({})))
                .await
                .unwrap();
            assert_eq!(response.error.unwrap().code, codes::NOT_READY);
        }

        let pong = server
            .handle_value(&mut session, request(2, "ping", Value::Null))
            .await
            .unwrap();
        assert_eq!(pong.result, Some(json!({})));
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[tokio::test]
    async fn test_initialize_once() {
        let server = server();
        let mut session = initialized(&server).await;
        assert_eq!(session.state(), SessionState::Ready);

        let again = server
            .handle_value(&mut session, request(2, "initialize", json!({})))
            .await
            .unwrap();
        assert_eq!(again.error.unwrap().code, codes::INVALID_REQUEST);
        assert_eq!(session.protocol_version(), Some("2024-11-05"));
    }

    #[tokio::test]
    async fn test_unknown_version_gets_latest() {
        let server = server();
        let mut session = McpSession::new();
        let response = server
            .handle_value(
                &mut session,
                request(1, "initialize", json!({"protocolVersion": "1999-01-01"})),
            )
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], "qdrant-mcp");
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let server = server();
        let mut session = initialized(&server).await;
        let reply = server
            .handle_value(
                &mut session,
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            )
            .await;
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = server();
        let mut session = initialized(&server).await;

        let line = server.handle_line(&mut session, "{not json").await.unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["error"]["code"], codes::PARSE_ERROR);
        assert_eq!(parsed["id"], Value::Null);

        let response = server
            .handle_value(&mut session, request(3, "resources/list", Value::Null))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);

        let response = server
            .handle_value(
                &mut session,
                request(4, "tools/call", json!({"name": "qdrant-drop"})),
            )
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_store_then_find() {
        let server = server();
        let mut session = initialized(&server).await;

        let stored = server
            .handle_value(
                &mut session,
                request(
                    2,
                    "tools/call",
                    json!({"name": "qdrant-store", "arguments": {
                        "content": "rust borrow checker lifetimes",
                        "metadata": {"topic": "rust"},
                        "id": "note-1"
                    }}),
                ),
            )
            .await
            .unwrap();
        let stored = stored.result.unwrap();
        assert_eq!(stored["isError"], false);
        assert_eq!(stored["structuredContent"]["collection"], "notes");
        assert_eq!(session.state(), SessionState::Ready);

        let found = server
            .handle_value(
                &mut session,
                request(
                    3,
                    "tools/call",
                    json!({"name": "qdrant-find", "arguments": {
                        "query": "borrow checker",
                        "score_threshold": 0.0
                    }}),
                ),
            )
            .await
            .unwrap();
        let found = found.result.unwrap();
        let results = &found["structuredContent"]["results"];
        assert_eq!(results[0]["id"], "note-1");
        assert_eq!(results[0]["payload"]["topic"], "rust");
        assert_eq!(
            found["content"][0]["text"],
            found["structuredContent"].to_string()
        );
    }

    #[tokio::test]
    async fn test_gateway_errors_map_to_codes() {
        let server = server();
        let mut session = initialized(&server).await;

        let response = server
            .handle_value(
                &mut session,
                request(
                    2,
                    "tools/call",
                    json!({"name": "qdrant-find", "arguments": {
                        "query": "anything",
                        "collection": "missing"
                    }}),
                ),
            )
            .await
            .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::GATEWAY_NOT_FOUND);
        assert_eq!(error.data.unwrap()["kind"], "not_found");
    }

    #[tokio::test]
    async fn test_closed_session_rejects_requests() {
        let server = server();
        let mut session = initialized(&server).await;
        session.close();

        let response = server
            .handle_value(&mut session, request(9, "ping", Value::Null))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, codes::INVALID_REQUEST);
    }
}
