//! # Qdrant MCP
//!
//! Model Context Protocol adapter for the vector gateway. It speaks JSON-RPC
//! 2.0 and exposes the gateway's core operations as four fixed tools:
//!
//! | Tool | Operation |
//! |------|-----------|
//! | `qdrant-store` | embed and store one text |
//! | `qdrant-find` | semantic search |
//! | `qdrant-list-collections` | list collection names |
//! | `qdrant-create-collection` | create or confirm a collection |
//!
//! The same [`McpServer`] serves both transports:
//!
//! ```ignore
//! let server = McpServer::from_settings(service, &config.mcp);
//!
//! // stdio
//! let stdin = tokio::io::BufReader::new(tokio::io::stdin());
//! transport::serve_stdio(&server, stdin, tokio::io::stdout()).await?;
//!
//! // HTTP
//! let app = transport::router(Arc::new(server), &HttpOptions::from_config(&config));
//! ```

pub mod error;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;

pub use error::{McpError, McpResult, RpcError, codes};
pub use protocol::{LATEST_PROTOCOL_VERSION, McpRequest, McpResponse, SUPPORTED_PROTOCOL_VERSIONS};
pub use server::McpServer;
pub use session::{McpSession, SessionState};
pub use tools::{ToolCall, ToolKind};
