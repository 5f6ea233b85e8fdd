//! Transports carrying JSON-RPC messages to an [`McpServer`](crate::McpServer)

pub mod http;
pub mod stdio;

pub use http::{HttpOptions, SESSION_HEADER, router};
pub use stdio::serve_stdio;
