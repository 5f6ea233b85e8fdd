//! Assistant hook commands backed by the gateway REST API
//!
//! - `precompact`: before the host compacts a conversation, long transcript
//!   entries are stored as vectors and replaced by `[[VEC:<id>]]` stubs.
//! - `retrieve`: on prompt submit or tool use, relevant stored text is looked
//!   up and handed back to the host.
//!
//! Both read the hook event as JSON on stdin and answer with JSON on stdout.
//! A gateway that cannot be reached never fails the host workflow; a
//! transcript that cannot be read or written does.

pub mod client;
pub mod config;
pub mod error;
pub mod precompact;
pub mod retrieve;

pub use client::GatewayClient;
pub use config::HookConfig;
pub use error::{HookError, HookResult};

/// Parse the hook event read from stdin.
pub fn parse_event(raw: &str) -> HookResult<serde_json::Value> {
    if raw.trim().is_empty() {
        return Err(HookError::Input("No input received".to_string()));
    }
    serde_json::from_str(raw).map_err(|e| HookError::Input(format!("Invalid JSON input: {}", e)))
}
