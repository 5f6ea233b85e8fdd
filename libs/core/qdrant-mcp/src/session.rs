//! Per-connection session lifecycle
//!
//! ```text
//! Uninitialized --initialize--> Ready <--> Handling
//! (any state) --transport end / close--> Closed
//! ```
//!
//! `Closed` is terminal.

use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Ready,
    Handling,
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpSession {
    state: SessionState,
    protocol_version: Option<String>,
}

impl Default for McpSession {
    fn default() -> Self {
        Self::new()
    }
}

impl McpSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Uninitialized,
            protocol_version: None,
        }
    }

    /// A session that already completed `initialize`, e.g. one looked up by
    /// its HTTP session id.
    pub fn resumed(protocol_version: impl Into<String>) -> Self {
        Self {
            state: SessionState::Ready,
            protocol_version: Some(protocol_version.into()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::Handling)
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }

    /// Returns false when the session was already initialized or is closed.
    pub(crate) fn initialize(&mut self, protocol_version: &str) -> bool {
        if self.state != SessionState::Uninitialized {
            return false;
        }
        self.protocol_version = Some(protocol_version.to_string());
        self.state = SessionState::Ready;
        true
    }

    pub(crate) fn begin(&mut self) {
        if self.state == SessionState::Ready {
            self.state = SessionState::Handling;
        }
    }

    pub(crate) fn finish(&mut self) {
        if self.state == SessionState::Handling {
            self.state = SessionState::Ready;
        }
    }

    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }
}
