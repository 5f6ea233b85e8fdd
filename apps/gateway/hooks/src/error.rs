use std::path::PathBuf;

use thiserror::Error;

/// Hook failures, split by who is at fault.
///
/// `Unavailable` is the gateway being down or overloaded and never fails the
/// host workflow. `Transcript` and `Input` are local problems and do.
#[derive(Debug, Error)]
pub enum HookError {
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[error("Gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Transcript error at {path}: {source}")]
    Transcript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid hook input: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_config::ConfigError),
}

impl HookError {
    pub fn transcript(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        HookError::Transcript {
            path: path.into(),
            source,
        }
    }

    /// Failure class reported on stderr.
    pub fn kind(&self) -> &'static str {
        match self {
            HookError::Unavailable(_) => "unavailable",
            HookError::Rejected { .. } => "rejected",
            HookError::Transcript { .. } => "transcript",
            HookError::Input(_) => "input",
            HookError::Config(_) => "config",
        }
    }
}

impl From<reqwest::Error> for HookError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return HookError::Rejected {
                status: 200,
                body: err.to_string(),
            };
        }
        match err.status() {
            Some(status) if !status.is_server_error() => HookError::Rejected {
                status: status.as_u16(),
                body: err.to_string(),
            },
            _ => HookError::Unavailable(err.to_string()),
        }
    }
}

pub type HookResult<T> = Result<T, HookError>;
