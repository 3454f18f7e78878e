use std::io;
use thiserror::Error;

/// Every failure the plugin can surface to the editor.
#[derive(Debug, Error)]
pub enum MacroBugError {
    /// The user passed something that cannot name a register.
    #[error("{0}")]
    InvalidArgument(String),

    /// The editor is not in a state where the operation makes sense.
    #[error("{0}")]
    PreconditionFailed(String),

    /// The editor rejected a call. The message is passed through as-is.
    #[error("{0}")]
    Host(String),

    /// A frame on the wire could not be understood.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl MacroBugError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Transport failures mean the editor is gone; nothing else is worth doing.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Protocol(_))
    }
}

pub type Result<T> = std::result::Result<T, MacroBugError>;
