#![warn(mismatched_lifetime_syntaxes)]
#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for sandbuild
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone so they can cross task boundaries freely.

use std::borrow::Cow;

use thiserror::Error;

pub mod build;
pub mod config;
pub mod descriptor;
pub mod network;
pub mod pack;
pub mod workspace;

// Re-export all error types at the root
pub use build::BuildError;
pub use config::ConfigError;
pub use descriptor::DescriptorError;
pub use network::NetworkError;
pub use pack::PackError;
pub use workspace::WorkspaceError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("pack error: {0}")]
    Pack(#[from] PackError),

    #[error("build error: {0}")]
    Build(#[from] BuildError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
        path: Option<std::path::PathBuf>,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an Io error with an associated path
    pub fn io_with_path(err: &std::io::Error, path: impl Into<std::path::PathBuf>) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: Some(path.into()),
        }
    }

    /// True when the error was raised because a precondition was violated
    /// before any I/O took place.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        match self {
            Error::Workspace(err) => err.is_precondition(),
            Error::Descriptor(DescriptorError::InvalidArgument { .. }) => true,
            Error::Build(err) => err.is_precondition(),
            _ => false,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
            path: None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

/// Result type alias for sandbuild operations
pub type Result<T> = std::result::Result<T, Error>;

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Network(err) => err.user_message(),
            Error::Build(err) => err.user_message(),
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Network(err) => err.user_hint(),
            Error::Build(err) => err.user_hint(),
            Error::Pack(err) => err.user_hint(),
            Error::Workspace(err) => err.user_hint(),
            Error::Config(err) => err.user_hint(),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(err) => err.is_retryable(),
            Error::Io { .. } => true,
            _ => false,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Workspace(err) => err.user_code(),
            Error::Descriptor(err) => err.user_code(),
            Error::Network(err) => err.user_code(),
            Error::Pack(err) => err.user_code(),
            Error::Build(err) => err.user_code(),
            Error::Config(err) => err.user_code(),
            Error::Internal(_) => Some("error.internal"),
            Error::Cancelled => Some("error.cancelled"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
