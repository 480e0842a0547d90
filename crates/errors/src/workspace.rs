//! Workspace error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum WorkspaceError {
    #[error("invalid {what} name: {name:?}")]
    InvalidName { what: &'static str, name: String },

    #[error("file already exists: {path}")]
    FileExists { path: String },

    #[error("failed to create directory {path}: {message}")]
    CreateDirFailed { path: String, message: String },

    #[error("failed to create file {path}: {message}")]
    CreateFileFailed { path: String, message: String },
}

impl WorkspaceError {
    /// Raised before any filesystem activity
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidName { .. } | Self::FileExists { .. })
    }
}

impl UserFacingError for WorkspaceError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidName { .. } => {
                Some("Names must be non-blank relative paths without `..` components.")
            }
            Self::FileExists { .. } => {
                Some("Workspace files are never overwritten; pick a different file name.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::InvalidName { .. } => "workspace.invalid_name",
            Self::FileExists { .. } => "workspace.file_exists",
            Self::CreateDirFailed { .. } => "workspace.create_dir_failed",
            Self::CreateFileFailed { .. } => "workspace.create_file_failed",
        })
    }
}
