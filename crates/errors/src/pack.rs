//! Local package builder error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PackError {
    #[error("packaging tool {tool} could not be started: {message}")]
    ToolSpawn { tool: String, message: String },

    #[error("packaging {source_path} failed with exit code {code:?}: {output}")]
    PackFailed {
        source_path: String,
        code: Option<i32>,
        output: String,
    },

    #[error("packaging tool download failed: {message}")]
    ToolDownload { message: String },
}

impl UserFacingError for PackError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolSpawn { .. } => {
                Some("Install the packaging CLI or set [pack] tool = \"download\" in the config.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ToolSpawn { .. } => "pack.tool_spawn",
            Self::PackFailed { .. } => "pack.failed",
            Self::ToolDownload { .. } => "pack.tool_download",
        })
    }
}
