//! Build orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("no descriptor builders registered")]
    NoBuilders,

    #[error("at least one project descriptor must be registered")]
    NoProjectDescriptor,

    #[error("descriptor builder already registered: {path}")]
    DuplicateBuilder { path: String },

    #[error("failed to start toolchain {program}: {message}")]
    ToolchainSpawn { program: String, message: String },

    #[error("diagnostic report not found: {path}")]
    ReportMissing { path: String },

    #[error("diagnostic report {path} could not be parsed: {message}")]
    ReportParse { path: String, message: String },
}

impl BuildError {
    /// Raised before any filesystem or process activity
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NoBuilders | Self::NoProjectDescriptor | Self::DuplicateBuilder { .. }
        )
    }
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoBuilders | Self::NoProjectDescriptor => {
                Some("Register a project descriptor before calling build.")
            }
            Self::ToolchainSpawn { .. } => {
                Some("Make sure the toolchain is installed and on PATH, or set [toolchain] program.")
            }
            Self::ReportMissing { .. } => {
                Some("The toolchain did not write a report; check the captured output.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::NoBuilders => "build.no_builders",
            Self::NoProjectDescriptor => "build.no_project_descriptor",
            Self::DuplicateBuilder { .. } => "build.duplicate_builder",
            Self::ToolchainSpawn { .. } => "build.toolchain_spawn",
            Self::ReportMissing { .. } => "build.report_missing",
            Self::ReportParse { .. } => "build.report_parse",
        })
    }
}
