use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ephemeral workspace lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkspaceEvent {
    /// Root directory materialized on first use
    Created { path: PathBuf },

    /// Recursive teardown finished (possibly with swallowed failures)
    Disposed { path: PathBuf },

    /// A directory could not be removed during teardown
    CleanupFailed { path: PathBuf, error: String },
}

impl WorkspaceEvent {
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Created { path } => format!("workspace created at {}", path.display()),
            Self::Disposed { path } => format!("workspace {} disposed", path.display()),
            Self::CleanupFailed { path, error } => {
                format!("ignoring cleanup failure for {}: {error}", path.display())
            }
        }
    }
}
