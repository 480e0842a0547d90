use serde::{Deserialize, Serialize};
use tracing::Level;

// Declare all domain modules
pub mod build;
pub mod download;
pub mod general;
pub mod pack;
pub mod workspace;

// Re-export all domain events
pub use build::*;
pub use download::*;
pub use general::*;
pub use pack::*;
pub use workspace::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Free-form debug notes
    General(GeneralEvent),

    /// Ephemeral workspace lifecycle
    Workspace(WorkspaceEvent),

    /// Toolchain phases, captured output and diagnostics
    Build(BuildEvent),

    /// HTTP transport activity
    Download(DownloadEvent),

    /// Local package builder activity
    Pack(PackEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> Level {
        match self {
            // Error-level events
            Self::Download(DownloadEvent::Failed { .. }) => Level::ERROR,

            // Warning-level events
            Self::Download(DownloadEvent::Retrying { .. }) => Level::WARN,
            Self::Build(BuildEvent::DiagnosticsReported {
                errors, warnings, ..
            }) if errors + warnings > 0 => Level::WARN,

            // Debug-level events (captured output, internal state)
            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Build(BuildEvent::OutputLine { .. })
            | Self::Workspace(WorkspaceEvent::CleanupFailed { .. })
            | Self::Pack(PackEvent::SourceSkipped { .. } | PackEvent::ToolResolved { .. }) => {
                Level::DEBUG
            }

            // Default to INFO for most events
            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "sandbuild::events::general",
            Self::Workspace(_) => "sandbuild::events::workspace",
            Self::Build(_) => "sandbuild::events::build",
            Self::Download(_) => "sandbuild::events::download",
            Self::Pack(_) => "sandbuild::events::pack",
        }
    }

    /// Human readable one-line (or, for diagnostics, multi-line) rendering
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::General(event) => event.summary(),
            Self::Workspace(event) => event.summary(),
            Self::Build(event) => event.summary(),
            Self::Download(event) => event.summary(),
            Self::Pack(event) => event.summary(),
        }
    }

    /// Forward this event to the tracing subscriber at its own level.
    ///
    /// Callsite metadata in tracing is static, so the per-domain target is
    /// carried as a field rather than as the record target.
    pub fn log(&self) {
        let domain = self.log_target();
        let summary = self.summary();
        match self.log_level() {
            Level::ERROR => tracing::error!(target: "sandbuild::events", domain, "{summary}"),
            Level::WARN => tracing::warn!(target: "sandbuild::events", domain, "{summary}"),
            Level::INFO => tracing::info!(target: "sandbuild::events", domain, "{summary}"),
            Level::DEBUG => tracing::debug!(target: "sandbuild::events", domain, "{summary}"),
            _ => tracing::trace!(target: "sandbuild::events", domain, "{summary}"),
        }
    }
}
