use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Toolchain phases driven by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPhase {
    Restore,
    Build,
}

impl BuildPhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Build => "build",
        }
    }
}

/// Which process stream a captured line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Build orchestration events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Descriptors are about to be materialized
    Started {
        workspace: PathBuf,
        descriptors: usize,
    },

    /// A toolchain phase was spawned
    PhaseStarted {
        phase: BuildPhase,
        command: String,
        working_dir: PathBuf,
    },

    /// A toolchain phase exited; the exit code is informational only
    PhaseCompleted {
        phase: BuildPhase,
        exit_code: Option<i32>,
    },

    /// One line of captured toolchain output
    OutputLine {
        phase: BuildPhase,
        stream: OutputStream,
        line: String,
    },

    /// Diagnostics were recovered from free-text output
    Enriched { added: usize },

    /// Final diagnostic summary of a build
    DiagnosticsReported {
        errors: usize,
        warnings: usize,
        details: String,
    },
}

impl BuildEvent {
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Started {
                workspace,
                descriptors,
            } => format!(
                "materializing {descriptors} descriptor(s) in {}",
                workspace.display()
            ),
            Self::PhaseStarted {
                phase,
                command,
                working_dir,
            } => format!(
                "{}: running {command} in {}",
                phase.as_str(),
                working_dir.display()
            ),
            Self::PhaseCompleted { phase, exit_code } => {
                format!("{}: exited with {exit_code:?}", phase.as_str())
            }
            Self::OutputLine { phase, line, .. } => format!("[{}] {line}", phase.as_str()),
            Self::Enriched { added } => format!("recovered {added} diagnostic(s) from output"),
            Self::DiagnosticsReported {
                errors,
                warnings,
                details,
            } => format!("{errors} error(s), {warnings} warning(s)\n{details}"),
        }
    }
}
