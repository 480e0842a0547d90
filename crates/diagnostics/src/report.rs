//! Structured diagnostic report model
//!
//! Mirrors the subset of the SARIF 2.1 log the toolchain writes:
//! `{ runs: [ { results: [ { ruleId, level, message: { text } } ] } ] }`.
//! Unknown fields are ignored.

use sandbuild_errors::{BuildError, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::OnceLock;

/// Severity of a result. Anything outside the known set is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    Error,
    #[default]
    Warning,
    Note,
    None,
    Other(String),
}

impl Level {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Note => "note",
            Self::None => "none",
            Self::Other(level) => level,
        }
    }
}

impl From<String> for Level {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warning" => Self::Warning,
            "note" => Self::Note,
            "none" => Self::None,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for Level {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: String,
}

/// One diagnostic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    #[serde(default)]
    pub rule_id: String,
    #[serde(default)]
    pub level: Level,
    #[serde(default)]
    pub message: Message,
}

impl ResultEntry {
    #[must_use]
    pub fn new(rule_id: impl Into<String>, level: impl Into<Level>, text: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            level: level.into(),
            message: Message { text: text.into() },
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }

    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.level == Level::Warning
    }
}

impl fmt::Display for ResultEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.level, self.rule_id, self.message.text)
    }
}

/// One analysis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

impl Run {
    #[must_use]
    pub fn new(results: Vec<ResultEntry>) -> Self {
        Self { results }
    }
}

/// Parsed report plus a lazily built flat view of every result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiagnosticReport {
    #[serde(default)]
    runs: Vec<Run>,
    #[serde(skip)]
    flattened: OnceLock<Vec<ResultEntry>>,
}

impl DiagnosticReport {
    #[must_use]
    pub fn new(runs: Vec<Run>) -> Self {
        Self {
            runs,
            flattened: OnceLock::new(),
        }
    }

    /// Parse a report document
    ///
    /// # Errors
    ///
    /// Returns `serde_json::Error` for malformed input.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Read and parse the report file the toolchain wrote
    ///
    /// # Errors
    ///
    /// Returns `BuildError::ReportMissing` when the file does not exist and
    /// `BuildError::ReportParse` when it cannot be read or decoded.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            let path = path.display().to_string();
            if e.kind() == ErrorKind::NotFound {
                BuildError::ReportMissing { path }
            } else {
                BuildError::ReportParse {
                    path,
                    message: e.to_string(),
                }
            }
        })?;
        Self::from_json(&text).map_err(|e| {
            BuildError::ReportParse {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// Append a run and invalidate the flat view
    pub fn push_run(&mut self, run: Run) {
        self.runs.push(run);
        self.flattened = OnceLock::new();
    }

    /// Every result across all runs, in run order
    #[must_use]
    pub fn results(&self) -> &[ResultEntry] {
        self.flattened.get_or_init(|| {
            self.runs
                .iter()
                .flat_map(|run| run.results.iter().cloned())
                .collect()
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &ResultEntry> {
        self.results().iter().filter(|r| r.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ResultEntry> {
        self.results().iter().filter(|r| r.is_warning())
    }

    #[must_use]
    pub fn has_errors_or_warnings(&self) -> bool {
        self.results().iter().any(|r| r.is_error() || r.is_warning())
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in self.results() {
            writeln!(f, "{result}")?;
        }
        Ok(())
    }
}
