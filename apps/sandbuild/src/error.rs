//! CLI error handling

use std::fmt;

use sandbuild_errors::UserFacingError;

/// CLI-specific error type
#[derive(Debug)]
pub enum CliError {
    /// Library error, rendered through its user-facing message
    Build(sandbuild_errors::Error),
    /// Invalid command arguments
    InvalidArguments(String),
    /// A source file given on the command line could not be read
    Io(std::path::PathBuf, std::io::Error),
    /// Results could not be rendered
    Render(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Build(e) => {
                write!(f, "{}", e.user_message())?;
                if let Some(code) = e.user_code() {
                    write!(f, "\n  Code: {code}")?;
                }
                if let Some(hint) = e.user_hint() {
                    write!(f, "\n  Hint: {hint}")?;
                }
                if e.is_retryable() {
                    write!(f, "\n  Retry: safe to retry this operation.")?;
                }
                Ok(())
            }
            CliError::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            CliError::Io(path, e) => write!(f, "cannot read {}: {e}", path.display()),
            CliError::Render(msg) => write!(f, "failed to render results: {msg}"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Build(e) => Some(e),
            CliError::Io(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<sandbuild_errors::Error> for CliError {
    fn from(e: sandbuild_errors::Error) -> Self {
        CliError::Build(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Render(e.to_string())
    }
}
