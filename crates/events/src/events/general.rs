use serde::{Deserialize, Serialize};

/// Free-form diagnostics that belong to no particular domain
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeneralEvent {
    /// Debug-level note about internal state
    DebugLog { message: String },
}

impl GeneralEvent {
    /// Create a debug log event
    pub fn debug(message: impl Into<String>) -> Self {
        Self::DebugLog {
            message: message.into(),
        }
    }

    pub(crate) fn summary(&self) -> String {
        match self {
            Self::DebugLog { message } => message.clone(),
        }
    }
}
