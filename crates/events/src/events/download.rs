use serde::{Deserialize, Serialize};

/// HTTP transport events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DownloadEvent {
    Started {
        url: String,
    },

    /// A transient failure is about to be retried
    Retrying {
        url: String,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },

    Completed {
        url: String,
        bytes: u64,
    },

    Failed {
        url: String,
        message: String,
    },
}

impl DownloadEvent {
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Started { url } => format!("downloading {url}"),
            Self::Retrying {
                url,
                attempt,
                delay_ms,
                reason,
            } => format!("attempt {attempt} for {url} failed ({reason}); retrying in {delay_ms}ms"),
            Self::Completed { url, bytes } => format!("downloaded {bytes} bytes from {url}"),
            Self::Failed { url, message } => format!("download of {url} failed: {message}"),
        }
    }
}
