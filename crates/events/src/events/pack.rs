use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local package builder events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    Started {
        sources: usize,
        output_dir: PathBuf,
    },

    ToolResolved {
        tool: PathBuf,
    },

    SourcePacked {
        source: PathBuf,
    },

    /// A candidate path that does not exist on disk
    SourceSkipped {
        source: PathBuf,
    },

    Completed {
        packed: usize,
    },
}

impl PackEvent {
    pub(crate) fn summary(&self) -> String {
        match self {
            Self::Started {
                sources,
                output_dir,
            } => format!(
                "packing {sources} local source(s) into {}",
                output_dir.display()
            ),
            Self::ToolResolved { tool } => format!("using packaging tool {}", tool.display()),
            Self::SourcePacked { source } => format!("packed {}", source.display()),
            Self::SourceSkipped { source } => {
                format!("skipping missing source {}", source.display())
            }
            Self::Completed { packed } => format!("packed {packed} local source(s)"),
        }
    }
}
