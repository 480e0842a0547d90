//! Plain source files written alongside descriptors

use crate::builder::{write_contents, DescriptorBuilder};
use async_trait::async_trait;
use sandbuild_errors::{DescriptorError, Error};
use sandbuild_workspace::Subdirectory;
use std::path::{Path, PathBuf};

/// A text file with fixed contents, e.g. a compilation unit
#[derive(Debug, Clone)]
pub struct SourceFile {
    dir: Subdirectory,
    relative_path: PathBuf,
    contents: String,
}

impl SourceFile {
    /// # Errors
    ///
    /// Returns `DescriptorError::InvalidArgument` for a blank path.
    pub fn new(
        dir: &Subdirectory,
        relative_path: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Result<Self, Error> {
        let relative_path = relative_path.into();
        if relative_path.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(DescriptorError::InvalidArgument {
                name: "relative_path".to_string(),
                message: "must not be blank".to_string(),
            }
            .into());
        }
        Ok(Self {
            dir: dir.clone(),
            relative_path,
            contents: contents.into(),
        })
    }

    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}

#[async_trait]
impl DescriptorBuilder for SourceFile {
    fn dir(&self) -> &Subdirectory {
        &self.dir
    }

    fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    async fn create(&self) -> Result<(), Error> {
        let name = self.relative_path.to_string_lossy();
        write_contents(&self.dir, &name, self.contents.as_bytes()).await
    }
}
