//! The descriptor builder abstraction

use crate::project::ProjectDescriptor;
use async_trait::async_trait;
use sandbuild_errors::{DescriptorError, Error};
use sandbuild_workspace::Subdirectory;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// A unit that writes exactly one file under a workspace directory
#[async_trait]
pub trait DescriptorBuilder: Debug + Send + Sync {
    /// Directory the file is written into
    fn dir(&self) -> &Subdirectory;

    /// File location relative to [`DescriptorBuilder::dir`]
    fn relative_path(&self) -> &Path;

    /// Final on-disk path. Known before [`DescriptorBuilder::create`] runs.
    fn path(&self) -> PathBuf {
        self.dir().path().join(self.relative_path())
    }

    /// Serialize the current state to [`DescriptorBuilder::path`]
    ///
    /// # Errors
    ///
    /// Fails if the file already exists or cannot be written.
    async fn create(&self) -> Result<(), Error>;

    /// Remove the written file. Never fails.
    async fn dispose(&self) {
        let _ = tokio::fs::remove_file(self.path()).await;
    }

    /// Downcast hook for the orchestrator
    fn as_project(&self) -> Option<&ProjectDescriptor> {
        None
    }
}

/// Create `name` under `dir` and write `contents` into it
pub(crate) async fn write_contents(
    dir: &Subdirectory,
    name: &str,
    contents: &[u8],
) -> Result<(), Error> {
    let mut file = dir.create_file(name).await?;
    let path = dir.file_path(name);
    let write_failed = |e: std::io::Error| -> Error {
        DescriptorError::WriteFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    };
    file.write_all(contents).await.map_err(write_failed)?;
    file.flush().await.map_err(write_failed)?;
    Ok(())
}
