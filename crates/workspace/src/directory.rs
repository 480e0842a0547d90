//! Directory handles nested under a workspace

use sandbuild_errors::{Error, WorkspaceError};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};

/// A directory somewhere below a [`crate::Workspace`] root.
///
/// The handle is only a path; nothing is created until one of the async
/// operations runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdirectory {
    path: PathBuf,
}

impl Subdirectory {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create this directory (and its parents) if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn create(&self) -> Result<(), Error> {
        create_dir(&self.path).await
    }

    /// Create a nested directory and return a handle over it
    ///
    /// # Errors
    ///
    /// Fails with `WorkspaceError::InvalidName` for a blank name or one that
    /// would leave this directory, before any filesystem access, or with an
    /// I/O error if creation fails.
    pub async fn create_subdirectory(&self, name: &str) -> Result<Subdirectory, Error> {
        validate_name("directory", name)?;
        let child = Subdirectory::new(self.path.join(name));
        child.create().await?;
        Ok(child)
    }

    /// Create a new file below this directory.
    ///
    /// Missing parent directories are created. An existing file is never
    /// overwritten. The returned handle is open for writing.
    ///
    /// # Errors
    ///
    /// Fails with `WorkspaceError::InvalidName` for a blank or escaping name
    /// and with `WorkspaceError::FileExists` if the target already exists.
    pub async fn create_file(&self, name: &str) -> Result<File, Error> {
        validate_name("file", name)?;
        let target = self.path.join(name);
        if let Some(parent) = target.parent() {
            create_dir(parent).await?;
        }

        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => WorkspaceError::FileExists {
                    path: target.display().to_string(),
                }
                .into(),
                _ => WorkspaceError::CreateFileFailed {
                    path: target.display().to_string(),
                    message: e.to_string(),
                }
                .into(),
            })
    }

    /// Path a file with this name would have. Pure computation, no I/O.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Handle over a nested directory without creating it
    ///
    /// # Errors
    ///
    /// Fails with `WorkspaceError::InvalidName` for a blank or escaping name.
    pub fn subdirectory(&self, name: &str) -> Result<Subdirectory, Error> {
        validate_name("directory", name)?;
        Ok(Subdirectory::new(self.path.join(name)))
    }
}

/// Names are relative paths that stay below the directory: blank names,
/// absolute paths and `..` components are rejected.
pub(crate) fn validate_name(what: &'static str, name: &str) -> Result<(), Error> {
    let escapes = Path::new(name).components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if name.trim().is_empty() || escapes {
        return Err(WorkspaceError::InvalidName {
            what,
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}

pub(crate) async fn create_dir(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| {
            WorkspaceError::CreateDirFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            }
            .into()
        })
}
