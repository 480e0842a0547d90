#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Ephemeral build workspaces
//!
//! A [`Workspace`] is an isolated directory whose path is fixed at
//! construction (a random token under a parent directory) but which is only
//! created on first use. Disposal removes the whole subtree on a best-effort
//! basis: cleanup problems are logged and never surface as errors.

mod cleanup;
mod directory;

pub use directory::Subdirectory;

use sandbuild_errors::Error;
use sandbuild_events::{AppEvent, EventEmitter, EventSender, WorkspaceEvent};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::fs::File;
use uuid::Uuid;

/// An isolated, disposable directory subtree
#[derive(Debug)]
pub struct Workspace {
    root: Subdirectory,
    created: AtomicBool,
    disposed: AtomicBool,
    events: Option<EventSender>,
}

impl Workspace {
    /// Allocate a workspace path under the system temp directory
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(std::env::temp_dir())
    }

    /// Allocate a workspace path under `parent`. Nothing is created yet.
    #[must_use]
    pub fn new_in(parent: impl AsRef<Path>) -> Self {
        let token = Uuid::new_v4().simple().to_string();
        let path = parent.as_ref().join(format!("sandbuild-{token}"));
        let path = std::path::absolute(&path).unwrap_or(path);
        Self {
            root: Subdirectory::new(path),
            created: AtomicBool::new(false),
            disposed: AtomicBool::new(false),
            events: None,
        }
    }

    /// Attach an event sender
    #[must_use]
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = Some(events);
        self
    }

    /// Absolute path of the workspace root
    #[must_use]
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    /// Handle over the workspace root, for code that works on any directory
    #[must_use]
    pub fn root(&self) -> &Subdirectory {
        &self.root
    }

    /// Materialize the root directory. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub async fn create(&self) -> Result<(), Error> {
        self.root.create().await?;
        if !self.created.swap(true, Ordering::AcqRel) {
            self.emit(AppEvent::Workspace(WorkspaceEvent::Created {
                path: self.path().to_path_buf(),
            }));
        }
        Ok(())
    }

    /// Create a directory directly under the root
    ///
    /// # Errors
    ///
    /// See [`Subdirectory::create_subdirectory`].
    pub async fn create_subdirectory(&self, name: &str) -> Result<Subdirectory, Error> {
        self.root.create_subdirectory(name).await
    }

    /// Create a new file under the root, never overwriting
    ///
    /// # Errors
    ///
    /// See [`Subdirectory::create_file`].
    pub async fn create_file(&self, name: &str) -> Result<File, Error> {
        self.root.create_file(name).await
    }

    /// Path of a file under the root. No I/O.
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.root.file_path(name)
    }

    /// Whether [`Workspace::dispose`] already ran
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Recursively delete the workspace. Safe to call more than once; every
    /// failure along the way is swallowed.
    pub async fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        cleanup::remove_tree(self.path().to_path_buf(), self.events.clone()).await;
        self.emit(AppEvent::Workspace(WorkspaceEvent::Disposed {
            path: self.path().to_path_buf(),
        }));
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl EventEmitter for Workspace {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Fallback for callers that never reached dispose()
        if !*self.disposed.get_mut() {
            let _ = std::fs::remove_dir_all(self.root.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_absolute_and_lazy() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path());
        assert!(ws.path().is_absolute());
        assert!(ws.path().starts_with(parent.path()));
        assert!(!ws.path().exists());
    }

    #[test]
    fn test_paths_are_unique() {
        let a = Workspace::new();
        let b = Workspace::new();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path());
        ws.create().await.unwrap();
        ws.create().await.unwrap();
        assert!(ws.path().is_dir());
        ws.dispose().await;
        assert!(!ws.path().exists());
    }

    #[tokio::test]
    async fn test_invalid_names_fail_before_io() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path());
        for name in ["", "   ", "\t"] {
            let err = ws.create_file(name).await.unwrap_err();
            assert!(err.is_precondition());
            let err = ws.create_subdirectory(name).await.unwrap_err();
            assert!(err.is_precondition());
        }
        assert!(!ws.path().exists());
    }

    #[test]
    fn test_drop_removes_tree() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::new_in(parent.path());
        std::fs::create_dir_all(ws.path().join("a/b")).unwrap();
        let path = ws.path().to_path_buf();
        drop(ws);
        assert!(!path.exists());
    }
}
