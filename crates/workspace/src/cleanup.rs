//! Best-effort recursive teardown

use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use sandbuild_events::{AppEvent, EventEmitter, EventSender, WorkspaceEvent};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Remove `path` and everything below it.
///
/// Child directories are removed concurrently, one task each; a directory is
/// only removed after all of its children have been handled. Failures are
/// reported as events and otherwise ignored, so this never fails.
pub(crate) fn remove_tree(path: PathBuf, events: Option<EventSender>) -> BoxFuture<'static, ()> {
    async move {
        let children = match child_directories(&path).await {
            Ok(children) => children,
            Err(e) if e.kind() == ErrorKind::NotFound => return,
            Err(e) => {
                report_failure(&events, &path, &e);
                Vec::new()
            }
        };

        let tasks = children
            .into_iter()
            .map(|child| tokio::spawn(remove_tree(child, events.clone())));
        // Panics inside a child task are swallowed with everything else
        let _ = join_all(tasks).await;

        if let Err(e) = fs::remove_dir_all(&path).await {
            if e.kind() != ErrorKind::NotFound {
                report_failure(&events, &path, &e);
            }
        }
    }
    .boxed()
}

async fn child_directories(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(path).await?;
    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        // DirEntry::file_type does not follow symlinks
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

fn report_failure(events: &impl EventEmitter, path: &Path, error: &std::io::Error) {
    events.emit(AppEvent::Workspace(WorkspaceEvent::CleanupFailed {
        path: path.to_path_buf(),
        error: error.to_string(),
    }));
}
