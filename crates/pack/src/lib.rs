#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Local package builder
//!
//! Packs local project or spec files into installable packages stamped
//! with a sentinel version, so a build under test can consume them from a
//! private package source instead of a feed. The packaging phase runs at
//! most once per builder and never overlaps with another packaging phase
//! sharing the same lock.

mod sources;
mod tool;

use sandbuild_config::{Config, LockScope, PackConfig, ToolMode};
use sandbuild_errors::{Error, PackError};
use sandbuild_events::{AppEvent, EventEmitter, EventSender, PackEvent};
use sandbuild_net::NetClient;
use sandbuild_workspace::Workspace;
use sources::SourceSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex as StdMutex};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

static PROCESS_LOCK: LazyLock<Arc<Mutex<()>>> = LazyLock::new(|| Arc::new(Mutex::new(())));

/// Packs candidate sources into a private output directory
#[derive(Debug)]
pub struct LocalPackageBuilder {
    config: PackConfig,
    output: Workspace,
    tools: Workspace,
    instance_id: Uuid,
    sources: StdMutex<SourceSet>,
    initialized: AtomicBool,
    lock: Arc<Mutex<()>>,
    net: Option<NetClient>,
    events: Option<EventSender>,
}

impl LocalPackageBuilder {
    /// Allocate output and tool workspaces under the configured root.
    /// Nothing touches the disk until [`LocalPackageBuilder::create`].
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let root = config.workspace_root();
        let lock = match config.pack.lock_scope {
            LockScope::Instance => Arc::new(Mutex::new(())),
            LockScope::Process => Arc::clone(&PROCESS_LOCK),
        };
        Self {
            config: config.pack.clone(),
            output: Workspace::new_in(&root),
            tools: Workspace::new_in(&root),
            instance_id: Uuid::new_v4(),
            sources: StdMutex::new(SourceSet::default()),
            initialized: AtomicBool::new(false),
            lock,
            net: None,
            events: None,
        }
    }

    /// Attach an event sender, shared with the owned workspaces
    #[must_use]
    pub fn with_events(self, events: EventSender) -> Self {
        Self {
            output: self.output.with_events(events.clone()),
            tools: self.tools.with_events(events.clone()),
            events: Some(events),
            ..self
        }
    }

    /// Use `client` for tool downloads instead of the shared client
    #[must_use]
    pub fn with_net_client(mut self, client: NetClient) -> Self {
        self.net = Some(client);
        self
    }

    /// Directory the packages are written to; doubles as a package source
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output.path()
    }

    /// Add candidate sources. Blank paths and case-insensitive duplicates
    /// are ignored. Returns how many were new.
    pub fn add_sources<I, P>(&self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut set = self
            .sources
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        paths
            .into_iter()
            .filter(|p| set.insert(p.as_ref()))
            .count()
    }

    /// Snapshot of the candidate sources in insertion order
    #[must_use]
    pub fn sources(&self) -> Vec<PathBuf> {
        self.sources
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .to_vec()
    }

    /// Whether the packaging phase already completed
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Run the packaging phase once.
    ///
    /// Candidates that do not exist on disk are skipped. Later calls return
    /// immediately; a failed phase may be retried.
    ///
    /// # Errors
    ///
    /// Returns `PackError::ToolSpawn` or `PackError::ToolDownload` when the
    /// tool cannot be obtained, `PackError::PackFailed` when it rejects a
    /// source, and `Error::Cancelled` when `cancel` fires.
    pub async fn create(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let _guard = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            guard = self.lock.lock() => guard,
        };
        if self.is_initialized() {
            return Ok(());
        }

        self.output.create().await?;
        let sources = self.sources();
        self.emit(AppEvent::Pack(PackEvent::Started {
            sources: sources.len(),
            output_dir: self.output_dir().to_path_buf(),
        }));

        let tool = self.resolve_tool(cancel).await?;
        self.emit(AppEvent::Pack(PackEvent::ToolResolved { tool: tool.clone() }));

        let mut packed = 0;
        for source in sources {
            if !tokio::fs::try_exists(&source).await.unwrap_or(false) {
                self.emit(AppEvent::Pack(PackEvent::SourceSkipped { source }));
                continue;
            }
            tool::run_pack(
                &tool,
                &source,
                &self.config.sentinel_version,
                self.output_dir(),
                cancel,
            )
            .await?;
            self.emit(AppEvent::Pack(PackEvent::SourcePacked { source }));
            packed += 1;
        }

        self.initialized.store(true, Ordering::Release);
        self.emit(AppEvent::Pack(PackEvent::Completed { packed }));
        Ok(())
    }

    /// Remove the output directory and any downloaded tool. Never fails.
    pub async fn dispose(&self) {
        self.output.dispose().await;
        self.tools.dispose().await;
    }

    /// Path the downloaded tool is cached at for this instance
    #[must_use]
    pub fn cached_tool_path(&self) -> PathBuf {
        self.tools
            .path()
            .join(self.instance_id.simple().to_string())
            .join(&self.config.tool_file_name)
    }

    async fn resolve_tool(&self, cancel: &CancellationToken) -> Result<PathBuf, Error> {
        match self.config.effective_tool_mode() {
            ToolMode::Download => self.download_tool(cancel).await,
            ToolMode::Command | ToolMode::Auto => Ok(PathBuf::from(&self.config.command)),
        }
    }

    async fn download_tool(&self, cancel: &CancellationToken) -> Result<PathBuf, Error> {
        let target = self.cached_tool_path();
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Ok(target);
        }

        let dir = self
            .tools
            .create_subdirectory(&self.instance_id.simple().to_string())
            .await?;
        let client = match &self.net {
            Some(client) => client.clone(),
            None => NetClient::shared()?.clone(),
        };
        client
            .download_to(&self.config.tool_url, &target, cancel)
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => PackError::ToolDownload {
                    message: other.to_string(),
                }
                .into(),
            })?;
        tool::make_executable(&target).await?;

        self.emit_debug(format!(
            "packaging tool cached in {}",
            dir.path().display()
        ));
        Ok(target)
    }
}

impl EventEmitter for LocalPackageBuilder {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}
