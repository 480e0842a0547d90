//! Build orchestration over an ephemeral workspace

use crate::process::{OutputSink, PhaseContext};
use futures::future::join_all;
use sandbuild_config::constants::{
    ADDITIONAL_SOURCES_VAR, BUILD_VERB, REPORT_FORMAT_SUFFIX, RESTORE_ARGS,
};
use sandbuild_config::{Config, ToolchainConfig};
use sandbuild_descriptor::DescriptorBuilder;
use sandbuild_diagnostics::{DiagnosticReport, OutputParser};
use sandbuild_errors::{BuildError, Error};
use sandbuild_events::{AppEvent, BuildEvent, BuildPhase, EventEmitter, EventSender};
use sandbuild_pack::LocalPackageBuilder;
use sandbuild_workspace::Workspace;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Registers descriptors, drives the toolchain and collects diagnostics.
///
/// One orchestrator runs one build at a time; concurrent builds need
/// separate instances.
#[derive(Debug)]
pub struct BuildOrchestrator {
    toolchain: ToolchainConfig,
    workspace: Workspace,
    builders: Vec<Arc<dyn DescriptorBuilder>>,
    environment: BTreeMap<String, Option<String>>,
    captured: Arc<Mutex<Vec<String>>>,
    packager: Option<LocalPackageBuilder>,
    events: Option<EventSender>,
}

impl BuildOrchestrator {
    /// Allocate a workspace under the configured root and seed the
    /// environment from `config`. No I/O happens here.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            toolchain: config.toolchain.clone(),
            workspace: Workspace::new_in(config.workspace_root()),
            builders: Vec::new(),
            environment: config.environment.variables.clone(),
            captured: Arc::new(Mutex::new(Vec::new())),
            packager: None,
            events: None,
        }
    }

    /// Attach an event sender, shared with the workspace
    #[must_use]
    pub fn with_events(self, events: EventSender) -> Self {
        Self {
            workspace: self.workspace.with_events(events.clone()),
            events: Some(events),
            ..self
        }
    }

    /// Build local packages for referenced projects before restoring
    #[must_use]
    pub fn with_local_packages(mut self, packager: LocalPackageBuilder) -> Self {
        self.packager = Some(packager);
        self
    }

    /// The workspace descriptors should be placed in
    #[must_use]
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    #[must_use]
    pub fn builders(&self) -> &[Arc<dyn DescriptorBuilder>] {
        &self.builders
    }

    /// Environment overlay passed to the toolchain
    #[must_use]
    pub fn environment(&self) -> &BTreeMap<String, Option<String>> {
        &self.environment
    }

    #[must_use]
    pub fn packager(&self) -> Option<&LocalPackageBuilder> {
        self.packager.as_ref()
    }

    /// Register a descriptor builder
    ///
    /// # Errors
    ///
    /// Returns `BuildError::DuplicateBuilder` if this exact instance is
    /// already registered.
    pub fn register(&mut self, builder: Arc<dyn DescriptorBuilder>) -> Result<&mut Self, Error> {
        if self.builders.iter().any(|b| Arc::ptr_eq(b, &builder)) {
            return Err(BuildError::DuplicateBuilder {
                path: builder.path().display().to_string(),
            }
            .into());
        }
        self.builders.push(builder);
        Ok(self)
    }

    /// Set or override a toolchain environment variable. `None` exports the
    /// variable with an empty value.
    pub fn add_environment_variable(
        &mut self,
        name: impl Into<String>,
        value: Option<String>,
    ) -> &mut Self {
        self.environment.insert(name.into(), value);
        self
    }

    /// Every line the toolchain printed so far, both phases and streams
    #[must_use]
    pub fn captured_output(&self) -> Vec<String> {
        self.captured
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Path the toolchain is asked to write its report to
    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.workspace.file_path(&self.toolchain.report_file)
    }

    /// Run restore and build, then return the enriched diagnostic report.
    ///
    /// Toolchain exit codes are logged but never fail the build; inspect
    /// the report instead.
    ///
    /// # Errors
    ///
    /// Fails before any I/O with `BuildError::NoBuilders` or
    /// `BuildError::NoProjectDescriptor`. Afterwards, descriptor, packaging
    /// and spawn failures propagate, as do `BuildError::ReportMissing` and
    /// `BuildError::ReportParse` when the report cannot be read.
    pub async fn build(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<DiagnosticReport, Error> {
        if self.builders.is_empty() {
            return Err(BuildError::NoBuilders.into());
        }
        if !self.builders.iter().any(|b| b.as_project().is_some()) {
            return Err(BuildError::NoProjectDescriptor.into());
        }
        let parser = OutputParser::new(self.toolchain.diagnostic_prefixes.as_slice())?;

        self.workspace.create().await?;
        let mut env = self.environment.clone();
        env.entry(self.toolchain.report_property.clone())
            .or_insert_with(|| {
                Some(format!(
                    "{}{REPORT_FORMAT_SUFFIX}",
                    self.report_path().display()
                ))
            });

        if let Some(packager) = &self.packager {
            let lookup: Vec<PathBuf> = self
                .builders
                .iter()
                .filter_map(|b| b.as_project())
                .flat_map(sandbuild_descriptor::ProjectDescriptor::reference_lookup_paths)
                .collect();
            if !lookup.is_empty() {
                packager.add_sources(&lookup);
                packager.create(cancel).await?;
                env.entry(ADDITIONAL_SOURCES_VAR.to_string())
                    .or_insert_with(|| Some(packager.output_dir().display().to_string()));
            }
        }

        self.emit(AppEvent::Build(BuildEvent::Started {
            workspace: self.workspace.path().to_path_buf(),
            descriptors: self.builders.len(),
        }));
        self.materialize(cancel).await?;

        let sink = OutputSink {
            captured: Arc::clone(&self.captured),
            events: self.events.clone(),
        };
        let phases = PhaseContext {
            program: &self.toolchain.program,
            working_dir: self.workspace.path(),
            env: &env,
            sink: &sink,
        };
        let restore_args: Vec<String> = RESTORE_ARGS.iter().map(ToString::to_string).collect();
        phases.run(BuildPhase::Restore, &restore_args, cancel).await?;

        let mut build_args = vec![BUILD_VERB.to_string()];
        build_args.extend(args.iter().cloned());
        phases.run(BuildPhase::Build, &build_args, cancel).await?;

        let mut report = DiagnosticReport::load(&self.report_path()).await?;
        let added = report.enrich(&parser, self.captured_output());
        self.emit(AppEvent::Build(BuildEvent::Enriched { added }));

        if report.has_errors_or_warnings() {
            self.emit(AppEvent::Build(BuildEvent::DiagnosticsReported {
                errors: report.errors().count(),
                warnings: report.warnings().count(),
                details: report.to_string(),
            }));
        }
        Ok(report)
    }

    /// Dispose registered builders in parallel, then the packager and the
    /// workspace. Never fails.
    pub async fn dispose(&self) {
        join_all(self.builders.iter().map(|b| b.dispose())).await;
        if let Some(packager) = &self.packager {
            packager.dispose().await;
        }
        self.workspace.dispose().await;
    }

    /// Write every descriptor concurrently; the first failure is returned
    /// once all writes have settled.
    async fn materialize(&self, cancel: &CancellationToken) -> Result<(), Error> {
        let writes = join_all(self.builders.iter().map(|b| b.create()));
        let results = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            results = writes => results,
        };
        results.into_iter().collect()
    }
}

impl EventEmitter for BuildOrchestrator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}
