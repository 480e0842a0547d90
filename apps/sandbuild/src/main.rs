//! sandbuild - build throwaway .NET projects and report their diagnostics
//!
//! The CLI assembles a project from the command line, runs it through the
//! build orchestrator in a temporary workspace and prints what the
//! toolchain reported.

mod cli;
mod display;
mod error;
mod logging;

use crate::cli::{parse_package_spec, CheckArgs, Cli, Commands};
use crate::error::CliError;
use clap::Parser;
use sandbuild_builder::{BuildOrchestrator, CancellationToken, DiagnosticReport};
use sandbuild_config::Config;
use sandbuild_descriptor::{ProjectDescriptor, RollForward, SdkPinDescriptor, SourceFile};
use sandbuild_pack::LocalPackageBuilder;
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};

const PROJECT_FILE: &str = "Check.csproj";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.global.json_logs, cli.global.verbose);

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the build reported errors
async fn run(cli: Cli) -> Result<bool, CliError> {
    info!("Starting sandbuild v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling build");
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Check(args) => {
            let report = check(&config, &args, &cancel).await?;
            display::render_report(&report, cli.global.json)?;
            let ok = report.errors().next().is_none();
            Ok(ok)
        }
    }
}

async fn check(
    config: &Config,
    args: &CheckArgs,
    cancel: &CancellationToken,
) -> Result<DiagnosticReport, CliError> {
    let mut orchestrator = BuildOrchestrator::new(config);
    if !args.local_packages.is_empty() {
        orchestrator = orchestrator.with_local_packages(LocalPackageBuilder::new(config));
    }
    assemble(&mut orchestrator, config, args).await?;

    let result = orchestrator.build(&args.build_args, cancel).await;
    orchestrator.dispose().await;
    Ok(result?)
}

/// Register the project, optional SDK pin and every source file
async fn assemble(
    orchestrator: &mut BuildOrchestrator,
    config: &Config,
    args: &CheckArgs,
) -> Result<(), CliError> {
    let root = orchestrator.workspace().root().clone();

    let mut project = ProjectDescriptor::new(&root, PROJECT_FILE)?;
    project
        .set_target_framework(&args.framework)
        .set_output_type(args.output_type.into());
    for spec in &args.packages {
        let (name, version) = parse_package_spec(spec).ok_or_else(|| {
            CliError::InvalidArguments(format!("expected NAME@VERSION, got '{spec}'"))
        })?;
        project.add_package_reference(name, version);
    }
    for path in &args.local_packages {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                CliError::InvalidArguments(format!("no package name in {}", path.display()))
            })?;
        // lookup paths resolve against the workspace, so pin the source to
        // the caller's working directory here
        let source = std::path::absolute(path).map_err(|e| CliError::Io(path.clone(), e))?;
        let item = project.add_package_reference(name, &config.pack.sentinel_version);
        if let Some(reference) = item.reference_mut() {
            reference.source = Some(source);
        }
    }
    orchestrator.register(Arc::new(project))?;

    if let Some(version) = &args.sdk {
        let mut pin = SdkPinDescriptor::new(&root, version.as_str())?;
        if args.allow_prerelease {
            pin = pin.with_allow_prerelease(true);
        }
        if let Some(policy) = &args.roll_forward {
            pin = pin.with_roll_forward(policy.parse::<RollForward>()?);
        }
        orchestrator.register(Arc::new(pin))?;
    }

    for file in &args.files {
        let contents = tokio::fs::read_to_string(file)
            .await
            .map_err(|e| CliError::Io(file.clone(), e))?;
        let name = file
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                CliError::InvalidArguments(format!("not a file name: {}", file.display()))
            })?;
        orchestrator.register(Arc::new(SourceFile::new(&root, name, contents)?))?;
    }
    Ok(())
}
