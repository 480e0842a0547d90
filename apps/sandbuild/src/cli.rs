//! Command line interface definition

use clap::{Parser, Subcommand, ValueEnum};
use sandbuild_descriptor::OutputType;
use std::path::PathBuf;

/// sandbuild - build throwaway .NET projects and report their diagnostics
#[derive(Parser)]
#[command(name = "sandbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build throwaway .NET projects and report their diagnostics")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Log at debug level, including captured toolchain output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH", env = "SANDBUILD_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compile source files in a throwaway project and print diagnostics
    Check(CheckArgs),
}

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Source files to compile
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Target framework moniker
    #[arg(long, default_value = "net8.0", value_name = "TFM")]
    pub framework: String,

    /// Kind of output the project produces
    #[arg(long, value_enum, default_value_t = OutputKind::Exe)]
    pub output_type: OutputKind,

    /// Pin the SDK version through a global.json
    #[arg(long, value_name = "VERSION")]
    pub sdk: Option<String>,

    /// Allow prerelease SDKs when resolving the pin
    #[arg(long, requires = "sdk")]
    pub allow_prerelease: bool,

    /// SDK roll-forward policy (e.g. latestMajor)
    #[arg(long, requires = "sdk", value_name = "POLICY")]
    pub roll_forward: Option<String>,

    /// Package reference as NAME@VERSION
    #[arg(long = "package", value_name = "NAME@VERSION")]
    pub packages: Vec<String>,

    /// Local project or .nuspec to pack and reference before restore
    #[arg(long = "local-package", value_name = "PATH")]
    pub local_packages: Vec<PathBuf>,

    /// Extra arguments passed to the build phase
    #[arg(last = true, value_name = "BUILD_ARGS")]
    pub build_args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputKind {
    Exe,
    Library,
    Winexe,
}

impl From<OutputKind> for OutputType {
    fn from(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Exe => OutputType::Exe,
            OutputKind::Library => OutputType::Library,
            OutputKind::Winexe => OutputType::WinExe,
        }
    }
}

/// Split `NAME@VERSION`; both halves must be non-blank
pub fn parse_package_spec(spec: &str) -> Option<(&str, &str)> {
    let (name, version) = spec.rsplit_once('@')?;
    let (name, version) = (name.trim(), version.trim());
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
}
