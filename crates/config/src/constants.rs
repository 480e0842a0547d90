//! Fixed names shared between the orchestrator, the packager and the CLI
//!
//! These are deliberately not exposed via TOML configuration; they describe
//! the toolchain's own contract rather than user preference.

/// Arguments of the dependency-resolution phase
pub const RESTORE_ARGS: [&str; 3] = ["restore", "-v", "quiet"];

/// First argument of the build phase; caller arguments follow
pub const BUILD_VERB: &str = "build";

/// Report format version requested from the toolchain
pub const REPORT_FORMAT_SUFFIX: &str = ",version=2.1";

/// Variable through which extra package sources reach the restore phase
pub const ADDITIONAL_SOURCES_VAR: &str = "RestoreAdditionalProjectSources";

/// Default project SDK attribute
pub const DEFAULT_PROJECT_SDK: &str = "Microsoft.NET.Sdk";

/// SDK-pin descriptor file name
pub const SDK_PIN_FILE: &str = "global.json";

/// Pinned packaging tool used where no local CLI is expected
pub const PACK_TOOL_URL: &str = "https://dist.nuget.org/win-x86-commandline/v6.11.1/nuget.exe";
