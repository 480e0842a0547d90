#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for sandbuild
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/sandbuild/config.toml)
//! - Environment variables
//! - CLI flags (applied by the caller)

pub mod constants;

use sandbuild_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub toolchain: ToolchainConfig,

    #[serde(default)]
    pub environment: EnvironmentConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub pack: PackConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// External toolchain invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default = "default_program")]
    pub program: String,
    /// Structured diagnostic report written into the workspace root
    #[serde(default = "default_report_file")]
    pub report_file: String,
    /// Build property that tells the toolchain where to write the report
    #[serde(default = "default_report_property")]
    pub report_property: String,
    /// Diagnostic-code namespaces recovered from free-text output
    #[serde(default = "default_diagnostic_prefixes")]
    pub diagnostic_prefixes: Vec<String>,
}

/// Environment overlay for toolchain processes.
///
/// A `None` value is still exported, as an empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default = "default_variables")]
    pub variables: BTreeMap<String, Option<String>>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_delay")]
    pub retry_base_delay_ms: u64,
}

/// How the packaging tool is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolMode {
    /// Download on Windows, local command elsewhere
    Auto,
    Command,
    Download,
}

/// Scope of the lock serializing packaging phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockScope {
    Instance,
    Process,
}

/// Local package builder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackConfig {
    #[serde(default = "default_tool_mode")]
    pub tool: ToolMode,
    #[serde(default = "default_pack_command")]
    pub command: String,
    #[serde(default = "default_tool_url")]
    pub tool_url: String,
    #[serde(default = "default_tool_file_name")]
    pub tool_file_name: String,
    /// Version stamped on every local package so it never collides with a published one
    #[serde(default = "default_sentinel_version")]
    pub sentinel_version: String,
    #[serde(default = "default_lock_scope")]
    pub lock_scope: LockScope,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub workspace_root: Option<PathBuf>,
}

// Default implementations

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            report_file: default_report_file(),
            report_property: default_report_property(),
            diagnostic_prefixes: default_diagnostic_prefixes(),
        }
    }
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            variables: default_variables(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            pool_idle_timeout_secs: default_pool_idle_timeout(),
            pool_max_idle_per_host: default_pool_max_idle(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay(),
        }
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            tool: default_tool_mode(),
            command: default_pack_command(),
            tool_url: default_tool_url(),
            tool_file_name: default_tool_file_name(),
            sentinel_version: default_sentinel_version(),
            lock_scope: default_lock_scope(),
        }
    }
}

// Default value functions for serde
fn default_program() -> String {
    "dotnet".to_string()
}

fn default_report_file() -> String {
    "BuildOutput.sarif".to_string()
}

fn default_report_property() -> String {
    "ErrorLog".to_string()
}

fn default_diagnostic_prefixes() -> Vec<String> {
    vec!["NU".to_string(), "NETSDK".to_string()]
}

fn default_variables() -> BTreeMap<String, Option<String>> {
    BTreeMap::from([
        ("CI".to_string(), None),
        ("DOTNET_CLI_TELEMETRY_OPTOUT".to_string(), Some("1".to_string())),
        ("DOTNET_NOLOGO".to_string(), Some("1".to_string())),
        (
            "DOTNET_SKIP_FIRST_TIME_EXPERIENCE".to_string(),
            Some("1".to_string()),
        ),
        ("GITHUB_ACTIONS".to_string(), None),
    ])
}

fn default_timeout() -> u64 {
    100
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_pool_idle_timeout() -> u64 {
    60
}

fn default_pool_max_idle() -> usize {
    8
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_base_delay() -> u64 {
    200
}

fn default_tool_mode() -> ToolMode {
    ToolMode::Auto
}

fn default_pack_command() -> String {
    "nuget".to_string()
}

fn default_tool_url() -> String {
    constants::PACK_TOOL_URL.to_string()
}

fn default_tool_file_name() -> String {
    "nuget.exe".to_string()
}

fn default_sentinel_version() -> String {
    "999.999.999".to_string()
}

fn default_lock_scope() -> LockScope {
    LockScope::Instance
}

impl NetworkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }

    #[must_use]
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl PackConfig {
    /// Resolve `auto` against the current platform
    #[must_use]
    pub fn effective_tool_mode(&self) -> ToolMode {
        match self.tool {
            ToolMode::Auto if cfg!(windows) => ToolMode::Download,
            ToolMode::Auto => ToolMode::Command,
            mode => mode,
        }
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("sandbuild").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let Ok(config_path) = Self::default_path() else {
            return Ok(Self::default());
        };

        if fs::try_exists(&config_path).await.unwrap_or(false) {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // SANDBUILD_TOOLCHAIN
        if let Ok(program) = std::env::var("SANDBUILD_TOOLCHAIN") {
            if program.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "SANDBUILD_TOOLCHAIN".to_string(),
                    value: program,
                }
                .into());
            }
            self.toolchain.program = program;
        }

        // SANDBUILD_WORKSPACE_ROOT
        if let Ok(root) = std::env::var("SANDBUILD_WORKSPACE_ROOT") {
            self.paths.workspace_root = Some(PathBuf::from(root));
        }

        // SANDBUILD_HTTP_MAX_ATTEMPTS
        if let Ok(attempts) = std::env::var("SANDBUILD_HTTP_MAX_ATTEMPTS") {
            self.network.max_attempts = match attempts.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SANDBUILD_HTTP_MAX_ATTEMPTS".to_string(),
                        value: attempts,
                    }
                    .into())
                }
            };
        }

        // SANDBUILD_PACK_LOCK_SCOPE
        if let Ok(scope) = std::env::var("SANDBUILD_PACK_LOCK_SCOPE") {
            self.pack.lock_scope = match scope.as_str() {
                "instance" => LockScope::Instance,
                "process" => LockScope::Process,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "SANDBUILD_PACK_LOCK_SCOPE".to_string(),
                        value: scope,
                    }
                    .into())
                }
            };
        }

        Ok(())
    }

    /// Directory under which workspaces are allocated (with default)
    #[must_use]
    pub fn workspace_root(&self) -> PathBuf {
        self.paths
            .workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}
