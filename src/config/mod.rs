//! Configuration management for clusterm
//!
//! This module handles loading, parsing, and managing configuration from:
//! - Configuration files (TOML format)
//! - Command-line arguments (applied by the `cli` module)
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::grammar::ToolNames;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Names of the external tools
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Command history configuration
    #[serde(default)]
    pub history: HistoryConfig,

    /// Live resource cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Completion configuration
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External tool names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Cluster-control CLI
    #[serde(default = "default_cluster_tool")]
    pub cluster: String,

    /// Package/release CLI
    #[serde(default = "default_release_tool")]
    pub release: String,
}

/// Command history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to the history file
    #[serde(default = "default_history_file")]
    pub file_path: PathBuf,

    /// Enable history persistence
    #[serde(default = "default_persist_history")]
    pub persist: bool,

    /// Cluster selected at startup
    #[serde(default = "default_context_component")]
    pub cluster: String,

    /// Namespace selected at startup
    #[serde(default = "default_context_component")]
    pub namespace: String,
}

/// Live resource cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Seconds before cached resource names are considered stale
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    /// Seconds to wait before retrying after a failed refresh
    #[serde(default = "default_retry_after_failure")]
    pub retry_after_failure_secs: u64,

    /// Timeout for each external tool invocation, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Query the cluster for live resource names
    #[serde(default = "default_live_fetch")]
    pub live_fetch: bool,
}

/// Completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Recent commands appended to the suggestions for an empty line
    #[serde(default = "default_recent_suggestions")]
    pub recent_suggestions: usize,

    /// Maximum suggestions for an empty line
    #[serde(default = "default_max_common")]
    pub max_common: usize,

    /// Show validation problems as inline hints
    #[serde(default = "default_validation_hints")]
    pub validation_hints: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Path to log file (None for stderr)
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_cluster_tool() -> String {
    "kubectl".to_string()
}

fn default_release_tool() -> String {
    "helm".to_string()
}

fn default_history_file() -> PathBuf {
    Config::default_dir().join("command_history.json")
}

fn default_persist_history() -> bool {
    true
}

fn default_context_component() -> String {
    "default".to_string()
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_retry_after_failure() -> u64 {
    10
}

fn default_fetch_timeout() -> u64 {
    10
}

fn default_live_fetch() -> bool {
    true
}

fn default_recent_suggestions() -> usize {
    5
}

fn default_max_common() -> usize {
    10
}

fn default_validation_hints() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            cluster: default_cluster_tool(),
            release: default_release_tool(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            file_path: default_history_file(),
            persist: default_persist_history(),
            cluster: default_context_component(),
            namespace: default_context_component(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            retry_after_failure_secs: default_retry_after_failure(),
            fetch_timeout_secs: default_fetch_timeout(),
            live_fetch: default_live_fetch(),
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            recent_suggestions: default_recent_suggestions(),
            max_common: default_max_common(),
            validation_hints: default_validation_hints(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding clusterm's files (`~/.clusterm`)
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".clusterm")
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        Self::default_dir().join("config.toml")
    }

    /// Load configuration from a file
    ///
    /// A missing file yields the default configuration. When `path` is
    /// `None` the default location is used.
    ///
    /// # Arguments
    /// * `path` - Optional path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Serialize the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        if self.tools.cluster.trim().is_empty() || self.tools.cluster.contains(char::is_whitespace)
        {
            return Err(invalid("tools.cluster", &self.tools.cluster));
        }
        if self.tools.release.trim().is_empty() || self.tools.release.contains(char::is_whitespace)
        {
            return Err(invalid("tools.release", &self.tools.release));
        }
        if self.tools.cluster == self.tools.release {
            return Err(ConfigError::Generic(
                "tools.cluster and tools.release must differ".to_string(),
            )
            .into());
        }
        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "0"));
        }
        if self.cache.fetch_timeout_secs == 0 {
            return Err(invalid("cache.fetch_timeout_secs", "0"));
        }
        if self.cache.retry_after_failure_secs > self.cache.ttl_secs {
            return Err(invalid(
                "cache.retry_after_failure_secs",
                &self.cache.retry_after_failure_secs.to_string(),
            ));
        }
        Ok(())
    }

    /// Tool names used by the grammar and the validator
    pub fn tool_names(&self) -> ToolNames {
        ToolNames::new(&self.tools.cluster, &self.tools.release)
    }
}

impl CacheConfig {
    /// Cache time-to-live as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Delay before a failed refresh may be retried
    pub fn retry_after_failure(&self) -> Duration {
        Duration::from_secs(self.retry_after_failure_secs)
    }

    /// Per-invocation timeout for external tools
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn invalid(field: &str, value: &str) -> crate::error::ClustermError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}
