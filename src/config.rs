//! Configuration file parsing
//!
//! Reads derisk-sql.toml configuration files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::protocol::{Metadata, RunConfig};
use crate::rules::AnalyzerId;

/// Config file looked up in the current directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "derisk-sql.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub migrations: MigrationsConfig,

    #[serde(default)]
    pub analyzers: AnalyzersConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub metadata: MetadataConfig,

    /// Key/value config handed to every analyzer.
    #[serde(default)]
    pub rules: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MigrationsConfig {
    /// Directory holding dbmate migration files
    #[serde(default = "default_migrations_dir")]
    pub dir: PathBuf,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_migrations_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzersConfig {
    /// Built-in analyzer ids or paths to analyzer executables, in run order
    #[serde(default = "default_analyzer_names")]
    pub names: Vec<String>,

    /// Run built-in analyzers as child processes of this executable
    #[serde(default)]
    pub isolate: bool,
}

impl Default for AnalyzersConfig {
    fn default() -> Self {
        Self {
            names: default_analyzer_names(),
            isolate: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for JSON report files; empty disables them
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Print a header line per report
    #[serde(default)]
    pub verbose: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            verbose: false,
        }
    }
}

impl OutputConfig {
    pub fn json_dir(&self) -> Option<&Path> {
        if self.dir.as_os_str().is_empty() {
            None
        } else {
            Some(&self.dir)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataConfig {
    /// Migration tool name passed to analyzers
    #[serde(default = "default_metadata_name")]
    pub name: String,

    /// Passed through to analyzers verbatim; never used to connect
    #[serde(default)]
    pub connection_string: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            name: default_metadata_name(),
            connection_string: String::new(),
        }
    }
}

fn default_migrations_dir() -> PathBuf {
    PathBuf::from("migrations")
}

fn default_analyzer_names() -> Vec<String> {
    AnalyzerId::all().map(|id| id.as_str().to_string()).collect()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_metadata_name() -> String {
    "dbmate".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.analyzers.names.is_empty() {
            return Err(ConfigError::Validation(
                "analyzers.names must list at least one analyzer".to_string(),
            ));
        }
        if let Some(blank) = self.analyzers.names.iter().position(|n| n.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "analyzers.names[{}] is empty",
                blank
            )));
        }
        Ok(())
    }

    /// Add or replace a `[rules]` entry.
    pub fn set_rule_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.rules.insert(key.into(), value.into());
    }

    pub fn run_config(&self) -> RunConfig {
        self.rules.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    /// Request metadata for this configuration.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            name: self.metadata.name.clone(),
            connection_string: self.metadata.connection_string.clone(),
            config: self.run_config(),
        }
    }
}

/// Parse a `key=value` override.
pub fn parse_key_value(pair: &str) -> Result<(String, String), ConfigError> {
    match pair.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::Validation(format!(
            "invalid config value '{}'. Expected KEY=VALUE",
            pair
        ))),
    }
}
