//! Configuration management for sysrecord
//!
//! This module defines the main `Config` struct and its sub-structs,
//! responsible for holding all application settings. It uses the `figment`
//! crate to layer compiled defaults, a `sysrecord.toml` file, environment
//! variables and command-line arguments.

use crate::cli::Cli;
use crate::session::MAX_INTERVAL_SECS;
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "sysrecord.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Configuration for recording sessions.
    pub recording: RecordingConfig,
    /// Configuration for the console display.
    pub display: DisplayConfig,
    /// Configuration for the record store.
    pub storage: StorageConfig,
    /// Configuration for the resource sampler.
    pub sampler: SamplerConfig,
    /// Configuration for internal metrics.
    pub metrics: MetricsConfig,
}

/// Configuration for recording sessions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RecordingConfig {
    /// Interval used by `start` when no interval is given, in seconds.
    pub interval_seconds: u64,
    /// Start recording as soon as the application is up.
    pub autostart: bool,
}

/// The format for console output.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    PlainText,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::PlainText => write!(f, "Plain text"),
        }
    }
}

/// Configuration for the console display.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DisplayConfig {
    /// Period of display-only refreshes in seconds. `0` disables them.
    pub refresh_interval_seconds: u64,
    /// The format to use for console output.
    pub format: OutputFormat,
}

/// Configuration for the record store.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
}

/// Configuration for the resource sampler.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Mount point of the volume whose storage usage is reported.
    pub disk_mount_point: PathBuf,
}

/// Configuration for internal metrics.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MetricsConfig {
    /// Log a snapshot of all metrics periodically.
    pub log_metrics: bool,
    /// The interval in seconds between metric snapshots.
    pub log_aggregation_seconds: u64,
}

impl Config {
    /// Loads the application configuration by layering defaults, the TOML
    /// file, `SYSRECORD_` environment variables and CLI arguments.
    ///
    /// # Arguments
    /// * `cli` - Parsed command-line arguments; `cli.config` selects the TOML file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if cli.config.is_some() && !config_path.exists() {
            bail!("configuration file not found: {}", config_path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_path))
            // e.g. SYSRECORD_RECORDING__INTERVAL_SECONDS=5
            .merge(Env::prefixed("SYSRECORD_").split("__"))
            .merge(cli)
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the application cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.recording.interval_seconds == 0 {
            bail!("recording.interval_seconds must be at least 1");
        }
        if self.recording.interval_seconds > MAX_INTERVAL_SECS {
            bail!(
                "recording.interval_seconds must be at most {}",
                MAX_INTERVAL_SECS
            );
        }
        if self.display.refresh_interval_seconds > MAX_INTERVAL_SECS {
            bail!(
                "display.refresh_interval_seconds must be at most {}",
                MAX_INTERVAL_SECS
            );
        }
        if self.metrics.log_metrics && self.metrics.log_aggregation_seconds == 0 {
            bail!("metrics.log_aggregation_seconds must be at least 1");
        }
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            recording: RecordingConfig {
                interval_seconds: 1,
                autostart: false,
            },
            display: DisplayConfig {
                refresh_interval_seconds: 1,
                format: OutputFormat::PlainText,
            },
            storage: StorageConfig {
                db_path: PathBuf::from("app_monitoring_data.db"),
            },
            sampler: SamplerConfig {
                disk_mount_point: PathBuf::from("/"),
            },
            metrics: MetricsConfig {
                log_metrics: false,
                log_aggregation_seconds: 60,
            },
        }
    }
}
