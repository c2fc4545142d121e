//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. These arguments are parsed at startup and then merged with
//! the configuration from the `sysrecord.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Samples host CPU, memory and disk utilization and records it to SQLite on demand.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Default recording interval in seconds.
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Path to the SQLite database file.
    #[arg(long, value_name = "FILE")]
    pub db_path: Option<PathBuf>,

    /// Start recording immediately.
    #[arg(long)]
    pub record: bool,

    /// Display refresh period in seconds (0 disables display-only refreshes).
    #[arg(long, value_name = "SECONDS")]
    pub refresh_interval: Option<u64>,

    /// Print events as JSON lines.
    #[arg(long)]
    pub json: bool,

    /// The logging level (e.g. "debug", "info").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut recording = Dict::new();
        let mut display = Dict::new();
        let mut storage = Dict::new();
        let mut root = Dict::new();

        if let Some(interval) = self.interval {
            recording.insert("interval_seconds".into(), Value::from(interval));
        }
        // Flags only override when present, so `--record` absent keeps the file's value.
        if self.record {
            recording.insert("autostart".into(), Value::from(true));
        }
        if let Some(refresh) = self.refresh_interval {
            display.insert("refresh_interval_seconds".into(), Value::from(refresh));
        }
        if self.json {
            display.insert("format".into(), Value::from("Json"));
        }
        if let Some(path) = &self.db_path {
            storage.insert(
                "db_path".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }
        if let Some(level) = &self.log_level {
            root.insert("log_level".into(), Value::from(level.clone()));
        }

        for (key, dict) in [
            ("recording", recording),
            ("display", display),
            ("storage", storage),
        ] {
            if !dict.is_empty() {
                root.insert(key.into(), Value::from(dict));
            }
        }

        let mut map = Map::new();
        map.insert(Profile::Default, root);
        Ok(map)
    }
}
