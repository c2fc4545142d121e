//! sysrecord - Host Resource Recorder
//!
//! Periodically samples CPU, memory and disk utilization and, on command,
//! records timestamped samples to a SQLite database.

use anyhow::Result;
use clap::Parser;
use std::{sync::Arc, time::Duration};
use sysrecord::{
    app::App,
    cli::Cli,
    config::Config,
    console::{run_console_lines, spawn_stdin_reader, ConsoleExit},
    outputs::ConsoleDisplay,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
const CONSOLE_LINE_BUFFER: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        tracing_subscriber::fmt().with_writer(std::io::stderr).init();
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    // Logs go to stderr so stdout carries only the display.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("sysrecord starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Recording Interval: {}s", config.recording.interval_seconds);
    info!("Autostart: {}", config.recording.autostart);
    if config.display.refresh_interval_seconds > 0 {
        info!(
            "Display Refresh: {}s",
            config.display.refresh_interval_seconds
        );
    } else {
        info!("Display Refresh: Disabled");
    }
    info!("Output Format: {}", config.display.format);
    info!("Database: {}", config.storage.db_path.display());
    info!("Disk Mount Point: {}", config.sampler.disk_mount_point.display());
    info!("Log Metrics: {}", config.metrics.log_metrics);
    info!("-------------------------------------------------------");

    let display = Arc::new(ConsoleDisplay::new(config.display.format));
    let app = App::builder(config)
        .observer_override(display.clone())
        .build()
        .await?;

    let session = app.session();
    let shutdown_rx = app.shutdown_rx();
    display.print_line(sysrecord::commands::CONSOLE_HELP);

    let input = spawn_stdin_reader(CONSOLE_LINE_BUFFER)?;
    let console = run_console_lines(input, &session, &display, shutdown_rx);
    tokio::select! {
        exit = console => {
            if exit == ConsoleExit::InputClosed {
                // Keep running headless (e.g. `--record < /dev/null`) until interrupted.
                info!("No console input; press Ctrl-C to stop.");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received.");
        }
    }

    app.shutdown(SHUTDOWN_TIMEOUT).await?;
    info!("sysrecord stopped.");
    Ok(())
}
