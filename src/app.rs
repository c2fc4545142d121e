//! The main application logic, decoupled from the entry point.

use crate::{
    commands::SessionHandle,
    config::Config,
    core::{Clock, RecordStore, Sampler, SessionObserver},
    internal_metrics::{logging_recorder::LoggingRecorder, Metrics},
    outputs::ConsoleDisplay,
    sampler::SystemSampler,
    session::{IntervalTicker, RecordingInterval, SessionController, Ticker},
    storage::SqliteStore,
    task_manager::TaskManager,
};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

const COMMAND_QUEUE_CAPACITY: usize = 16;

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
    session: SessionHandle,
    shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Returns a handle for sending start/stop/status commands to the controller.
    pub fn session(&self) -> SessionHandle {
        self.session.clone()
    }

    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.task_manager.get_shutdown_rx()
    }

    /// Signals shutdown and waits for every task to finish.
    ///
    /// The controller stops recording and closes the record store on its way out.
    pub async fn shutdown(self, timeout: Duration) -> Result<()> {
        info!("Shutting down...");
        // Receivers may already be gone if every task has exited.
        let _ = self.shutdown_tx.send(true);
        self.task_manager.shutdown(timeout).await
    }
}

/// Builder for the main application.
///
/// Every collaborator of the session controller can be overridden, which is
/// how the integration tests swap in fakes.
pub struct AppBuilder {
    config: Config,
    sampler_override: Option<Box<dyn Sampler>>,
    store_override: Option<Box<dyn RecordStore>>,
    observer_override: Option<Arc<dyn SessionObserver>>,
    clock_override: Option<Box<dyn Clock>>,
    ticker_override: Option<Box<dyn Ticker>>,
    display_ticker_override: Option<Box<dyn Ticker>>,
    metrics_override: Option<Metrics>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sampler_override: None,
            store_override: None,
            observer_override: None,
            clock_override: None,
            ticker_override: None,
            display_ticker_override: None,
            metrics_override: None,
        }
    }

    /// Overrides the resource sampler.
    pub fn sampler_override(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler_override = Some(sampler);
        self
    }

    /// Overrides the record store. No database file is opened.
    pub fn store_override(mut self, store: Box<dyn RecordStore>) -> Self {
        self.store_override = Some(store);
        self
    }

    /// Overrides the display; defaults to a console display on stdout.
    pub fn observer_override(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer_override = Some(observer);
        self
    }

    pub fn clock_override(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock_override = Some(clock);
        self
    }

    /// Overrides the ticker pacing recording ticks.
    pub fn ticker_override(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker_override = Some(ticker);
        self
    }

    /// Overrides the ticker pacing display-only refreshes.
    pub fn display_ticker_override(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.display_ticker_override = Some(ticker);
        self
    }

    /// Overrides the metrics handle; no metrics recorder is installed.
    pub fn metrics_override(mut self, metrics: Metrics) -> Self {
        self.metrics_override = Some(metrics);
        self
    }

    /// Builds all components, spawns the controller and returns a running `App`.
    #[instrument(skip_all)]
    pub async fn build(self) -> Result<App> {
        let config = self.config;
        config.validate()?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task_manager = TaskManager::new(shutdown_rx);

        // =========================================================================
        // 1. Initialize Metrics
        // =========================================================================
        let metrics = match self.metrics_override {
            Some(metrics) => metrics,
            None => {
                if config.metrics.log_metrics {
                    install_logging_recorder(&config, &task_manager);
                }
                Metrics::new()
            }
        };

        // =========================================================================
        // 2. Collaborators
        // =========================================================================
        let default_interval = RecordingInterval::from_secs(config.recording.interval_seconds)?;
        let sampler: Box<dyn Sampler> = match self.sampler_override {
            Some(sampler) => sampler,
            None => Box::new(SystemSampler::new(config.sampler.disk_mount_point.clone())),
        };
        let store: Box<dyn RecordStore> = match self.store_override {
            Some(store) => store,
            None => Box::new(SqliteStore::open(&config.storage.db_path).with_context(|| {
                format!(
                    "failed to open record store at {}",
                    config.storage.db_path.display()
                )
            })?),
        };
        let observer: Arc<dyn SessionObserver> = match self.observer_override {
            Some(observer) => observer,
            None => Arc::new(ConsoleDisplay::new(config.display.format)),
        };

        // =========================================================================
        // 3. Session Controller
        // =========================================================================
        let mut controller = SessionController::new(sampler, store, observer, default_interval)
            .with_metrics(metrics);
        if let Some(clock) = self.clock_override {
            controller = controller.with_clock(clock);
        }
        if let Some(ticker) = self.ticker_override {
            controller = controller.with_ticker(ticker);
        }
        if config.display.refresh_interval_seconds > 0 {
            let display_ticker: Box<dyn Ticker> = match self.display_ticker_override {
                Some(ticker) => ticker,
                None => Box::new(IntervalTicker::new()),
            };
            controller = controller.with_display_refresh(
                Duration::from_secs(config.display.refresh_interval_seconds),
                display_ticker,
            );
        }

        let (session, commands_rx) = SessionHandle::channel(COMMAND_QUEUE_CAPACITY);
        task_manager.spawn(
            "SessionController",
            controller.run(commands_rx, task_manager.get_shutdown_rx()),
        );

        if config.recording.autostart {
            let interval = session.start(None).await?;
            info!(%interval, "Recording started automatically");
        }

        Ok(App {
            task_manager,
            session,
            shutdown_tx,
        })
    }
}

fn install_logging_recorder(config: &Config, task_manager: &TaskManager) {
    let (recorder, handle) = LoggingRecorder::new(
        Duration::from_secs(config.metrics.log_aggregation_seconds),
        task_manager.get_shutdown_rx(),
    );
    match metrics::set_global_recorder(recorder) {
        Ok(()) => {
            info!(
                "Logging recorder enabled. Metrics will be printed every {} seconds.",
                config.metrics.log_aggregation_seconds
            );
            task_manager.spawn("MetricsLogger", async move {
                let _ = handle.await;
            });
        }
        Err(e) => {
            warn!("Failed to install logging recorder: {}", e);
            handle.abort();
        }
    }
}
