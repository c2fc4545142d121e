//! The recording session controller.
//!
//! `SessionController` owns the [`RecordingSession`] and arbitrates between
//! display-only ticks and recording ticks. It is not internally synchronized:
//! [`SessionController::run`] drives it from a single task so that commands and
//! ticks never interleave.

use super::{
    ticker::{IntervalTicker, Ticker},
    RecordingInterval, RecordingSession, SessionError, SessionFault, TIMESTAMP_FORMAT,
};
use crate::commands::{SessionCommand, SessionStatus};
use crate::core::{Clock, RecordStore, Sample, Sampler, SessionObserver, SessionState, SystemClock};
use crate::internal_metrics::Metrics;
use crate::storage::StoreError;
use chrono::{DateTime, Local};
use std::{sync::Arc, time::Duration};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// What a single tick ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The sample was published; nothing was persisted.
    Displayed,
    /// The sample was published and appended to the store.
    Recorded,
    /// The sampler failed; nothing was published or persisted.
    SamplerFault,
    /// The sample was published but the store rejected it.
    PersistenceFailed,
}

pub struct SessionController {
    session: RecordingSession,
    sampler: Box<dyn Sampler>,
    store: Option<Box<dyn RecordStore>>,
    observer: Arc<dyn SessionObserver>,
    clock: Box<dyn Clock>,
    ticker: Box<dyn Ticker>,
    display_ticker: Box<dyn Ticker>,
    display_refresh: Option<Duration>,
    default_interval: RecordingInterval,
    metrics: Metrics,
}

impl SessionController {
    /// Creates an idle controller using the system clock and tokio timers.
    pub fn new(
        sampler: Box<dyn Sampler>,
        store: Box<dyn RecordStore>,
        observer: Arc<dyn SessionObserver>,
        default_interval: RecordingInterval,
    ) -> Self {
        Self {
            session: RecordingSession::default(),
            sampler,
            store: Some(store),
            observer,
            clock: Box::new(SystemClock),
            ticker: Box::new(IntervalTicker::new()),
            display_ticker: Box::new(IntervalTicker::new()),
            display_refresh: None,
            default_interval,
            metrics: Metrics::new(),
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the ticker that paces recording ticks.
    pub fn with_ticker(mut self, ticker: Box<dyn Ticker>) -> Self {
        self.ticker = ticker;
        self
    }

    /// Enables display-only refreshes at `period` while the controller runs.
    pub fn with_display_refresh(mut self, period: Duration, ticker: Box<dyn Ticker>) -> Self {
        self.display_refresh = Some(period);
        self.display_ticker = ticker;
        self
    }

    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.session.elapsed_seconds()
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.session.started_at()
    }

    /// The interval of the active session, `None` while idle.
    pub fn interval(&self) -> Option<RecordingInterval> {
        self.session.interval()
    }

    /// The period the recording ticker is currently running at.
    pub fn ticker_period(&self) -> Option<Duration> {
        self.ticker.period()
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.session.state(),
            elapsed_seconds: self.session.elapsed_seconds(),
            interval_seconds: self.session.interval().map(|i| i.as_secs()),
            started_at: self.session.started_at(),
        }
    }

    /// Starts recording from raw interval input.
    ///
    /// On invalid input the session is left untouched and the ticker is not
    /// (re)started.
    pub fn start(&mut self, interval: &str) -> Result<RecordingInterval, SessionError> {
        let interval: RecordingInterval = interval.parse()?;
        self.start_with(interval);
        Ok(interval)
    }

    /// Starts recording at `interval`.
    ///
    /// Starting while already recording is a restart: the start time and
    /// elapsed time are reset and the ticker is rescheduled at the new interval.
    pub fn start_with(&mut self, interval: RecordingInterval) {
        let restarting = self.session.is_active();
        let now = self.clock.now();
        self.session.begin(now, interval);
        self.ticker.start(interval.as_duration());

        if restarting {
            info!(%interval, "Recording restarted");
        } else {
            info!(%interval, "Recording started");
        }
        self.metrics.set_recording_active(true);
        self.metrics.set_elapsed_seconds(0);
        self.observer.on_state_changed(SessionState::Recording);
        self.observer.on_elapsed_updated(0);
    }

    /// Stops recording. A no-op while idle.
    pub fn stop(&mut self) {
        if !self.session.is_active() {
            debug!("Stop requested while idle, ignoring");
            return;
        }
        self.ticker.stop();
        let elapsed = self.session.elapsed_seconds();
        self.session.end();

        info!(elapsed_seconds = elapsed, "Recording stopped");
        self.metrics.set_recording_active(false);
        self.metrics.set_elapsed_seconds(0);
        self.observer.on_state_changed(SessionState::Idle);
        self.observer.on_elapsed_updated(0);
    }

    /// Handles one tick: sample, publish, and persist while recording.
    ///
    /// Faults are reported to the observer once and never end the session.
    pub fn on_tick(&mut self) -> TickOutcome {
        let Some(sample) = self.take_sample() else {
            return TickOutcome::SamplerFault;
        };
        self.observer.on_sample_updated(&sample);

        if !self.session.is_active() {
            return TickOutcome::Displayed;
        }

        let now = self.clock.now();
        let elapsed = self.session.update_elapsed(now);
        self.metrics.set_elapsed_seconds(elapsed);
        self.observer.on_elapsed_updated(elapsed);

        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        match self.persist(&timestamp, &sample) {
            Ok(()) => {
                debug!(%timestamp, elapsed_seconds = elapsed, "Recorded sample");
                self.metrics.records_persisted_total.increment(1);
                TickOutcome::Recorded
            }
            Err(e) => {
                warn!(%timestamp, "Dropping sample, append failed: {}", e);
                self.metrics.persistence_failures_total.increment(1);
                self.observer.on_fault(&SessionFault::Persistence(e));
                TickOutcome::PersistenceFailed
            }
        }
    }

    /// Samples and publishes without touching elapsed time or the store.
    pub fn refresh_display(&mut self) -> TickOutcome {
        match self.take_sample() {
            Some(sample) => {
                self.observer.on_sample_updated(&sample);
                TickOutcome::Displayed
            }
            None => TickOutcome::SamplerFault,
        }
    }

    /// Stops recording and closes the record store.
    ///
    /// The store is closed at most once; later calls return `Ok(())`.
    pub fn shutdown(&mut self) -> Result<(), SessionError> {
        self.stop();
        self.display_ticker.stop();
        match self.store.take() {
            Some(mut store) => store.close().map_err(SessionError::Shutdown),
            None => Ok(()),
        }
    }

    /// Runs the controller until `shutdown_rx` fires or every command sender is dropped.
    ///
    /// Commands, recording ticks and display ticks are handled one at a time
    /// on this task, in arrival order.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        info!("Session controller started.");
        if let Some(period) = self.display_refresh {
            self.display_ticker.start(period);
        }

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Session controller received shutdown signal.");
                    break;
                }
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        info!("Command channel closed, session controller shutting down.");
                        break;
                    }
                },
                _ = self.ticker.tick() => {
                    self.on_tick();
                }
                _ = self.display_ticker.tick() => {
                    self.refresh_display();
                }
            }
        }

        if let Err(e) = self.shutdown() {
            error!("Session controller shutdown error: {}", e);
        }
        info!("Session controller finished.");
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Start { interval, reply } => {
                let result = match interval {
                    Some(input) => self.start(&input),
                    None => {
                        self.start_with(self.default_interval);
                        Ok(self.default_interval)
                    }
                };
                if let Err(e) = &result {
                    warn!("Rejected start command: {}", e);
                }
                let _ = reply.send(result);
            }
            SessionCommand::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            SessionCommand::Status { reply } => {
                let _ = reply.send(self.status());
            }
        }
    }

    fn take_sample(&mut self) -> Option<Sample> {
        let result = self
            .sampler
            .sample()
            .and_then(|sample| sample.validate().map(|()| sample));
        match result {
            Ok(sample) => {
                self.metrics.samples_taken_total.increment(1);
                Some(sample)
            }
            Err(e) => {
                warn!("Skipping tick, sampler fault: {}", e);
                self.metrics.sampler_faults_total.increment(1);
                self.observer.on_fault(&SessionFault::Sampler(e));
                None
            }
        }
    }

    fn persist(&mut self, timestamp: &str, sample: &Sample) -> Result<(), StoreError> {
        match self.store.as_mut() {
            Some(store) => store.append(timestamp, sample),
            None => Err(StoreError::Closed),
        }
    }
}
