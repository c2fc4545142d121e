//! # Internal Metrics Module
//!
//! Counters and gauges describing the recording session, published through
//! the `metrics` facade.
//!
//! ## Components:
//!
//! - **`Metrics`**: A lightweight, cloneable struct that serves as the public
//!   API for the rest of the application. It provides high-level methods for
//!   updating the predefined metrics.
//!
//! - **`LoggingRecorder`**: (Defined in `logging_recorder.rs`) A recorder that
//!   periodically logs a snapshot of every metric instead of exporting it.
//!
//! Without an installed recorder every update is a no-op, which is what the
//! tests rely on.

use metrics::{Counter, Gauge, Unit};

/// The public API for the metrics system.
#[derive(Clone)]
pub struct Metrics {
    pub samples_taken_total: Counter,
    pub sampler_faults_total: Counter,
    pub records_persisted_total: Counter,
    pub persistence_failures_total: Counter,
    recording_active: Gauge,
    recording_elapsed_seconds: Gauge,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Creates a new `Metrics` instance and registers descriptions for all
    /// supported metrics with the global recorder.
    pub fn new() -> Self {
        metrics::describe_counter!("samples_taken_total", Unit::Count, "Total number of valid samples taken, for display or recording.");
        metrics::describe_counter!("sampler_faults_total", Unit::Count, "Total number of ticks skipped because the sampler failed or returned an out-of-range value.");
        metrics::describe_counter!("records_persisted_total", Unit::Count, "Total number of samples durably appended to the record store.");
        metrics::describe_counter!("persistence_failures_total", Unit::Count, "Total number of samples dropped because the record store rejected the append.");
        metrics::describe_gauge!("recording_active", Unit::Count, "Whether a recording session is active (1) or not (0).");
        metrics::describe_gauge!("recording_elapsed_seconds", Unit::Seconds, "Elapsed time of the current recording session.");

        Self {
            samples_taken_total: metrics::counter!("samples_taken_total"),
            sampler_faults_total: metrics::counter!("sampler_faults_total"),
            records_persisted_total: metrics::counter!("records_persisted_total"),
            persistence_failures_total: metrics::counter!("persistence_failures_total"),
            recording_active: metrics::gauge!("recording_active"),
            recording_elapsed_seconds: metrics::gauge!("recording_elapsed_seconds"),
        }
    }

    pub fn set_recording_active(&self, active: bool) {
        self.recording_active.set(if active { 1.0 } else { 0.0 });
    }

    pub fn set_elapsed_seconds(&self, seconds: u64) {
        self.recording_elapsed_seconds.set(seconds as f64);
    }
}

pub mod logging_recorder;
