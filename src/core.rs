//! Core domain types and service traits for sysrecord
//!
//! This module defines the fundamental data structures and the trait contracts
//! the session controller uses to talk to its collaborators: the resource
//! sampler, the persistence port and the display.

use crate::session::SessionFault;
use crate::sampler::SamplerError;
use crate::storage::StoreError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reading of host resource utilization, in percent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Sample {
    /// Processor utilization across all cores
    pub cpu_percent: f64,
    /// Physical memory utilization
    pub ram_percent: f64,
    /// Storage utilization of the monitored volume
    pub disk_percent: f64,
}

impl Sample {
    pub fn new(cpu_percent: f64, ram_percent: f64, disk_percent: f64) -> Self {
        Self {
            cpu_percent,
            ram_percent,
            disk_percent,
        }
    }

    /// Checks that every field is a finite percentage in `[0, 100]`.
    ///
    /// Values are never clamped; a reading outside the range is a sampler
    /// fault and the caller is expected to discard it.
    pub fn validate(&self) -> Result<(), SamplerError> {
        for (field, value) in [
            ("cpu", self.cpu_percent),
            ("ram", self.ram_percent),
            ("disk", self.disk_percent),
        ] {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(SamplerError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

/// Whether samples are currently being persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Recording,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Recording => write!(f, "recording"),
        }
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Takes a reading of current processor, memory and storage utilization.
pub trait Sampler: Send {
    /// Samples the host synchronously.
    ///
    /// # Returns
    /// * `Ok(Sample)` with the current readings
    /// * `Err` on device or permission errors
    fn sample(&mut self) -> Result<Sample, SamplerError>;
}

/// Append-only durable storage for recorded samples (the persistence port).
pub trait RecordStore: Send {
    /// Appends one record. Must be durable before returning `Ok`.
    ///
    /// # Arguments
    /// * `timestamp` - Wall-clock time of the sample, `DD-MM-YYYY HH:MM:SS`
    /// * `sample` - The readings to persist
    fn append(&mut self, timestamp: &str, sample: &Sample) -> Result<(), StoreError>;

    /// Flushes and releases the underlying connection.
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Receives the events the controller publishes for presentation.
///
/// All callbacks are invoked from the controller's task, in order.
pub trait SessionObserver: Send + Sync {
    /// Fired on every tick that produced a valid sample.
    fn on_sample_updated(&self, sample: &Sample);

    /// Fired on every recording tick, and with `0` whenever a session starts or stops.
    fn on_elapsed_updated(&self, seconds: u64);

    /// Fired on every start and stop transition.
    fn on_state_changed(&self, _state: SessionState) {}

    /// Fired once for each tick that could not sample or persist.
    fn on_fault(&self, _fault: &SessionFault) {}
}

/// Source of wall-clock time for timestamps and elapsed-time accounting.
pub trait Clock: Send {
    fn now(&self) -> DateTime<Local>;
}

/// The local system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// An observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl SessionObserver for NullObserver {
    fn on_sample_updated(&self, _sample: &Sample) {}

    fn on_elapsed_updated(&self, _seconds: u64) {}
}

