pub mod controller;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod ticker;

use crate::core::SessionState;
use crate::sampler::SamplerError;
use crate::storage::StoreError;
use chrono::{DateTime, Local};
use std::{fmt, str::FromStr, time::Duration};
use thiserror::Error;

pub use controller::SessionController;
pub use ticker::{IntervalTicker, Ticker};

/// `strftime` layout of persisted timestamps, e.g. `19-10-2026 14:03:59`.
pub const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Errors returned synchronously by controller commands.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("invalid recording interval {input:?}: {reason}")]
    InvalidInterval { input: String, reason: &'static str },

    #[error("failed to close the record store: {0}")]
    Shutdown(#[source] StoreError),

    #[error("session controller is no longer running")]
    ControllerGone,
}

/// A tick-level failure. Reported to the observer; never stops the session.
#[derive(Error, Debug)]
pub enum SessionFault {
    #[error("sampler fault: {0}")]
    Sampler(#[from] SamplerError),

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// The longest accepted recording interval: one day.
pub const MAX_INTERVAL_SECS: u64 = 86_400;

/// The cadence of a recording session, in whole seconds, in `1..=MAX_INTERVAL_SECS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordingInterval(u64);

impl RecordingInterval {
    pub fn from_secs(secs: u64) -> Result<Self, SessionError> {
        if secs == 0 {
            return Err(SessionError::InvalidInterval {
                input: secs.to_string(),
                reason: "interval must be at least one second",
            });
        }
        if secs > MAX_INTERVAL_SECS {
            return Err(SessionError::InvalidInterval {
                input: secs.to_string(),
                reason: "interval must be at most one day",
            });
        }
        Ok(Self(secs))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl fmt::Display for RecordingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

impl FromStr for RecordingInterval {
    type Err = SessionError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| SessionError::InvalidInterval {
            input: input.to_string(),
            reason,
        };
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(invalid("interval is empty"));
        }
        let secs: i64 = trimmed
            .parse()
            .map_err(|_| invalid("interval is not a whole number of seconds"))?;
        Self::try_from(secs).map_err(|e| match e {
            SessionError::InvalidInterval { reason, .. } => invalid(reason),
            other => other,
        })
    }
}

impl TryFrom<i64> for RecordingInterval {
    type Error = SessionError;

    fn try_from(secs: i64) -> Result<Self, Self::Error> {
        if secs <= 0 {
            return Err(SessionError::InvalidInterval {
                input: secs.to_string(),
                reason: "interval must be at least one second",
            });
        }
        Self::from_secs(secs as u64)
    }
}

/// Mutable recording state, owned exclusively by the [`SessionController`].
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    active: bool,
    started_at: Option<DateTime<Local>>,
    elapsed_seconds: u64,
    interval: Option<RecordingInterval>,
}

impl RecordingSession {
    pub fn state(&self) -> SessionState {
        if self.active {
            SessionState::Recording
        } else {
            SessionState::Idle
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// The cadence the current session was started with, `None` while idle.
    pub fn interval(&self) -> Option<RecordingInterval> {
        self.interval
    }

    pub(crate) fn begin(&mut self, now: DateTime<Local>, interval: RecordingInterval) {
        self.active = true;
        self.started_at = Some(now);
        self.elapsed_seconds = 0;
        self.interval = Some(interval);
    }

    pub(crate) fn end(&mut self) {
        self.active = false;
        self.started_at = None;
        self.elapsed_seconds = 0;
        self.interval = None;
    }

    /// Recomputes elapsed time as whole seconds since the session started.
    ///
    /// A clock that stepped backwards yields 0 rather than a negative value.
    pub(crate) fn update_elapsed(&mut self, now: DateTime<Local>) -> u64 {
        if let Some(started_at) = self.started_at {
            self.elapsed_seconds = (now - started_at).num_seconds().max(0) as u64;
        }
        self.elapsed_seconds
    }
}
