//! Repeating timers that drive the session controller.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::warn;

/// A repeating timer with a configurable period.
///
/// Implementations must be cancel-safe in `tick`, since the controller polls
/// it inside `tokio::select!`.
#[async_trait]
pub trait Ticker: Send {
    /// (Re)starts the timer. The first tick fires one full `period` from now.
    fn start(&mut self, period: Duration);

    /// Stops the timer. No tick fires after this returns.
    fn stop(&mut self);

    /// The current period, or `None` while stopped.
    fn period(&self) -> Option<Duration>;

    fn is_running(&self) -> bool {
        self.period().is_some()
    }

    /// Completes at the next scheduled tick. Never completes while stopped.
    async fn tick(&mut self);
}

/// A [`Ticker`] backed by `tokio::time::interval`.
///
/// Missed ticks are delayed rather than bursted, so a slow tick handler pushes
/// the schedule back instead of causing back-to-back ticks.
#[derive(Debug, Default)]
pub struct IntervalTicker {
    interval: Option<Interval>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    fn start(&mut self, period: Duration) {
        let Some(first_tick) = Instant::now().checked_add(period) else {
            warn!(?period, "Ticker period out of range, leaving ticker stopped");
            self.interval = None;
            return;
        };
        let mut interval = time::interval_at(first_tick, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    fn stop(&mut self) {
        self.interval = None;
    }

    fn period(&self) -> Option<Duration> {
        self.interval.as_ref().map(|interval| interval.period())
    }

    async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}
