//! Deterministic clock and ticker doubles for driving the controller in tests.

use super::ticker::Ticker;
use crate::core::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// A clock starting at a fixed, DST-free local time.
    pub fn at_fixed_start() -> Self {
        let start = Local
            .with_ymd_and_hms(2024, 6, 15, 12, 0, 0)
            .single()
            .expect("fixed test time is unambiguous");
        Self::new(start)
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).expect("test duration fits chrono");
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap()
    }
}

/// A call observed by a [`ManualTicker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerCall {
    Start(Duration),
    Stop,
}

#[derive(Debug, Default)]
struct ManualTickerState {
    calls: Vec<TickerCall>,
    period: Option<Duration>,
    pending_fires: usize,
}

/// A ticker that records start/stop calls and only fires on [`ManualTicker::fire`].
///
/// Fires are dropped by `stop` and `start`, so no tick from a previous run
/// leaks into the next one.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Arc<Mutex<ManualTickerState>>,
    wake: Arc<Notify>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<TickerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Releases one `tick`, if the ticker is running.
    pub fn fire(&self) {
        let mut state = self.state.lock().unwrap();
        if state.period.is_some() {
            state.pending_fires += 1;
            self.wake.notify_waiters();
        }
    }

    fn take_fire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.period.is_some() && state.pending_fires > 0 {
            state.pending_fires -= 1;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    fn start(&mut self, period: Duration) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TickerCall::Start(period));
        state.period = Some(period);
        state.pending_fires = 0;
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TickerCall::Stop);
        state.period = None;
        state.pending_fires = 0;
    }

    fn period(&self) -> Option<Duration> {
        self.state.lock().unwrap().period
    }

    async fn tick(&mut self) {
        loop {
            // Registered before checking, so a concurrent `fire` is not missed.
            let notified = self.wake.notified();
            if self.take_fire() {
                return;
            }
            notified.await;
        }
    }
}
