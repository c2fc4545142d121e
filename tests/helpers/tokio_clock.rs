//! A wall clock that follows tokio's (pausable) time.

use chrono::{DateTime, Local};
use sysrecord::Clock;
use tokio::time::Instant;

/// Reports `origin + (tokio now - start)`, so paused-time tests get
/// timestamps that advance exactly with the virtual clock.
#[derive(Debug, Clone)]
pub struct TokioClock {
    wall_origin: DateTime<Local>,
    origin: Instant,
}

impl TokioClock {
    pub fn new(wall_origin: DateTime<Local>) -> Self {
        Self {
            wall_origin,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Local> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed()).unwrap();
        self.wall_origin + elapsed
    }
}
