#![allow(dead_code)]
pub mod mock_sampler;
pub mod mock_store;
pub mod recording_observer;
pub mod tokio_clock;

use sysrecord::config::Config;
use std::path::Path;

/// A configuration suitable for tests: no display refresh, no metrics logging,
/// and the database placed under `dir`.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.storage.db_path = dir.join("monitor.db");
    config.display.refresh_interval_seconds = 0;
    config.metrics.log_metrics = false;
    config
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
