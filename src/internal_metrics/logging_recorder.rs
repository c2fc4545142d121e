//! A metrics recorder that periodically logs all captured metrics.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A metrics recorder that periodically logs all captured metrics via `tracing`.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates a new `LoggingRecorder` and starts a background task to log metrics.
    ///
    /// # Arguments
    /// * `aggregation_interval` - The interval at which to log the metrics.
    /// * `shutdown_rx` - Stops the logging task when it changes or closes.
    pub fn new(
        aggregation_interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(aggregation_interval);
            // The first tick completes immediately; there is nothing to report yet.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => log_snapshot(&registry),
                    _ = shutdown_rx.changed() => {
                        tracing::info!("Metrics logging task received shutdown signal.");
                        log_snapshot(&registry);
                        break;
                    }
                }
            }
        });

        (recorder, handle)
    }
}

fn log_snapshot(registry: &Registry<Key, AtomicStorage>) {
    tracing::debug!("--- Metrics Snapshot ---");

    let mut counters: Vec<_> = registry
        .get_counter_handles()
        .into_iter()
        .map(|(key, counter)| (key.name().to_string(), counter.load(Ordering::Relaxed)))
        .collect();
    counters.sort();
    for (name, value) in counters {
        tracing::info!("[Counter] {}: {}", name, value);
    }

    let mut gauges: Vec<_> = registry
        .get_gauge_handles()
        .into_iter()
        .map(|(key, gauge)| {
            (
                key.name().to_string(),
                f64::from_bits(gauge.load(Ordering::Relaxed)),
            )
        })
        .collect();
    gauges.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in gauges {
        tracing::info!("[Gauge] {}: {}", name, value as u64);
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry.get_or_create_histogram(key, |h| h.clone()).into()
    }
}
