//! Manages the lifecycle of the application's background tasks.
use anyhow::{bail, Result};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawns tasks, keeps their `JoinHandle`s, and awaits them all on shutdown.
#[derive(Clone, Debug)]
pub struct TaskManager {
    handles: Arc<Mutex<Vec<(&'static str, JoinHandle<()>)>>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl TaskManager {
    pub fn new(shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            shutdown_rx,
        }
    }

    /// Spawns a new task and adds its handle to the manager.
    pub fn spawn<F>(&self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future);
        match self.handles.lock() {
            Ok(mut handles) => handles.push((name, handle)),
            Err(poisoned) => poisoned.into_inner().push((name, handle)),
        }
    }

    /// Returns a clone of the shutdown receiver.
    pub fn get_shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Waits up to `timeout` for all managed tasks to complete.
    ///
    /// Tasks still running at the deadline are aborted and an error is returned.
    pub async fn shutdown(self, timeout: Duration) -> Result<()> {
        let handles: Vec<_> = match self.handles.lock() {
            Ok(mut handles) => handles.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };
        info!(
            "TaskManager shutting down. Waiting for {} tasks to complete...",
            handles.len()
        );

        let task_names: Vec<&'static str> = handles.iter().map(|(name, _)| *name).collect();
        let aborts: Vec<_> = handles.iter().map(|(_, h)| h.abort_handle()).collect();
        debug!(tasks = ?task_names, "Awaiting all tasks.");

        let joined = join_all(handles.into_iter().map(|(_, handle)| handle));
        let results = match tokio::time::timeout(timeout, joined).await {
            Ok(results) => results,
            Err(_) => {
                for abort in aborts {
                    abort.abort();
                }
                bail!(
                    "tasks {:?} did not shut down within {:?}",
                    task_names,
                    timeout
                );
            }
        };

        let mut panicked = Vec::new();
        for (task_name, result) in task_names.iter().zip(results) {
            match result {
                Ok(()) => debug!(task_name, "Task shut down gracefully."),
                Err(e) => {
                    error!(task_name, "Task panicked during shutdown: {}", e);
                    panicked.push(*task_name);
                }
            }
        }

        if !panicked.is_empty() {
            bail!("{} tasks panicked during shutdown: {:?}", panicked.len(), panicked);
        }
        info!("All tasks shut down gracefully.");
        Ok(())
    }
}
