//! Commands accepted by the session controller, and the handle used to send them.
//!
//! The controller consumes commands from a single bounded queue, which is what
//! serializes start/stop requests with ticks. Callers get replies over oneshot
//! channels, so an invalid interval is still surfaced synchronously to them.

use crate::core::SessionState;
use crate::session::{RecordingInterval, SessionError};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// A snapshot of the controller's recording session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub elapsed_seconds: u64,
    pub interval_seconds: Option<u64>,
    pub started_at: Option<DateTime<Local>>,
}

/// A message on the controller's command queue.
#[derive(Debug)]
pub enum SessionCommand {
    /// Starts (or restarts) recording. `None` uses the configured default interval.
    Start {
        interval: Option<String>,
        reply: oneshot::Sender<Result<RecordingInterval, SessionError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Status {
        reply: oneshot::Sender<SessionStatus>,
    },
}

/// A cloneable sender for controller commands.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { tx }
    }

    /// Creates a handle and the receiving end the controller should run with.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }

    /// Starts recording at the given interval input, as typed by a user.
    pub async fn start(&self, interval: Option<&str>) -> Result<RecordingInterval, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Start {
            interval: interval.map(str::to_string),
            reply,
        })
        .await?;
        rx.await.map_err(|_| SessionError::ControllerGone)?
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Stop { reply }).await?;
        rx.await.map_err(|_| SessionError::ControllerGone)
    }

    pub async fn status(&self) -> Result<SessionStatus, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Status { reply }).await?;
        rx.await.map_err(|_| SessionError::ControllerGone)
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| SessionError::ControllerGone)
    }
}

/// A line typed at the console front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start(Option<String>),
    Stop,
    Status,
    Quit,
    Help,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown command {0:?}, type `help` for a list of commands")]
pub struct UnknownCommand(pub String);

impl FromStr for ConsoleCommand {
    type Err = UnknownCommand;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();
        match (verb.as_str(), rest.as_slice()) {
            ("start", []) => Ok(ConsoleCommand::Start(None)),
            // Validation of the interval itself belongs to the controller.
            ("start", [interval]) => Ok(ConsoleCommand::Start(Some(interval.to_string()))),
            ("stop", []) => Ok(ConsoleCommand::Stop),
            ("status", []) => Ok(ConsoleCommand::Status),
            ("quit" | "exit", []) => Ok(ConsoleCommand::Quit),
            ("help" | "?", []) => Ok(ConsoleCommand::Help),
            _ => Err(UnknownCommand(line.trim().to_string())),
        }
    }
}

pub const CONSOLE_HELP: &str = "\
Commands:
  start [SECONDS]  start recording, sampling every SECONDS (restarts if already recording)
  stop             stop recording
  status           show the recording state and elapsed time
  quit             stop recording and exit";
