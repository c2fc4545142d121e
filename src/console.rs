//! Line-oriented console front-end for the session controller.

use crate::commands::{ConsoleCommand, SessionHandle, CONSOLE_HELP};
use crate::outputs::ConsoleDisplay;
use crate::session::SessionError;
use async_trait::async_trait;
use std::io::{self, BufRead};
use std::thread;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info};

/// A source of console input lines.
#[async_trait]
pub trait LineSource: Send {
    /// The next line, or `None` once input is exhausted.
    async fn next_line(&mut self) -> io::Result<Option<String>>;
}

#[async_trait]
impl<R> LineSource for Lines<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Lines::next_line(self).await
    }
}

#[async_trait]
impl LineSource for mpsc::Receiver<String> {
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.recv().await)
    }
}

/// Reads stdin on a detached OS thread and forwards each line.
///
/// The pending read must never hold up runtime shutdown, so it stays off
/// tokio's blocking pool.
pub fn spawn_stdin_reader(capacity: usize) -> io::Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(capacity);
    thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || forward_lines(io::stdin().lock(), &tx))?;
    Ok(rx)
}

fn forward_lines<R: BufRead>(input: R, tx: &mpsc::Sender<String>) {
    for line in input.lines() {
        match line {
            Ok(line) => {
                if tx.blocking_send(line).is_err() {
                    debug!("Console closed, stdin reader exiting.");
                    return;
                }
            }
            Err(e) => {
                error!("Failed to read console input: {}", e);
                return;
            }
        }
    }
}

/// Why the console loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleExit {
    Quit,
    InputClosed,
    Shutdown,
    ControllerGone,
}

/// Reads commands line by line and forwards them to the controller.
///
/// Returns on `quit`, end of input, a shutdown signal, or once the controller
/// is no longer running.
pub async fn run_console<R>(
    input: R,
    session: &SessionHandle,
    display: &ConsoleDisplay,
    shutdown_rx: watch::Receiver<bool>,
) -> ConsoleExit
where
    R: AsyncBufRead + Unpin + Send,
{
    run_console_lines(input.lines(), session, display, shutdown_rx).await
}

/// Like [`run_console`], reading from any [`LineSource`].
pub async fn run_console_lines<L: LineSource>(
    mut lines: L,
    session: &SessionHandle,
    display: &ConsoleDisplay,
    mut shutdown_rx: watch::Receiver<bool>,
) -> ConsoleExit {
    loop {
        let line = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => return ConsoleExit::Shutdown,
            line = lines.next_line() => line,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Console input closed.");
                return ConsoleExit::InputClosed;
            }
            Err(e) => {
                error!("Failed to read console input: {}", e);
                return ConsoleExit::InputClosed;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<ConsoleCommand>() {
            Ok(command) => command,
            Err(e) => {
                display.print_line(&e.to_string());
                continue;
            }
        };
        match execute(command, session, display).await {
            Ok(true) => {}
            Ok(false) => return ConsoleExit::Quit,
            Err(SessionError::ControllerGone) => return ConsoleExit::ControllerGone,
            Err(e) => display.print_line(&format!("Error: {}", e)),
        }
    }
}

/// Executes one console command. Returns `Ok(false)` when the console should exit.
pub async fn execute(
    command: ConsoleCommand,
    session: &SessionHandle,
    display: &ConsoleDisplay,
) -> Result<bool, SessionError> {
    match command {
        ConsoleCommand::Start(interval) => {
            session.start(interval.as_deref()).await?;
        }
        ConsoleCommand::Stop => session.stop().await?,
        ConsoleCommand::Status => {
            let status = session.status().await?;
            display.print_line(&display.formatter().format_status(&status));
        }
        ConsoleCommand::Help => display.print_line(CONSOLE_HELP),
        ConsoleCommand::Quit => {
            session.stop().await?;
            return Ok(false);
        }
    }
    Ok(true)
}
