//! Console presentation of controller events.

use crate::config::OutputFormat;
use crate::core::{Sample, SessionObserver, SessionState};
use crate::formatting::{EventFormatter, JsonFormatter, PlainTextFormatter};
use crate::session::SessionFault;
use std::io::Write;
use std::sync::Mutex;
use tracing::error;

/// A [`SessionObserver`] that prints every event as one line.
pub struct ConsoleDisplay {
    formatter: Box<dyn EventFormatter>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleDisplay {
    /// Creates a display writing to stdout.
    pub fn new(format: OutputFormat) -> Self {
        Self::with_writer(format, Box::new(std::io::stdout()))
    }

    pub fn with_writer(format: OutputFormat, writer: Box<dyn Write + Send>) -> Self {
        let formatter: Box<dyn EventFormatter> = match format {
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::PlainText => Box::new(PlainTextFormatter),
        };
        Self {
            formatter,
            writer: Mutex::new(writer),
        }
    }

    pub fn formatter(&self) -> &dyn EventFormatter {
        self.formatter.as_ref()
    }

    /// Writes an arbitrary line, e.g. a command reply.
    pub fn print_line(&self, line: &str) {
        let Ok(mut writer) = self.writer.lock() else {
            return;
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|()| writer.flush()) {
            error!("Failed to write to console: {}", e);
        }
    }
}

impl SessionObserver for ConsoleDisplay {
    fn on_sample_updated(&self, sample: &Sample) {
        self.print_line(&self.formatter.format_sample(sample));
    }

    fn on_elapsed_updated(&self, seconds: u64) {
        self.print_line(&self.formatter.format_elapsed(seconds));
    }

    fn on_state_changed(&self, state: SessionState) {
        self.print_line(&self.formatter.format_state(state));
    }

    fn on_fault(&self, fault: &SessionFault) {
        self.print_line(&format!("Warning: {}", fault));
    }
}
