// src/formatting.rs

use crate::commands::SessionStatus;
use crate::core::{Sample, SessionState};
use serde_json::json;

/// A trait for rendering controller events as single console lines.
pub trait EventFormatter: Send + Sync {
    fn format_sample(&self, sample: &Sample) -> String;
    fn format_elapsed(&self, seconds: u64) -> String;
    fn format_state(&self, state: SessionState) -> String;
    fn format_status(&self, status: &SessionStatus) -> String;
}

/// Human-readable lines, mirroring the labels of a desktop monitor widget.
pub struct PlainTextFormatter;

impl EventFormatter for PlainTextFormatter {
    fn format_sample(&self, sample: &Sample) -> String {
        format!(
            "CPU: {:.1}%  RAM: {:.1}%  Disk: {:.1}%",
            sample.cpu_percent, sample.ram_percent, sample.disk_percent
        )
    }

    fn format_elapsed(&self, seconds: u64) -> String {
        format!("Recording time: {}s", seconds)
    }

    fn format_state(&self, state: SessionState) -> String {
        match state {
            SessionState::Recording => "Recording started".to_string(),
            SessionState::Idle => "Recording stopped".to_string(),
        }
    }

    fn format_status(&self, status: &SessionStatus) -> String {
        match (status.state, status.interval_seconds) {
            (SessionState::Recording, Some(interval)) => format!(
                "Status: recording every {}s, {}s elapsed",
                interval, status.elapsed_seconds
            ),
            _ => "Status: idle".to_string(),
        }
    }
}

/// One JSON object per line, tagged with an `event` field.
pub struct JsonFormatter;

impl EventFormatter for JsonFormatter {
    fn format_sample(&self, sample: &Sample) -> String {
        json!({
            "event": "sample",
            "cpu_percent": sample.cpu_percent,
            "ram_percent": sample.ram_percent,
            "disk_percent": sample.disk_percent,
        })
        .to_string()
    }

    fn format_elapsed(&self, seconds: u64) -> String {
        json!({ "event": "elapsed", "seconds": seconds }).to_string()
    }

    fn format_state(&self, state: SessionState) -> String {
        json!({ "event": "state", "state": state.to_string() }).to_string()
    }

    fn format_status(&self, status: &SessionStatus) -> String {
        let mut value = serde_json::to_value(status).unwrap_or_default();
        if let Some(object) = value.as_object_mut() {
            object.insert("event".to_string(), json!("status"));
        }
        value.to_string()
    }
}
