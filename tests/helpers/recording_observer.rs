//! An observer that records every event it receives.

use std::sync::{Arc, Mutex};
use sysrecord::{session::SessionFault, Sample, SessionObserver, SessionState};

#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Sample(Sample),
    Elapsed(u64),
    State(SessionState),
    Fault(String),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn samples(&self) -> usize {
        self.count(|e| matches!(e, ObservedEvent::Sample(_)))
    }

    pub fn faults(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Fault(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn elapsed_updates(&self) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Elapsed(seconds) => Some(seconds),
                _ => None,
            })
            .collect()
    }

    fn count(&self, predicate: impl Fn(&ObservedEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl SessionObserver for RecordingObserver {
    fn on_sample_updated(&self, sample: &Sample) {
        self.push(ObservedEvent::Sample(*sample));
    }

    fn on_elapsed_updated(&self, seconds: u64) {
        self.push(ObservedEvent::Elapsed(seconds));
    }

    fn on_state_changed(&self, state: SessionState) {
        self.push(ObservedEvent::State(state));
    }

    fn on_fault(&self, fault: &SessionFault) {
        self.push(ObservedEvent::Fault(fault.to_string()));
    }
}
