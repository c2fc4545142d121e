//! Sampler doubles.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use sysrecord::{sampler::SamplerError, Sample, Sampler};

/// A sampler that always returns the same reading.
#[derive(Debug, Clone)]
pub struct FixedSampler {
    sample: Sample,
    calls: Arc<Mutex<usize>>,
}

impl FixedSampler {
    pub fn new(sample: Sample) -> Self {
        Self {
            sample,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl Sampler for FixedSampler {
    fn sample(&mut self) -> Result<Sample, SamplerError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.sample)
    }
}

/// A sampler that replays scripted results, then falls back to a fixed reading.
#[derive(Debug, Clone)]
pub struct ScriptedSampler {
    script: Arc<Mutex<VecDeque<Result<Sample, SamplerError>>>>,
    fallback: Sample,
}

impl ScriptedSampler {
    pub fn new(fallback: Sample) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback,
        }
    }

    pub fn push(&self, result: Result<Sample, SamplerError>) {
        self.script.lock().unwrap().push_back(result);
    }
}

impl Sampler for ScriptedSampler {
    fn sample(&mut self) -> Result<Sample, SamplerError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.fallback))
    }
}
