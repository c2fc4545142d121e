//! # System Sampler
//!
//! `SystemSampler` reads host-wide processor, memory and storage utilization
//! through the `sysinfo` crate. It keeps one `System` and one `Disks` instance
//! alive between samples, since CPU usage is computed from the delta between
//! two consecutive refreshes.

use crate::core::{Sample, Sampler};
use std::path::{Path, PathBuf};
use sysinfo::{Disks, System};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplerError {
    #[error("resource readings unavailable: {0}")]
    Unavailable(String),

    #[error("{field} reading {value} is outside 0-100%")]
    OutOfRange { field: &'static str, value: f64 },
}

/// A [`Sampler`] backed by `sysinfo`.
pub struct SystemSampler {
    system: System,
    disks: Disks,
    mount_point: PathBuf,
}

impl SystemSampler {
    /// Creates a sampler reporting storage usage of the disk mounted at `mount_point`.
    ///
    /// If no disk is mounted exactly there, usage is summed over all disks.
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        let mut system = System::new();
        // Prime the CPU counters so the first real sample has a baseline.
        system.refresh_cpu();
        system.refresh_memory();
        Self {
            system,
            disks: Disks::new_with_refreshed_list(),
            mount_point: mount_point.into(),
        }
    }

    fn memory_percent(&self) -> Result<f64, SamplerError> {
        let total = self.system.total_memory();
        if total == 0 {
            return Err(SamplerError::Unavailable(
                "total memory reported as zero".to_string(),
            ));
        }
        Ok(percent(self.system.used_memory(), total))
    }

    fn disk_percent(&self) -> Result<f64, SamplerError> {
        let (total, available) = match self
            .disks
            .list()
            .iter()
            .find(|disk| disk.mount_point() == self.mount_point.as_path())
        {
            Some(disk) => (disk.total_space(), disk.available_space()),
            None => {
                debug!(
                    mount_point = %self.mount_point.display(),
                    "No disk mounted at the configured mount point, summing all disks"
                );
                self.disks
                    .list()
                    .iter()
                    .fold((0u64, 0u64), |(total, available), disk| {
                        (total + disk.total_space(), available + disk.available_space())
                    })
            }
        };
        if total == 0 {
            return Err(SamplerError::Unavailable(format!(
                "no storage capacity found for {}",
                self.mount_point.display()
            )));
        }
        Ok(percent(total.saturating_sub(available), total))
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }
}

impl Sampler for SystemSampler {
    fn sample(&mut self) -> Result<Sample, SamplerError> {
        self.system.refresh_cpu();
        self.system.refresh_memory();
        self.disks.refresh();

        let cpu = f64::from(self.system.global_cpu_info().cpu_usage());
        Ok(Sample::new(
            round_tenth(cpu),
            round_tenth(self.memory_percent()?),
            round_tenth(self.disk_percent()?),
        ))
    }
}

fn percent(used: u64, total: u64) -> f64 {
    used as f64 / total as f64 * 100.0
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
