//! System-wide utilization sampling.
//!
//! The control loops only ever need two read-only queries: current CPU
//! utilization and current memory utilization, both as percentages. The
//! trait exists so the loops can be tested against a stub.

use std::time::Instant;

use sysinfo::System;

/// Read-only source of system-wide utilization percentages.
pub trait ResourceSampler {
    /// Current system-wide CPU utilization, 0.0..=100.0.
    fn cpu_percent(&mut self) -> f32;

    /// Current system-wide memory utilization, 0.0..=100.0.
    fn memory_percent(&mut self) -> f32;
}

/// A [`ResourceSampler`] backed by [`sysinfo`].
///
/// CPU usage is computed from the delta between two refreshes, and sysinfo
/// requires a minimum interval between them. The sampler caches the last
/// reading in between, which also keeps a busy-spinning caller from
/// hammering `/proc` on every iteration.
#[derive(Debug)]
pub struct SystemSampler {
    system: System,
    last_cpu_refresh: Instant,
    cpu_usage: f32,
}

impl SystemSampler {
    /// Creates a sampler and primes the first CPU measurement.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        Self {
            system,
            last_cpu_refresh: Instant::now(),
            cpu_usage: 0.0,
        }
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceSampler for SystemSampler {
    fn cpu_percent(&mut self) -> f32 {
        if self.last_cpu_refresh.elapsed() >= sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
            self.system.refresh_cpu_usage();
            self.cpu_usage = self.system.global_cpu_usage();
            self.last_cpu_refresh = Instant::now();
        }
        self.cpu_usage
    }

    fn memory_percent(&mut self) -> f32 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        (self.system.used_memory() as f64 / total as f64 * 100.0) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_stay_in_range() {
        let mut sampler = SystemSampler::new();

        let cpu = sampler.cpu_percent();
        assert!((0.0..=100.0).contains(&cpu));

        let memory = sampler.memory_percent();
        assert!((0.0..=100.0).contains(&memory));
        // Something is always using memory on a live system.
        assert!(memory > 0.0);
    }
}
