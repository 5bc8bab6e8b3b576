//! CPU stress: one spinner process per logical core, each regulating itself
//! against the system-wide CPU utilization target.

use std::thread;
use std::time::Instant;

use crate::config::StressConfig;
use crate::error::Result;
use crate::sampler::ResourceSampler;
use crate::worker::{self, WorkerSpec};
use crate::workloads::QUANTUM;

/// Fans out one spinner process per logical CPU core.
///
/// The spinners are deliberately not joined: each one is bounded by its own
/// deadline, and this process exits right after the fan-out. Spinner
/// processes can therefore outlive the runner's join of this workload by up
/// to the configured duration.
pub async fn run(config: StressConfig) -> Result<()> {
    let cpu_count = thread::available_parallelism().map_or(1, |n| n.get());

    tracing::info!(
        duration_secs = config.duration_secs,
        cpu_target = config.cpu_target,
        cpu_count,
        "running cpu workload"
    );

    for _ in 0..cpu_count {
        worker::spawn(&WorkerSpec::CpuSpinner {
            config: config.clone(),
        })
        .await?;
    }

    Ok(())
}

/// A single core's spin loop.
///
/// While under the target, burn a short burst of arithmetic and re-check
/// immediately; while over it, sleep one quantum. Aggregate usage oscillates
/// around the target instead of pinning at 100%.
pub fn spin(config: &StressConfig, sampler: &mut dyn ResourceSampler) {
    let target = config.cpu_target as f32;
    let deadline = Instant::now() + config.duration();

    loop {
        if Instant::now() > deadline {
            tracing::info!("cpu spinner finished by deadline");
            break;
        }

        if sampler.cpu_percent() > target {
            thread::sleep(QUANTUM);
        } else {
            busy_burst();
        }
    }
}

fn busy_burst() {
    let mut acc = 0u64;
    for i in 0..100_000 {
        acc = acc.wrapping_mul(31).wrapping_add(i);
    }
    std::hint::black_box(acc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    struct StubSampler {
        cpu: f32,
    }

    impl ResourceSampler for StubSampler {
        fn cpu_percent(&mut self) -> f32 {
            self.cpu
        }

        fn memory_percent(&mut self) -> f32 {
            unimplemented!("cpu spinner never samples memory")
        }
    }

    #[test]
    fn spin_terminates_within_duration_plus_quantum() {
        let config = test_config();
        let mut sampler = StubSampler { cpu: 100.0 };

        let start = Instant::now();
        spin(&config, &mut sampler);
        let elapsed = start.elapsed();

        assert!(elapsed >= config.duration());
        assert!(elapsed <= config.duration() + 2 * QUANTUM);
    }

    #[test]
    fn spin_terminates_when_under_target() {
        // Below target the loop busy-works instead of sleeping, but the
        // deadline check still stops it.
        let config = test_config();
        let mut sampler = StubSampler { cpu: 0.0 };

        let start = Instant::now();
        spin(&config, &mut sampler);

        assert!(start.elapsed() >= config.duration());
    }
}
