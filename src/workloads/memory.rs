//! Memory stress: allocate and retain chunks until the system-wide memory
//! utilization reaches the target, then hold it there until the deadline.

use std::thread;
use std::time::Instant;

use crate::config::StressConfig;
use crate::error::Result;
use crate::sampler::{ResourceSampler, SystemSampler};
use crate::workloads::QUANTUM;

/// Size of one retained allocation.
const CHUNK_BYTES: usize = 32 * 1024 * 1024;

/// Runs the memory workload in-process.
///
/// Unlike the other workloads this one does not fan out: a single growing
/// collection of chunks is the whole stress. A panic inside the loop is
/// caught at the task boundary and logged; the workload then terminates
/// gracefully, releasing everything it retained.
pub async fn run(config: StressConfig) -> Result<()> {
    tracing::info!(
        duration_secs = config.duration_secs,
        ram_target = config.ram_target,
        "running memory workload"
    );

    let outcome = tokio::task::spawn_blocking(move || {
        let mut sampler = SystemSampler::new();
        fill_until_deadline(&config, &mut sampler)
    })
    .await;

    match outcome {
        Ok(chunks) => tracing::info!(chunks, "memory workload released its allocations"),
        Err(err) => tracing::error!("memory workload failed: {err}"),
    }

    Ok(())
}

/// The allocation loop. Returns the number of chunks that were retained.
///
/// Above the target the loop sleeps one quantum; below it, a chunk is
/// allocated fallibly and kept. An allocation failure is swallowed: memory
/// pressure will read as high on the next sample anyway.
pub fn fill_until_deadline(config: &StressConfig, sampler: &mut dyn ResourceSampler) -> usize {
    let target = config.ram_target as f32;
    let deadline = Instant::now() + config.duration();
    let mut retained: Vec<Vec<u8>> = Vec::new();

    loop {
        if Instant::now() > deadline {
            tracing::info!("memory workload finished by deadline");
            break;
        }

        if sampler.memory_percent() > target {
            thread::sleep(QUANTUM);
        } else if let Some(chunk) = allocate_chunk() {
            retained.push(chunk);
        }
    }

    let chunks = retained.len();
    drop(retained);
    chunks
}

/// Fallibly allocates one committed chunk.
fn allocate_chunk() -> Option<Vec<u8>> {
    let mut chunk = Vec::new();
    chunk.try_reserve_exact(CHUNK_BYTES).ok()?;
    // Fill with a non-zero pattern so the pages are actually committed.
    chunk.resize(CHUNK_BYTES, 0x55);
    Some(chunk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    struct StubSampler {
        memory: f32,
    }

    impl ResourceSampler for StubSampler {
        fn cpu_percent(&mut self) -> f32 {
            unimplemented!("memory workload never samples cpu")
        }

        fn memory_percent(&mut self) -> f32 {
            self.memory
        }
    }

    #[test]
    fn above_target_only_sleeps() {
        let config = test_config();
        let mut sampler = StubSampler { memory: 100.0 };

        let start = Instant::now();
        let chunks = fill_until_deadline(&config, &mut sampler);
        let elapsed = start.elapsed();

        assert_eq!(chunks, 0);
        assert!(elapsed >= config.duration());
        assert!(elapsed <= config.duration() + 2 * QUANTUM);
    }

    #[test]
    fn chunks_are_fully_committed() {
        let chunk = allocate_chunk().expect("test machine should have 32 MiB to spare");
        assert_eq!(chunk.len(), CHUNK_BYTES);
        assert!(chunk.iter().all(|&byte| byte == 0x55));
    }
}
