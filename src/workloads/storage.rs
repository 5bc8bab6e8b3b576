//! Local filesystem stress: independent worker processes that repeatedly
//! fill a scoped temporary directory with files, read everything back, and
//! let the directory be destroyed.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use futures::future::join_all;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use crate::config::{StorageConfig, StressConfig};
use crate::error::Result;
use crate::payload::{MEGA, Payload};
use crate::worker::{self, WorkerSpec};

/// Fans out the configured number of worker processes and joins them all.
pub async fn run(config: StressConfig) -> Result<()> {
    tracing::info!(
        duration_secs = config.duration_secs,
        process_count = config.storage.process_count,
        "running storage workload"
    );

    let mut children = Vec::new();
    for _ in 0..config.storage.process_count {
        children.push(
            worker::spawn(&WorkerSpec::StorageWorker {
                config: config.clone(),
            })
            .await?,
        );
    }

    for status in join_all(children.iter_mut().map(|child| child.wait())).await {
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::error!(code = ?status.code(), "storage worker failed"),
            Err(err) => tracing::error!("failed to join storage worker: {err}"),
        }
    }

    Ok(())
}

/// One worker's write/read churn loop.
///
/// Every iteration gets a fresh scoped temporary directory which is removed
/// recursively when it goes out of scope, on error paths included.
pub fn worker_loop(config: &StressConfig) -> Result<()> {
    tracing::info!("storage worker creating and reading files");

    let mut rng = SmallRng::seed_from_u64(rand::random());
    let deadline = Instant::now() + config.duration();

    loop {
        if Instant::now() > deadline {
            tracing::info!("storage worker finished by deadline");
            return Ok(());
        }

        let dir = tempfile::tempdir()?;
        write_and_read_back(dir.path(), &config.storage, &mut rng)?;
    }
}

/// Writes `file_count` randomly sized files into `dir`, then reads every one
/// of them back fully into memory.
pub(crate) fn write_and_read_back(
    dir: &Path,
    storage: &StorageConfig,
    rng: &mut SmallRng,
) -> io::Result<()> {
    for index in 0..storage.file_count {
        let size_mb = storage.size_mb.sample(rng);
        let mut payload = Payload::new(size_mb * MEGA, rng.next_u64());

        let mut file = File::create(dir.join(format!("file{index}")))?;
        io::copy(&mut payload, &mut file)?;
    }

    for index in 0..storage.file_count {
        let contents = std::fs::read(dir.join(format!("file{index}")))?;
        std::hint::black_box(contents);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn every_written_file_is_readable_and_in_range() {
        let config = test_config();
        let mut rng = SmallRng::seed_from_u64(1);
        let dir = tempfile::tempdir().unwrap();

        write_and_read_back(dir.path(), &config.storage, &mut rng).unwrap();

        for index in 0..config.storage.file_count {
            let metadata = std::fs::metadata(dir.path().join(format!("file{index}"))).unwrap();
            let range = config.storage.size_mb;
            assert!(metadata.len() >= range.min_mb * MEGA);
            assert!(metadata.len() <= range.max_mb * MEGA);
        }
    }

    #[test]
    fn temp_dir_is_gone_after_the_iteration() {
        let config = test_config();
        let mut rng = SmallRng::seed_from_u64(2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        write_and_read_back(&path, &config.storage, &mut rng).unwrap();
        assert!(path.exists());

        drop(dir);
        assert!(!path.exists());
    }

    #[test]
    fn worker_loop_stops_at_deadline() {
        let mut config = test_config();
        // Tiny files so several iterations fit into one second.
        config.storage.size_mb = crate::config::SizeRange { min_mb: 1, max_mb: 2 };
        config.storage.file_count = 1;

        let start = Instant::now();
        worker_loop(&config).unwrap();
        assert!(start.elapsed() >= config.duration());
    }
}
