//! Object-store stress: bucket/file lifecycle plus round-robin rotation.
//!
//! Three phases. Setup creates uniquely named buckets and distributes
//! randomly sized files across them round-robin. Rotation then runs one
//! worker process per file, each perpetually moving its file one bucket
//! onward until the deadline. Teardown always runs afterwards, draining and
//! deleting every bucket that was created, even when setup or rotation
//! failed along the way.

use std::time::Instant;

use bytesize::ByteSize;
use futures::future::join_all;
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::StressConfig;
use crate::error::Result;
use crate::payload::{MEGA, Payload};
use crate::remote::S3Remote;
use crate::worker::{self, WorkerSpec};

/// A file's initial placement, handed to its rotation worker at spawn time.
///
/// Lives only in memory and on the spawn-time wire; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAssignment {
    /// Object name, `file{index}`.
    pub file_name: String,
    /// Index into the bucket list where the file currently lives.
    pub bucket_index: usize,
    /// Name of that bucket.
    pub bucket_name: String,
}

/// Runs the object-store workload end to end.
///
/// A connection failure is fatal for this workload and skips teardown, since
/// there is nothing to tear down yet. Any later failure is logged and still
/// falls through to teardown.
pub async fn run(config: StressConfig) -> Result<()> {
    tracing::info!(
        duration_secs = config.duration_secs,
        host = %config.object_store.host,
        bucket_count = config.object_store.bucket_count,
        file_count = config.object_store.file_count,
        "running object store workload"
    );

    let remote = S3Remote::connect(&config.object_store)?;

    let mut buckets = Vec::new();
    if let Err(err) = stress(&remote, &config, &mut buckets).await {
        tracing::error!("object store workload failed: {err}");
    }

    teardown(&remote, &buckets).await;
    Ok(())
}

/// Setup and rotation. Buckets are recorded in `buckets` as they are
/// created, so the caller can tear down whatever exists on any exit path.
async fn stress(
    remote: &S3Remote,
    config: &StressConfig,
    buckets: &mut Vec<String>,
) -> Result<()> {
    tracing::info!("creating buckets");
    for _ in 0..config.object_store.bucket_count {
        buckets.push(remote.create_unique_bucket().await?);
    }

    let assignments = distribute_files(remote, config, buckets).await?;

    let mut children = Vec::new();
    for assignment in assignments {
        children.push(
            worker::spawn(&WorkerSpec::FileRotator {
                config: config.clone(),
                assignment,
                buckets: buckets.clone(),
            })
            .await?,
        );
    }

    for status in join_all(children.iter_mut().map(|child| child.wait())).await {
        match status {
            Ok(status) if status.success() => {}
            Ok(status) => tracing::error!(code = ?status.code(), "rotation worker failed"),
            Err(err) => tracing::error!("failed to join rotation worker: {err}"),
        }
    }

    Ok(())
}

/// Assigns file `i` to bucket `i % bucket_count`.
pub(crate) fn assign_round_robin(file_count: usize, buckets: &[String]) -> Vec<FileAssignment> {
    (0..file_count)
        .map(|index| {
            let bucket_index = index % buckets.len();
            FileAssignment {
                file_name: format!("file{index}"),
                bucket_index,
                bucket_name: buckets[bucket_index].clone(),
            }
        })
        .collect()
}

/// Creates the files and uploads each to its assigned bucket.
async fn distribute_files(
    remote: &S3Remote,
    config: &StressConfig,
    buckets: &[String],
) -> Result<Vec<FileAssignment>> {
    tracing::info!("creating and distributing files");

    let mut rng = SmallRng::seed_from_u64(rand::random());
    let assignments = assign_round_robin(config.object_store.file_count, buckets);

    for assignment in &assignments {
        let size_mb = config.object_store.size_mb.sample(&mut rng);
        tracing::info!(
            file = %assignment.file_name,
            bucket = %assignment.bucket_name,
            size = %ByteSize::mib(size_mb),
            "uploading file"
        );

        let content = Payload::new(size_mb * MEGA, rng.next_u64()).into_bytes();
        remote
            .upload(&assignment.bucket_name, &assignment.file_name, &content)
            .await?;
    }

    Ok(assignments)
}

/// One rotation worker's loop: move the file one bucket onward, strictly
/// sequentially, until the deadline.
///
/// Each move is copy-then-delete and not atomic; a failure mid-move ends
/// this worker without retry or rollback. File names are exclusive to one
/// worker, so concurrent workers never touch the same object.
pub async fn rotate_file(
    config: &StressConfig,
    assignment: FileAssignment,
    buckets: Vec<String>,
) -> Result<()> {
    let remote = S3Remote::connect(&config.object_store)?;

    tracing::info!(file = %assignment.file_name, "rotating file");

    let deadline = Instant::now() + config.duration();
    let mut index = assignment.bucket_index;
    let mut bucket = assignment.bucket_name.clone();

    loop {
        if Instant::now() > deadline {
            tracing::info!(file = %assignment.file_name, "file rotation finished by deadline");
            return Ok(());
        }

        let next_index = next_bucket_index(index, buckets.len());
        let next_bucket = &buckets[next_index];

        tracing::debug!(
            file = %assignment.file_name,
            from = %bucket,
            to = %next_bucket,
            "moving file"
        );
        remote
            .move_object(&assignment.file_name, &bucket, next_bucket)
            .await?;

        index = next_index;
        bucket = next_bucket.clone();
    }
}

pub(crate) fn next_bucket_index(index: usize, bucket_count: usize) -> usize {
    (index + 1) % bucket_count
}

/// Drains and deletes every bucket. Failures are logged per bucket and do
/// not stop the remaining teardown.
async fn teardown(remote: &S3Remote, buckets: &[String]) {
    tracing::info!("removing all buckets");

    for name in buckets {
        if let Err(err) = remote.remove_bucket(name).await {
            tracing::error!(bucket = %name, "failed to remove bucket: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket_names(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("bucket-{i}")).collect()
    }

    #[test]
    fn round_robin_covers_every_file() {
        let buckets = bucket_names(3);
        let assignments = assign_round_robin(7, &buckets);

        assert_eq!(assignments.len(), 7);
        for (index, assignment) in assignments.iter().enumerate() {
            assert_eq!(assignment.file_name, format!("file{index}"));
            assert_eq!(assignment.bucket_index, index % 3);
            assert_eq!(assignment.bucket_name, buckets[index % 3]);
        }
    }

    #[test]
    fn a_full_cycle_returns_to_the_original_bucket() {
        let bucket_count = 5;
        let mut index = 2;
        for hop in 1..=bucket_count {
            index = next_bucket_index(index, bucket_count);
            if hop < bucket_count {
                assert_ne!(index, 2);
            }
        }
        assert_eq!(index, 2);
    }

    #[test]
    fn hops_never_leave_the_bucket_list() {
        let mut index = 0;
        for _ in 0..20 {
            index = next_bucket_index(index, 3);
            assert!(index < 3);
        }
    }
}
