//! Spawn-time wire format and dispatch for worker processes.
//!
//! All fan-out in the harness re-executes the current binary with the
//! internal `worker` subcommand and writes one JSON [`WorkerSpec`] to the
//! child's stdin. The spec carries everything the worker needs by value:
//! configuration, and for rotation workers their file assignment plus a
//! snapshot of the bucket-name list. Stdin is used instead of argv so
//! credentials never show up in the process list.

use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

use crate::config::StressConfig;
use crate::error::Result;
use crate::sampler::SystemSampler;
use crate::workloads::object_store::FileAssignment;
use crate::workloads::{WorkloadKind, cpu, object_store, storage};

/// Everything a spawned worker process needs to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum WorkerSpec {
    /// A top-level workload, spawned by the runner.
    Workload {
        /// Which workload to run.
        kind: WorkloadKind,
        /// The shared configuration.
        config: StressConfig,
    },
    /// One per-core CPU spinner, spawned by the CPU workload.
    CpuSpinner {
        /// The shared configuration.
        config: StressConfig,
    },
    /// One filesystem churn worker, spawned by the storage workload.
    StorageWorker {
        /// The shared configuration.
        config: StressConfig,
    },
    /// One file-rotation worker, spawned by the object-store workload.
    FileRotator {
        /// The shared configuration.
        config: StressConfig,
        /// The file this worker owns exclusively.
        assignment: FileAssignment,
        /// Snapshot of all bucket names, indexed by bucket index.
        buckets: Vec<String>,
    },
}

impl WorkerSpec {
    /// Short role name for log context.
    pub fn role(&self) -> &'static str {
        match self {
            WorkerSpec::Workload { kind, .. } => kind.name(),
            WorkerSpec::CpuSpinner { .. } => "cpu-spinner",
            WorkerSpec::StorageWorker { .. } => "storage-worker",
            WorkerSpec::FileRotator { .. } => "file-rotator",
        }
    }
}

/// Spawns a worker process for the given spec.
///
/// The child is handed the spec on stdin and nothing else; there is no
/// shared state after this returns.
pub async fn spawn(spec: &WorkerSpec) -> Result<Child> {
    let exe = std::env::current_exe()?;
    let mut child = Command::new(exe)
        .arg("worker")
        .stdin(Stdio::piped())
        .spawn()?;

    let encoded = serde_json::to_vec(spec)?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(&encoded).await?;
        // Dropping the handle closes the pipe; the child reads to EOF.
    }

    Ok(child)
}

/// Worker-side entry point: runs the role described by the spec.
pub async fn dispatch(spec: WorkerSpec) -> Result<()> {
    match spec {
        WorkerSpec::Workload { kind, config } => kind.run(config).await,
        WorkerSpec::CpuSpinner { config } => {
            tokio::task::spawn_blocking(move || {
                let mut sampler = SystemSampler::new();
                cpu::spin(&config, &mut sampler)
            })
            .await?;
            Ok(())
        }
        WorkerSpec::StorageWorker { config } => {
            tokio::task::spawn_blocking(move || storage::worker_loop(&config)).await?
        }
        WorkerSpec::FileRotator {
            config,
            assignment,
            buckets,
        } => object_store::rotate_file(&config, assignment, buckets).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn spec_survives_the_exec_boundary() {
        let spec = WorkerSpec::FileRotator {
            config: test_config(),
            assignment: FileAssignment {
                file_name: "file0".into(),
                bucket_index: 1,
                bucket_name: "bucket-1".into(),
            },
            buckets: vec!["bucket-0".into(), "bucket-1".into()],
        };

        let encoded = serde_json::to_string(&spec).unwrap();
        assert!(encoded.contains("\"role\":\"file_rotator\""));

        let decoded: WorkerSpec = serde_json::from_str(&encoded).unwrap();
        match decoded {
            WorkerSpec::FileRotator {
                assignment,
                buckets,
                ..
            } => {
                assert_eq!(assignment.bucket_index, 1);
                assert_eq!(buckets.len(), 2);
            }
            other => panic!("decoded into the wrong role: {}", other.role()),
        }
    }

    #[test]
    fn roles_are_distinct() {
        let config = test_config();
        let workload = WorkerSpec::Workload {
            kind: WorkloadKind::Cpu,
            config: config.clone(),
        };
        let spinner = WorkerSpec::CpuSpinner { config };

        assert_eq!(workload.role(), "cpu");
        assert_eq!(spinner.role(), "cpu-spinner");
    }
}
