//! Top-level orchestration: one OS process per workload.

use futures::future::join_all;

use crate::config::StressConfig;
use crate::error::Result;
use crate::worker::{self, WorkerSpec};
use crate::workloads::WorkloadKind;

/// Starts every workload in its own process and waits for all of them.
#[derive(Debug)]
pub struct Runner {
    workloads: Vec<WorkloadKind>,
    config: StressConfig,
}

impl Runner {
    /// Creates a runner for the given workloads and shared configuration.
    pub fn new(workloads: Vec<WorkloadKind>, config: StressConfig) -> Self {
        Self { workloads, config }
    }

    /// Spawns all workload processes, then blocks until every one of them
    /// has terminated.
    ///
    /// Workloads are isolated: one crashing neither stops nor signals the
    /// others. Failures are logged per workload and never surfaced as an
    /// error from this function; spawn failures of the processes themselves
    /// are the only thing that can make it bail.
    pub async fn run(self) -> Result<()> {
        let mut children = Vec::new();
        for kind in self.workloads {
            let spec = WorkerSpec::Workload {
                kind,
                config: self.config.clone(),
            };
            let child = worker::spawn(&spec).await?;
            tracing::info!(workload = %kind, pid = child.id(), "started workload");
            children.push((kind, child));
        }

        let joins = children
            .iter_mut()
            .map(|(kind, child)| async { (*kind, child.wait().await) });

        for (kind, status) in join_all(joins).await {
            match status {
                Ok(status) if status.success() => {
                    tracing::info!(workload = %kind, "workload finished");
                }
                Ok(status) => {
                    tracing::error!(workload = %kind, code = ?status.code(), "workload failed");
                }
                Err(err) => {
                    tracing::error!(workload = %kind, "failed to join workload: {err}");
                }
            }
        }

        Ok(())
    }
}
