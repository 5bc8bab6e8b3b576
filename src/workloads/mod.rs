//! The stress workloads.
//!
//! Workloads form a closed set: the [`Runner`](crate::Runner) dispatches on
//! [`WorkloadKind`] rather than through trait objects, since no workload is
//! ever added at runtime.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::StressConfig;
use crate::error::Result;

pub mod cpu;
pub mod memory;
pub mod object_store;
pub mod storage;

/// Sleep interval used to yield back load whenever current utilization
/// exceeds a workload's target.
pub(crate) const QUANTUM: Duration = Duration::from_millis(300);

/// One resource dimension to stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// Closed-loop CPU burn, one spinner process per core.
    Cpu,
    /// Closed-loop memory allocation.
    Memory,
    /// Local filesystem write/read churn.
    Storage,
    /// Object-store bucket/file lifecycle and rotation.
    ObjectStore,
}

impl WorkloadKind {
    /// All workload variants, in the order the runner starts them.
    pub fn all() -> Vec<WorkloadKind> {
        vec![
            WorkloadKind::Cpu,
            WorkloadKind::Memory,
            WorkloadKind::Storage,
            WorkloadKind::ObjectStore,
        ]
    }

    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            WorkloadKind::Cpu => "cpu",
            WorkloadKind::Memory => "memory",
            WorkloadKind::Storage => "storage",
            WorkloadKind::ObjectStore => "object-store",
        }
    }

    /// Runs this workload to completion with the given configuration.
    pub async fn run(self, config: StressConfig) -> Result<()> {
        match self {
            WorkloadKind::Cpu => cpu::run(config).await,
            WorkloadKind::Memory => memory::run(config).await,
            WorkloadKind::Storage => storage::run(config).await,
            WorkloadKind::ObjectStore => object_store::run(config).await,
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
