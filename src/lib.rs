//! A resource-stress harness that drives a machine's CPU, memory, and storage
//! (local filesystem and a remote S3-compatible object store) toward
//! configured utilization targets for a bounded duration.
//!
//! Every [`WorkloadKind`] runs in its own OS process. The CPU and memory
//! workloads are closed-loop regulators: they sample current system
//! utilization and throttle their own load generation so that aggregate usage
//! oscillates around the target instead of saturating. The storage workload
//! churns temporary directories with write/read cycles, and the object-store
//! workload seeds files across freshly created buckets and then perpetually
//! rotates each file round-robin through the buckets until the deadline.
//!
//! Fan-out below the top-level workloads (one spinner per CPU core, one
//! worker per storage process, one rotator per file) also uses OS processes:
//! the binary re-executes itself with an internal `worker` subcommand and
//! passes the worker's [`worker::WorkerSpec`] as JSON over stdin. Nothing is
//! shared between processes after spawn.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod cli;
pub mod config;
pub mod error;
pub mod observability;
pub mod payload;
pub mod remote;
pub mod runner;
pub mod sampler;
pub mod worker;
pub mod workloads;

pub use crate::config::StressConfig;
pub use crate::runner::Runner;
pub use crate::workloads::WorkloadKind;
