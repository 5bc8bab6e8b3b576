//! Error types for the stress harness.

use thiserror::Error;

/// A construction-time configuration invariant violation.
///
/// These are fatal: the harness reports them before spawning any process.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The stress duration is shorter than one second.
    #[error("duration must be at least 1 second")]
    Duration,

    /// A utilization target is outside of 1..=100.
    #[error("{0} target must be between 1 and 100 percent")]
    TargetPercent(&'static str),

    /// A required object-store connection value is empty.
    #[error("object store {0} must not be empty")]
    MissingValue(&'static str),

    /// Fewer than two buckets were requested, leaving nowhere to rotate to.
    #[error("bucket count must be at least 2")]
    BucketCount,

    /// A file or process count is zero.
    #[error("{0} count must be at least 1")]
    Count(&'static str),

    /// A size range is empty or starts below 1 MB.
    #[error("{0} size range requires 1 <= min < max (MB)")]
    SizeRange(&'static str),
}

/// Errors that can occur while a workload or one of its workers is running.
///
/// A failing workload never takes its siblings down: these errors are logged
/// at the worker boundary and terminate only the process they occurred in.
#[derive(Debug, Error)]
pub enum WorkloadError {
    /// The object-store credentials could not be constructed.
    ///
    /// Fatal for the object-store workload; no teardown is attempted since
    /// no connection ever existed.
    #[error("object store connection failed: {0}")]
    Connection(#[from] s3::creds::error::CredentialsError),

    /// An object-store operation failed mid-stress.
    #[error("object store operation failed: {0}")]
    ObjectStore(#[from] s3::error::S3Error),

    /// A filesystem or process-spawning failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker spec could not be encoded for the child process.
    #[error("failed to encode worker spec: {0}")]
    Encode(#[from] serde_json::Error),

    /// A blocking worker task panicked.
    #[error("worker task panicked: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result alias used throughout the workload implementations.
pub type Result<T, E = WorkloadError> = std::result::Result<T, E>;
