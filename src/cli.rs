//! Argument parsing and runtime bootstrap.

use std::io::Read;

use anyhow::{Context, Result};
use argh::FromArgs;

use crate::config::{ConfigSecret, ObjectStoreConfig, SizeRange, StorageConfig, StressConfig};
use crate::observability;
use crate::runner::Runner;
use crate::worker::{self, WorkerSpec};
use crate::workloads::WorkloadKind;

/// Resource stress harness for CPU, memory, local storage, and an
/// S3-compatible object store.
#[derive(Debug, FromArgs)]
struct Args {
    /// the command to execute
    #[argh(subcommand)]
    command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunCommand),
    Worker(WorkerCommand),
}

/// run the full workload-stress suite
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "run")]
struct RunCommand {
    /// how long each workload runs, in seconds
    #[argh(option, default = "60")]
    time: u64,

    /// target system-wide CPU utilization in percent
    #[argh(option, default = "80")]
    cpu: u8,

    /// target system-wide memory utilization in percent
    #[argh(option, default = "90")]
    ram: u8,

    /// object store endpoint, host:port or a full URL
    #[argh(option, default = "String::from(\"localhost:9000\")")]
    store_host: String,

    /// object store access key
    #[argh(option, default = "String::new()")]
    store_access_key: String,

    /// object store secret key
    #[argh(option, default = "String::new()")]
    store_secret_key: String,

    /// number of buckets to rotate files through
    #[argh(option, default = "3")]
    store_bucket_count: usize,

    /// number of files to keep rotating
    #[argh(option, default = "3")]
    store_file_count: usize,

    /// minimum object size in MB
    #[argh(option, default = "1")]
    store_min_size: u64,

    /// maximum object size in MB
    #[argh(option, default = "10")]
    store_max_size: u64,

    /// number of local-storage worker processes
    #[argh(option, default = "30")]
    storage_process_count: usize,

    /// files written per storage iteration
    #[argh(option, default = "10")]
    storage_file_count: usize,

    /// minimum storage file size in MB
    #[argh(option, default = "10")]
    storage_min_size: u64,

    /// maximum storage file size in MB
    #[argh(option, default = "100")]
    storage_max_size: u64,
}

impl RunCommand {
    /// Builds and validates the stress configuration.
    fn into_config(self) -> Result<StressConfig> {
        let config = StressConfig {
            duration_secs: self.time,
            cpu_target: self.cpu,
            ram_target: self.ram,
            object_store: ObjectStoreConfig {
                host: self.store_host,
                access_key: ConfigSecret::from(self.store_access_key),
                secret_key: ConfigSecret::from(self.store_secret_key),
                bucket_count: self.store_bucket_count,
                file_count: self.store_file_count,
                size_mb: SizeRange {
                    min_mb: self.store_min_size,
                    max_mb: self.store_max_size,
                },
            },
            storage: StorageConfig {
                process_count: self.storage_process_count,
                file_count: self.storage_file_count,
                size_mb: SizeRange {
                    min_mb: self.storage_min_size,
                    max_mb: self.storage_max_size,
                },
            },
        };
        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

/// internal: run a single worker process, reading its spec from stdin
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "worker")]
struct WorkerCommand {}

/// Bootstraps the runtime and executes the CLI command.
///
/// Interrupt handling deliberately stays at OS defaults: an external signal
/// kills the process tree the way the OS sees fit, there is no
/// application-level graceful shutdown.
pub fn execute() -> Result<()> {
    let args: Args = argh::from_env();

    observability::init_tracing();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let _runtime_guard = runtime.enter();

    match args.command {
        Command::Run(command) => {
            let config = command.into_config()?;
            tracing::info!(?config, "running workload-stress");

            runtime.block_on(Runner::new(WorkloadKind::all(), config).run())?;
            Ok(())
        }
        Command::Worker(WorkerCommand {}) => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read worker spec from stdin")?;
            let spec: WorkerSpec =
                serde_json::from_str(&raw).context("failed to parse worker spec")?;

            let role = spec.role();
            if let Err(err) = runtime.block_on(worker::dispatch(spec)) {
                tracing::error!(role, "worker failed: {err}");
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
