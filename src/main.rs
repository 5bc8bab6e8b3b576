//! The workload-stress binary.
//!
//! All argument handling and runtime bootstrap lives in [`workload_stress::cli`].

fn main() -> anyhow::Result<()> {
    workload_stress::cli::execute()
}
