//! Configuration for the stress harness.
//!
//! A [`StressConfig`] is built once from CLI arguments, validated before any
//! process is spawned, and then passed by value to every workload. Worker
//! processes receive a copy of the already-validated configuration as part of
//! their spawn-time spec, so the whole struct is serializable.

use std::fmt;
use std::time::Duration;

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Newtype around `String` that protects against accidental logging of
/// secrets in the configuration struct.
///
/// Only `Debug` redacts; serialization keeps the real value, since worker
/// processes need the credentials to connect.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSecret(String);

impl ConfigSecret {
    /// Returns the secret value.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the secret is the empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for ConfigSecret {
    fn from(value: String) -> Self {
        ConfigSecret(value)
    }
}

impl fmt::Debug for ConfigSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[redacted]")
    }
}

/// An inclusive file-size range in megabytes, sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    /// Smallest size to generate, in MB.
    pub min_mb: u64,
    /// Largest size to generate, in MB.
    pub max_mb: u64,
}

impl SizeRange {
    /// Samples a size in megabytes from the range.
    pub fn sample(&self, rng: &mut SmallRng) -> u64 {
        rng.random_range(self.min_mb..=self.max_mb)
    }

    fn validate(&self, what: &'static str) -> Result<(), ConfigError> {
        if self.min_mb < 1 || self.min_mb >= self.max_mb {
            return Err(ConfigError::SizeRange(what));
        }
        Ok(())
    }
}

/// Connection and workload parameters for the object-store stress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Object store endpoint, either `host:port` or a full URL.
    pub host: String,
    /// Access key for the object store.
    pub access_key: ConfigSecret,
    /// Secret key for the object store.
    pub secret_key: ConfigSecret,
    /// Number of buckets to rotate files through. At least 2, otherwise
    /// there is nowhere to move a file to.
    pub bucket_count: usize,
    /// Number of files to create and keep rotating.
    pub file_count: usize,
    /// Size range for the generated files.
    pub size_mb: SizeRange,
}

/// Parameters for the local filesystem stress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Number of independent worker processes to fan out.
    pub process_count: usize,
    /// Files written (and read back) per iteration in each worker.
    pub file_count: usize,
    /// Size range for the generated files.
    pub size_mb: SizeRange,
}

/// Immutable configuration shared by all workloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StressConfig {
    /// How long each workload keeps generating load, in seconds.
    pub duration_secs: u64,
    /// Target system-wide CPU utilization in percent.
    pub cpu_target: u8,
    /// Target system-wide memory utilization in percent.
    pub ram_target: u8,
    /// Object-store workload parameters.
    pub object_store: ObjectStoreConfig,
    /// Local-storage workload parameters.
    pub storage: StorageConfig,
}

impl StressConfig {
    /// The configured stress duration.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Checks every construction-time invariant.
    ///
    /// A violation is a fatal configuration error; the harness refuses to
    /// spawn any process for an invalid configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_secs < 1 {
            return Err(ConfigError::Duration);
        }
        if !(1..=100).contains(&self.cpu_target) {
            return Err(ConfigError::TargetPercent("cpu"));
        }
        if !(1..=100).contains(&self.ram_target) {
            return Err(ConfigError::TargetPercent("ram"));
        }

        let store = &self.object_store;
        if store.host.is_empty() {
            return Err(ConfigError::MissingValue("host"));
        }
        if store.access_key.is_empty() {
            return Err(ConfigError::MissingValue("access key"));
        }
        if store.secret_key.is_empty() {
            return Err(ConfigError::MissingValue("secret key"));
        }
        if store.bucket_count < 2 {
            return Err(ConfigError::BucketCount);
        }
        if store.file_count < 1 {
            return Err(ConfigError::Count("object store file"));
        }
        store.size_mb.validate("object store file")?;

        if self.storage.process_count < 1 {
            return Err(ConfigError::Count("storage process"));
        }
        if self.storage.file_count < 1 {
            return Err(ConfigError::Count("storage file"));
        }
        self.storage.size_mb.validate("storage file")?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> StressConfig {
    StressConfig {
        duration_secs: 1,
        cpu_target: 80,
        ram_target: 90,
        object_store: ObjectStoreConfig {
            host: "localhost:9000".into(),
            access_key: ConfigSecret::from("access".to_string()),
            secret_key: ConfigSecret::from("sekrit-value".to_string()),
            bucket_count: 3,
            file_count: 3,
            size_mb: SizeRange { min_mb: 1, max_mb: 10 },
        },
        storage: StorageConfig {
            process_count: 2,
            file_count: 2,
            size_mb: SizeRange { min_mb: 1, max_mb: 2 },
        },
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn valid_config_passes() {
        test_config().validate().unwrap();
    }

    #[test]
    fn duration_must_be_positive() {
        let mut config = test_config();
        config.duration_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Duration)));
    }

    #[test]
    fn targets_must_be_percentages() {
        let mut config = test_config();
        config.cpu_target = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TargetPercent("cpu"))
        ));

        let mut config = test_config();
        config.ram_target = 101;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TargetPercent("ram"))
        ));
    }

    #[test]
    fn object_store_connection_values_are_required() {
        let mut config = test_config();
        config.object_store.host.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue("host"))
        ));

        let mut config = test_config();
        config.object_store.secret_key = ConfigSecret::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue("secret key"))
        ));
    }

    #[test]
    fn rotation_needs_at_least_two_buckets() {
        let mut config = test_config();
        config.object_store.bucket_count = 1;
        assert!(matches!(config.validate(), Err(ConfigError::BucketCount)));
    }

    #[test]
    fn size_ranges_must_be_ordered() {
        let mut config = test_config();
        config.storage.size_mb = SizeRange { min_mb: 5, max_mb: 5 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SizeRange("storage file"))
        ));

        let mut config = test_config();
        config.object_store.size_mb = SizeRange { min_mb: 0, max_mb: 4 };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SizeRange("object store file"))
        ));
    }

    #[test]
    fn counts_must_be_positive() {
        let mut config = test_config();
        config.storage.process_count = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Count("storage process"))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = test_config();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sekrit-value"));
        assert!(rendered.contains("[redacted]"));
    }

    #[test]
    fn size_range_samples_within_bounds() {
        let range = SizeRange { min_mb: 3, max_mb: 7 };
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..100 {
            let size = range.sample(&mut rng);
            assert!((3..=7).contains(&size));
        }
    }
}
