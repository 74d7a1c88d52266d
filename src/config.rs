//! Configuration types for backup-uplink
//!
//! All configuration is serde-deserializable with per-field defaults, so a
//! caller can supply a partial JSON/TOML document and get sensible behavior
//! for everything left out. Durations serialize as whole seconds.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration for the export-and-upload job
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    /// Directory where temporary export artifacts are created
    /// (default: system temp dir + "backup-uplink")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Wall-clock deadline since first enqueue after which no further
    /// attempt is permitted (default: 1 day)
    #[serde(default = "default_lifespan", with = "duration_serde")]
    pub lifespan: Duration,

    /// Chunk size for streaming the artifact to the remote endpoint.
    /// Bounds cancellation latency during large transfers (default: 64 KiB)
    #[serde(default = "default_upload_chunk_size")]
    pub upload_chunk_size: usize,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            lifespan: default_lifespan(),
            upload_chunk_size: default_upload_chunk_size(),
            retry: RetryConfig::default(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("backup-uplink")
}

fn default_lifespan() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_upload_chunk_size() -> usize {
    64 * 1024
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
