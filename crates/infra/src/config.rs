//! Emitted-stream bookkeeping configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_TRACK_EMITTED_STREAMS: &str = "LOGSWEEP_TRACK_EMITTED_STREAMS";
pub const ENV_CHECKPOINT_THRESHOLD: &str = "LOGSWEEP_CHECKPOINT_THRESHOLD";
pub const ENV_RETRY_LIMIT: &str = "LOGSWEEP_RETRY_LIMIT";

pub const DEFAULT_CHECKPOINT_THRESHOLD: u32 = 100;
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: cannot parse '{value}' as {expected}")]
    Parse {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for tracking and reclaiming a job's emitted streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclaimConfig {
    /// Record every emitted stream in the tracking log. When off, tracking
    /// makes no store calls at all.
    pub track_emitted_streams: bool,
    /// Deletions between two persisted checkpoints.
    pub checkpoint_threshold: u32,
    /// Retries per stream after the first failed delete.
    pub retry_limit: u32,
}

impl Default for ReclaimConfig {
    fn default() -> Self {
        Self {
            track_emitted_streams: true,
            checkpoint_threshold: DEFAULT_CHECKPOINT_THRESHOLD,
            retry_limit: DEFAULT_RETRY_LIMIT,
        }
    }
}

impl ReclaimConfig {
    pub fn with_tracking(mut self, enabled: bool) -> Self {
        self.track_emitted_streams = enabled;
        self
    }

    pub fn with_checkpoint_threshold(mut self, threshold: u32) -> Self {
        self.checkpoint_threshold = threshold;
        self
    }

    pub fn with_retry_limit(mut self, limit: u32) -> Self {
        self.retry_limit = limit;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.checkpoint_threshold == 0 {
            return Err(ConfigError::Invalid(
                "checkpoint_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load from `LOGSWEEP_*` environment variables; unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, config map, test fixture).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_TRACK_EMITTED_STREAMS) {
            config.track_emitted_streams = parse_bool(ENV_TRACK_EMITTED_STREAMS, &value)?;
        }
        if let Some(value) = lookup(ENV_CHECKPOINT_THRESHOLD) {
            config.checkpoint_threshold = parse_u32(ENV_CHECKPOINT_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_RETRY_LIMIT) {
            config.retry_limit = parse_u32(ENV_RETRY_LIMIT, &value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            key,
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Parse {
        key,
        value: value.to_string(),
        expected: "an unsigned integer",
    })
}
