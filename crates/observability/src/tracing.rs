//! Tracing/logging initialization.
//!
//! Filters come from `RUST_LOG` when set, otherwise from the configured
//! default directive.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    pub default_directive: String,
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            format: LogFormat::Json,
        }
    }
}

impl ObservabilityConfig {
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }
}

/// Initialize tracing/logging for the process with JSON output.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let _ = try_init_with(&ObservabilityConfig::default());
}

/// Like [`init`], with an explicit configuration. Errors are swallowed.
pub fn init_with(config: &ObservabilityConfig) {
    let _ = try_init_with(config);
}

/// Install the global subscriber, reporting why it could not be installed
/// (usually: one is already installed).
pub fn try_init_with(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.default_directive)
            .with_context(|| format!("invalid filter directive '{}'", config.default_directive))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    match config.format {
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to install json subscriber"),
        LogFormat::Pretty => builder
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))
            .context("failed to install pretty subscriber"),
    }
}
