//! Engine configuration
//!
//! Loaded from a JSON file; every key is optional and falls back to its
//! default. Environment overrides are applied on top:
//!
//! - `SATYA_PARALLEL_THRESHOLD`
//! - `SATYA_MICRO_BATCH_SIZE`
//! - `SATYA_STRICT`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::batch::{BatchConfig, DEFAULT_MICRO_BATCH_SIZE, DEFAULT_PARALLEL_THRESHOLD};
use crate::observability::Event;
use crate::validation::{ErrorPolicy, ValidationOptions};

pub const ENV_PARALLEL_THRESHOLD: &str = "SATYA_PARALLEL_THRESHOLD";
pub const ENV_MICRO_BATCH_SIZE: &str = "SATYA_MICRO_BATCH_SIZE";
pub const ENV_STRICT: &str = "SATYA_STRICT";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Batches with at least this many items run in parallel (default 1000)
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,

    /// Items per parallel chunk (default 512)
    #[serde(default = "default_micro_batch_size")]
    pub micro_batch_size: usize,

    /// Worker thread cap, 0 = available parallelism
    #[serde(default)]
    pub max_workers: usize,

    /// "accumulate" or "fail_fast" (default "accumulate")
    #[serde(default)]
    pub error_policy: ErrorPolicy,

    /// Reject undeclared keys (default false)
    #[serde(default)]
    pub strict: bool,
}

fn default_parallel_threshold() -> usize {
    DEFAULT_PARALLEL_THRESHOLD
}

fn default_micro_batch_size() -> usize {
    DEFAULT_MICRO_BATCH_SIZE
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
            micro_batch_size: default_micro_batch_size(),
            max_workers: 0,
            error_policy: ErrorPolicy::default(),
            strict: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::info!(event = %Event::ConfigLoaded, path = %path.display());
        Ok(config)
    }

    /// Applies `SATYA_*` environment variables on top of this config.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_PARALLEL_THRESHOLD) {
            self.parallel_threshold = parse_size(ENV_PARALLEL_THRESHOLD, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MICRO_BATCH_SIZE) {
            self.micro_batch_size = parse_size(ENV_MICRO_BATCH_SIZE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STRICT) {
            self.strict = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(ConfigError::Invalid(format!(
                        "{} must be a boolean, got '{}'",
                        ENV_STRICT, other
                    )))
                }
            };
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.parallel_threshold == 0 {
            return Err(ConfigError::Invalid("parallel_threshold must be > 0".into()));
        }
        if self.micro_batch_size == 0 {
            return Err(ConfigError::Invalid("micro_batch_size must be > 0".into()));
        }
        Ok(())
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions {
            strict: self.strict,
            error_policy: self.error_policy,
        }
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            parallel_threshold: self.parallel_threshold,
            micro_batch_size: self.micro_batch_size,
            max_workers: self.max_workers,
            options: self.validation_options(),
        }
    }
}

fn parse_size(key: &str, raw: &str) -> ConfigResult<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|e| ConfigError::Invalid(format!("{} must be a positive integer: {}", key, e)))
}
