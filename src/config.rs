// Tutor configuration: JSON file, then environment overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_SEED_BASE, DEFAULT_TRACE_DAYS};

pub const ENV_TRACE_DAYS: &str = "PUMP_TUTOR_TRACE_DAYS";
pub const ENV_SEED_BASE: &str = "PUMP_TUTOR_SEED_BASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    /// Days per generated trace.
    pub trace_days: usize,
    /// Week `w` is generated from seed `seed_base + w`.
    pub seed_base: u64,
    pub log_filter: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        TutorConfig {
            trace_days: DEFAULT_TRACE_DAYS,
            seed_base: DEFAULT_SEED_BASE,
            log_filter: "info".to_string(),
        }
    }
}

impl TutorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: TutorConfig = serde_json::from_str(json)?;
        config.validated()
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Optional file, then `PUMP_TUTOR_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment-variable name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = lookup(ENV_TRACE_DAYS) {
            self.trace_days = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_TRACE_DAYS,
                reason: format!("'{}' is not a day count", raw),
            })?;
        }
        if let Some(raw) = lookup(ENV_SEED_BASE) {
            self.seed_base = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: ENV_SEED_BASE,
                reason: format!("'{}' is not a seed", raw),
            })?;
        }
        self.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.trace_days == 0 {
            return Err(ConfigError::Invalid {
                key: "trace_days",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}
