//! Engine configuration loaded from TOML.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - `retry.conflict_attempts` is at least one.

use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// SQLite file. In-memory database when absent.
    pub database_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub log_level: String,
    /// Absolute directory for rolling log files. Logging stays off when absent.
    pub log_dir: Option<PathBuf>,
    pub retry: RetryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5_000,
            log_level: default_log_level().to_string(),
            log_dir: None,
            retry: RetryConfig::default(),
        }
    }
}

/// Retry budget for service operations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts for an operation that keeps hitting conflicts.
    pub conflict_attempts: u32,
    /// Linear backoff step between conflict attempts.
    pub conflict_backoff_ms: u64,
    /// Extra attempts after a non-conflict storage failure.
    pub storage_retries: u32,
    /// Extra attempts for change-log appends before entries are dropped.
    /// Must be at least 1.
    pub change_log_retries: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            conflict_attempts: 3,
            conflict_backoff_ms: 25,
            storage_retries: 1,
            change_log_retries: 1,
        }
    }
}

impl RetryConfig {
    /// Sleep before the attempt following the `attempt`-th conflict.
    pub fn conflict_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.conflict_backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

/// Errors from loading engine configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config TOML: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl EngineConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.conflict_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.conflict_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.change_log_retries == 0 {
            return Err(ConfigError::Invalid(
                "retry.change_log_retries must be at least 1".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be blank".to_string()));
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    dir.display()
                )));
            }
        }
        Ok(())
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, EngineConfig};
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert_eq!(config.retry.conflict_attempts, 3);
    }

    #[test]
    fn backoff_grows_linearly() {
        let config = EngineConfig::default();
        assert_eq!(config.retry.conflict_backoff(1), Duration::from_millis(25));
        assert_eq!(config.retry.conflict_backoff(3), Duration::from_millis(75));
    }

    #[test]
    fn rejects_zero_conflict_attempts() {
        let err = EngineConfig::from_toml_str("[retry]\nconflict_attempts = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_change_log_retries() {
        let err = EngineConfig::from_toml_str("[retry]\nchange_log_retries = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref reason) if reason.contains("change_log")));
    }

    #[test]
    fn rejects_unknown_types() {
        let err = EngineConfig::from_toml_str("busy_timeout_ms = \"soon\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
