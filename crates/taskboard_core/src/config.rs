//! Layered configuration for the task board.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. TOML file (`taskboard.toml` in the working directory, or an explicit path)
//! 3. Environment variables prefixed `TASKBOARD_`, `__` separating sections
//!
//! `TASKBOARD_STORAGE__DB_PATH` maps to `storage.db_path`,
//! `TASKBOARD_LOGGING__LEVEL` to `logging.level`.

use crate::logging::{default_log_level, normalize_level};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_FILE: &str = "taskboard.toml";
const DEFAULT_DB_FILE: &str = "taskboard.sqlite3";
const ENV_PREFIX: &str = "TASKBOARD_";

#[derive(Debug)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    Figment(Box<figment::Error>),
    /// A field has an invalid value.
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "configuration error: {err}"),
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid configuration value for `{field}`: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err.as_ref()),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(Box::new(value))
    }
}

/// Durable store location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
        }
    }
}

/// File logging settings. Logging stays off when `log_dir` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BoardConfig {
    /// Loads defaults, `./taskboard.toml` when present, then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Same as [`BoardConfig::load`] with an explicit TOML path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path.as_ref()).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the provider chain. A missing TOML file is skipped.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Checks values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.db_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.db_path",
                reason: "cannot be empty".to_string(),
            });
        }
        normalize_level(&self.logging.level).map_err(|reason| ConfigError::InvalidValue {
            field: "logging.level",
            reason,
        })?;
        Ok(())
    }
}
