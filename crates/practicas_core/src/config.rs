//! Runtime configuration read from the environment.
//!
//! | Variable              | Default                              |
//! |-----------------------|--------------------------------------|
//! | `PRACTICAS_DB_PATH`   | `<temp dir>/practicas.sqlite3`       |
//! | `PRACTICAS_LOG_LEVEL` | `debug` (debug builds) / `info`      |
//! | `PRACTICAS_LOG_DIR`   | unset: log to stderr                 |
//! | `PRACTICAS_SEED_DEMO` | `true`                               |

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "PRACTICAS_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "PRACTICAS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "PRACTICAS_LOG_DIR";
pub const ENV_SEED_DEMO: &str = "PRACTICAS_SEED_DEMO";

const DEFAULT_DB_FILE: &str = "practicas.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
    /// Seed the demonstration accounts when `users` is absent.
    pub seed_demo_accounts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidBool { variable: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBool { variable, value } => {
                write!(f, "`{variable}` must be true/false/1/0, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            seed_demo_accounts: true,
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source; blank values count
    /// as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = get(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(value) = get(ENV_SEED_DEMO) {
            config.seed_demo_accounts = parse_bool(ENV_SEED_DEMO, &value)?;
        }
        Ok(config)
    }
}

fn parse_bool(variable: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            variable,
            value: value.to_string(),
        }),
    }
}
