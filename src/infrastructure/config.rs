//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Embedded defaults
//! 2. An optional config file (`toml`, `json` or `yaml`, chosen by extension)
//! 3. `SHOWTIME__*` environment variables, e.g. `SHOWTIME__LOGGING__LEVEL=debug`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::infrastructure::parsing::config::{DateConfig, IterationCap};

pub const ENV_PREFIX: &str = "SHOWTIME";
const ENV_SEPARATOR: &str = "__";

const DEFAULT_TOML: &str = r#"
[date]
date_format = "YYYY-MM-DD"
date_locale = "en"
preserve_year = false

[logging]
level = "info"
json_format = false
console_output = true
file_output = false
log_directory = "logs"
file_prefix = "showtime-scraper"

[logging.module_filters]
html5ever = "warn"
selectors = "warn"
"#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete scraper configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Operator cap on every list and table iteration; absent means unbounded
    #[serde(default)]
    pub iteration_limit: Option<usize>,

    /// Date settings used when a field does not bring its own
    #[serde(default)]
    pub date: DateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,

    /// Enable the daily rolling log file
    pub file_output: bool,

    pub log_directory: PathBuf,

    /// File name prefix of the rolling log file
    pub file_prefix: String,

    /// Per-target levels (e.g. "html5ever": "warn")
    #[serde(default)]
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_directory: PathBuf::from("logs"),
            file_prefix: "showtime-scraper".to_string(),
            module_filters: HashMap::from([
                ("html5ever".to_string(), "warn".to_string()),
                ("selectors".to_string(), "warn".to_string()),
            ]),
        }
    }
}

impl ScraperConfig {
    /// Load defaults, the optional file at `path` and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, environment())
    }

    /// Load from a file that must exist
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml))
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!("Loaded scraper config from {}", path.display());
        Ok(config)
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        let settings = builder.add_source(env).build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.iteration_limit == Some(0) {
            return Err(ConfigError::Validation {
                message: "iteration_limit must be greater than 0".to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "logging.level must not be empty".to_string(),
            });
        }

        if self.date.date_format.as_slice().iter().any(|f| f.trim().is_empty()) {
            return Err(ConfigError::Validation {
                message: "date.date_format entries must not be empty".to_string(),
            });
        }

        Ok(())
    }

    pub fn iteration_cap(&self) -> IterationCap {
        IterationCap(self.iteration_limit)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}
