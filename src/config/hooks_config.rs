use crate::errors::{AppError, ConfigError};
use crate::infrastructure::container::{registry, CreateContainerOptions};
use crate::logging::{init_logging, LogFormat, LoggingConfig, LoggingEnvironment};
use serde::Deserialize;
use std::{collections::HashMap, path::PathBuf, str::FromStr};
use tracing::Level;

use super::loader::ConfigLoader;

// Configuration location constants
pub const USER_CONFIG_PATH: &str = "~/.config/inject-hooks";
pub const CONFIG_FILE_NAME: &str = "config.toml";

// Environment overrides
pub const ENV_LOG_LEVEL: &str = "INJECT_HOOKS_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "INJECT_HOOKS_LOG_FORMAT";

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub logging: LoggingSection,
    /// Options used by provisioning calls that pass none of their own, once
    /// installed with [`HooksConfig::apply_provisioning`].
    pub provisioning: CreateContainerOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
    pub show_target: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            show_target: true,
        }
    }
}

impl LoggingSection {
    pub fn to_logging_config(&self) -> Result<LoggingConfig, ConfigError> {
        let level = Level::from_str(&self.level).map_err(|_| ConfigError::InvalidValue {
            field: "logging.level".to_string(),
            value: self.level.clone(),
        })?;
        Ok(LoggingConfig {
            environment: LoggingEnvironment::Development,
            level,
            format: self.format,
            show_target: self.show_target,
            show_thread_ids: false,
        })
    }
}

impl HooksConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration with custom base path (for testing)
    pub fn load_with_base_path(base_path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_base_path(base_path).load_config()
    }

    pub fn from_toml(content: &str, source: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(source.to_string(), e))
    }

    /// Apply environment overrides on top of file values.
    pub fn apply_env(&mut self, env_map: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(level) = env_map.get(ENV_LOG_LEVEL) {
            self.logging.level = level.clone();
        }
        if let Some(format) = env_map.get(ENV_LOG_FORMAT) {
            self.logging.format = match format.to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "compact" => LogFormat::Compact,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: ENV_LOG_FORMAT.to_string(),
                        value: format.clone(),
                    })
                }
            };
        }
        Ok(())
    }

    pub fn default_options(&self) -> CreateContainerOptions {
        self.provisioning
    }

    /// Make `[provisioning]` the fallback of every `ContainerInstance::of`
    /// and `use_container` call that passes no options.
    pub fn apply_provisioning(&self) {
        registry().set_default_options(self.provisioning);
    }

    /// Install the logging subscriber and the provisioning defaults.
    pub fn install(&self) -> Result<(), AppError> {
        init_logging(self.logging.to_logging_config()?)?;
        self.apply_provisioning();
        tracing::info!(options = ?self.provisioning, "Configuration installed");
        Ok(())
    }
}
