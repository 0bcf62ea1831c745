use crate::errors::ConfigError;
use std::{collections::HashMap, env, fs, path::PathBuf};

use super::hooks_config::{HooksConfig, CONFIG_FILE_NAME, ENV_LOG_FORMAT, ENV_LOG_LEVEL, USER_CONFIG_PATH};

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self { base_path: None }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
        }
    }

    /// Load configuration. A missing file yields defaults; environment
    /// overrides are applied last.
    pub fn load_config(&self) -> Result<HooksConfig, ConfigError> {
        let config_path = self.config_path();
        let mut config = self.load_file(&config_path)?;
        config.apply_env(&self.collect_env_vars())?;
        Ok(config)
    }

    /// Path of the configuration file, with tilde expansion and base path override
    pub fn config_path(&self) -> PathBuf {
        let base = match &self.base_path {
            Some(base_path) => base_path.join(USER_CONFIG_PATH.trim_start_matches("~/")),
            None => PathBuf::from(shellexpand::tilde(USER_CONFIG_PATH).as_ref()),
        };
        base.join(CONFIG_FILE_NAME)
    }

    fn load_file(&self, path: &PathBuf) -> Result<HooksConfig, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(HooksConfig::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.display().to_string(), e))?;
        HooksConfig::from_toml(&content, &path.display().to_string())
    }

    fn collect_env_vars(&self) -> HashMap<String, String> {
        [ENV_LOG_LEVEL, ENV_LOG_FORMAT]
            .into_iter()
            .filter_map(|key| env::var(key).ok().map(|value| (key.to_string(), value)))
            .collect()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::container::OnFree;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_base_path(dir.path().to_path_buf());
        let config = loader.load_file(&loader.config_path()).unwrap();
        assert_eq!(config, HooksConfig::default());
    }

    #[test]
    fn test_loads_file_under_base_path() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_base_path(dir.path().to_path_buf());
        let path = loader.config_path();
        assert!(path.ends_with(".config/inject-hooks/config.toml"));

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[provisioning]\non-free = \"null\"\n").unwrap();

        let config = loader.load_file(&path).unwrap();
        assert_eq!(config.default_options().on_free, OnFree::Null);
    }

    #[test]
    fn test_malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_base_path(dir.path().to_path_buf());
        let path = loader.config_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[logging\nlevel=").unwrap();

        let err = loader.load_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(ref source, _) if source.ends_with("config.toml")));
    }
}
