//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate. Sources are merged
//! in order, later ones overriding earlier ones:
//!
//! 1. serde defaults of [`DispatchConfig`]
//! 2. `{dir}/dispatch.toml` (optional)
//! 3. `{dir}/dispatch.{environment}.toml` (optional)
//! 4. `DISPATCH__SECTION__KEY` environment variables

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::DispatchConfig;
use crate::constants::system;

/// Loaded and validated configuration
#[derive(Debug)]
pub struct ConfigManager {
    config: DispatchConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Load with an explicit set of override variables instead of the process
    /// environment; used by tests that must not touch global state
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);
        debug!(
            environment = %environment,
            config_directory = %config_directory.display(),
            "⚙️ CONFIG: Loading configuration"
        );

        let mut config = Self::load_and_merge_config(&config_directory, environment, overrides)?;
        config.environment = environment.to_string();
        config.validate()?;

        info!(
            environment = %environment,
            transport = ?config.event_bus.transport,
            workers = config.worker_pool.worker_count,
            execution_model = ?config.worker_pool.execution_model,
            "✅ CONFIG: Configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Environment from `DISPATCH_ENV`, defaulting to development
    pub fn detect_environment() -> String {
        env::var(system::ENVIRONMENT_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| system::DEFAULT_ENVIRONMENT.to_string())
    }

    fn default_config_directory() -> PathBuf {
        PathBuf::from(system::DEFAULT_CONFIG_DIR)
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
        overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<DispatchConfig> {
        let base_file = config_directory.join(format!("{}.toml", system::CONFIG_FILE_STEM));
        let env_file =
            config_directory.join(format!("{}.{environment}.toml", system::CONFIG_FILE_STEM));

        for path in [&base_file, &env_file] {
            if path.is_file() {
                debug!(file = %path.display(), "CONFIG: Found configuration file");
            }
        }

        let env_source = Environment::with_prefix(system::ENV_OVERRIDE_PREFIX)
            .prefix_separator(system::ENV_OVERRIDE_SEPARATOR)
            .separator(system::ENV_OVERRIDE_SEPARATOR)
            .try_parsing(true)
            .source(overrides);

        Config::builder()
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(env_source)
            .build()
            .and_then(|merged| merged.try_deserialize::<DispatchConfig>())
            .map_err(|e| ConfigurationError::load_error(environment, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_dir_with(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    fn load_isolated(dir: &Path) -> ConfigResult<Arc<ConfigManager>> {
        ConfigManager::load_with_overrides(Some(dir.to_path_buf()), "test", Some(HashMap::new()))
    }

    #[test]
    fn test_missing_directory_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let manager = load_isolated(&dir.path().join("absent")).unwrap();

        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().environment, "test");
        assert_eq!(manager.config().worker_pool.worker_count, 3);
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = config_dir_with(&[
            (
                "dispatch.toml",
                "[worker_pool]\nworker_count = 4\n\n[queue]\nname = \"orders\"\n",
            ),
            ("dispatch.test.toml", "[worker_pool]\nworker_count = 2\n"),
        ]);

        let manager = load_isolated(dir.path()).unwrap();

        assert_eq!(manager.config().worker_pool.worker_count, 2);
        assert_eq!(manager.config().queue.name, "orders");
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let dir = config_dir_with(&[("dispatch.toml", "[event_bus]\npoll_interval_ms = 0\n")]);

        let result = load_isolated(dir.path());

        assert!(matches!(result, Err(ConfigurationError::InvalidValue { .. })));
    }
}
