//! Configuration file loading and parsing.

use crate::env::EnvError;
use crate::types::{ClientConfig, RATELIMIT_METHODS};
use regex::Regex;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error(transparent)]
    Env(#[from] EnvError),
}

const CONFIG_DIR: &str = ".tusk";
const CONFIG_FILE: &str = "config.yaml";

const ENV_VAR_PATTERN: &str = r"\$\{([^}:]+)(?::-([^}]*))?\}";

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads and writes.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Load configuration from `.tusk/config.yaml`.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<ClientConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(ClientConfig::default());
        }

        self.load_from(&config_path)
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(&self, path: &Path) -> Result<ClientConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let expanded = self.expand_env_vars(&contents)?;

        let config: ClientConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        self.validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = Regex::new(ENV_VAR_PATTERN).map_err(|e| ConfigError::ValidationError {
            message: e.to_string(),
        })?;

        for cap in re.captures_iter(content) {
            let full_match = &cap[0];
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match std::env::var(var_name) {
                Ok(v) => v,
                Err(_) => match default {
                    Some(d) => d.to_string(),
                    None => {
                        return Err(ConfigError::EnvVarNotFound {
                            var: var_name.to_string(),
                        })
                    }
                },
            };

            result = result.replace(full_match, &value);
        }

        Ok(result)
    }

    /// Validate configuration values.
    pub fn validate(&self, config: &ClientConfig) -> Result<(), ConfigError> {
        if config.api_base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "api_base_url must not be empty".to_string(),
            });
        }

        let method = config.ratelimit_method.to_lowercase();
        if !RATELIMIT_METHODS.contains(&method.as_str()) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "ratelimit_method must be one of {}",
                    RATELIMIT_METHODS.join(", ")
                ),
            });
        }

        if !config.ratelimit_pacefactor.is_finite() || config.ratelimit_pacefactor <= 0.0 {
            return Err(ConfigError::ValidationError {
                message: "ratelimit_pacefactor must be greater than 0".to_string(),
            });
        }

        if !config.request_timeout_secs.is_finite() || config.request_timeout_secs <= 0.0 {
            return Err(ConfigError::ValidationError {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &ClientConfig) -> Result<(), ConfigError> {
        let config_dir = self.base_path.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(self.config_path(), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}
