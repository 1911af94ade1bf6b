//! Environment variable handling.

use crate::types::ClientConfig;
use std::env;
use thiserror::Error;

/// Environment variable errors.
#[derive(Debug, Error)]
pub enum EnvError {
    #[error("required environment variable not set: {var}")]
    NotSet { var: String },

    #[error("invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("failed to load .env file: {0}")]
    DotenvError(#[from] dotenvy::Error),
}

/// Environment variable names.
pub mod vars {
    // Session
    pub const TUSK_API_BASE_URL: &str = "TUSK_API_BASE_URL";
    pub const TUSK_CLIENT_ID: &str = "TUSK_CLIENT_ID";
    pub const TUSK_CLIENT_SECRET: &str = "TUSK_CLIENT_SECRET";
    pub const TUSK_ACCESS_TOKEN: &str = "TUSK_ACCESS_TOKEN";

    // Rate limiting
    pub const TUSK_RATELIMIT_METHOD: &str = "TUSK_RATELIMIT_METHOD";
    pub const TUSK_RATELIMIT_PACEFACTOR: &str = "TUSK_RATELIMIT_PACEFACTOR";
    pub const TUSK_REQUEST_TIMEOUT: &str = "TUSK_REQUEST_TIMEOUT";

    // Loader
    pub const TUSK_CONFIG_PATH: &str = "TUSK_CONFIG_PATH";
    pub const TUSK_ENV: &str = "TUSK_ENV";
}

/// Environment configuration.
pub struct Environment {
    _guard: (),
}

impl Environment {
    /// Initialize environment from .env files.
    pub fn init() -> Result<Self, EnvError> {
        // Later files override earlier ones
        let _ = dotenvy::from_filename(".env");
        let _ = dotenvy::from_filename(".env.local");

        if let Ok(env) = env::var(vars::TUSK_ENV) {
            let _ = dotenvy::from_filename(format!(".env.{}", env));
        }

        Ok(Self { _guard: () })
    }

    /// Get a required string variable.
    pub fn require(var: &str) -> Result<String, EnvError> {
        env::var(var).map_err(|_| EnvError::NotSet {
            var: var.to_string(),
        })
    }

    /// Get an optional string variable.
    pub fn get(var: &str) -> Option<String> {
        env::var(var).ok()
    }

    /// Get a variable with a default value.
    pub fn get_or(var: &str, default: &str) -> String {
        env::var(var).unwrap_or_else(|_| default.to_string())
    }

    /// Get a boolean variable.
    pub fn get_bool(var: &str) -> Option<bool> {
        env::var(var)
            .ok()
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
    }

    /// Get a numeric variable.
    pub fn get_num<T: std::str::FromStr>(var: &str) -> Result<Option<T>, EnvError> {
        match env::var(var) {
            Ok(v) => v.trim().parse().map(Some).map_err(|_| EnvError::InvalidValue {
                var: var.to_string(),
                message: format!("expected a number, got {v:?}"),
            }),
            Err(_) => Ok(None),
        }
    }
}

impl ClientConfig {
    /// Override fields from `TUSK_*` environment variables.
    pub fn apply_env(&mut self) -> Result<(), EnvError> {
        if let Some(url) = Environment::get(vars::TUSK_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Some(id) = Environment::get(vars::TUSK_CLIENT_ID) {
            self.client_id = Some(id);
        }
        if let Some(secret) = Environment::get(vars::TUSK_CLIENT_SECRET) {
            self.client_secret = Some(secret);
        }
        if let Some(token) = Environment::get(vars::TUSK_ACCESS_TOKEN) {
            self.access_token = Some(token);
        }
        if let Some(method) = Environment::get(vars::TUSK_RATELIMIT_METHOD) {
            self.ratelimit_method = method;
        }
        if let Some(factor) = Environment::get_num(vars::TUSK_RATELIMIT_PACEFACTOR)? {
            self.ratelimit_pacefactor = factor;
        }
        if let Some(timeout) = Environment::get_num(vars::TUSK_REQUEST_TIMEOUT)? {
            self.request_timeout_secs = timeout;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_default() {
        let val = Environment::get_or("TUSK_NONEXISTENT_VAR_12345", "default");
        assert_eq!(val, "default");
    }

    #[test]
    fn test_require_missing() {
        match Environment::require("TUSK_NONEXISTENT_VAR_67890") {
            Err(EnvError::NotSet { var }) => assert_eq!(var, "TUSK_NONEXISTENT_VAR_67890"),
            other => panic!("Expected NotSet, got {other:?}"),
        }
    }

    #[test]
    fn test_bool_parsing() {
        env::set_var("TUSK_TEST_BOOL", "true");
        assert_eq!(Environment::get_bool("TUSK_TEST_BOOL"), Some(true));
        env::set_var("TUSK_TEST_BOOL", "1");
        assert_eq!(Environment::get_bool("TUSK_TEST_BOOL"), Some(true));
        env::set_var("TUSK_TEST_BOOL", "false");
        assert_eq!(Environment::get_bool("TUSK_TEST_BOOL"), Some(false));
        env::remove_var("TUSK_TEST_BOOL");
    }

    #[test]
    fn test_number_parsing() {
        env::set_var("TUSK_TEST_NUM", "1.5");
        let val: Result<Option<f64>, _> = Environment::get_num("TUSK_TEST_NUM");
        assert_eq!(val.unwrap(), Some(1.5));

        env::set_var("TUSK_TEST_NUM", "fast");
        let val: Result<Option<f64>, _> = Environment::get_num("TUSK_TEST_NUM");
        assert!(val.is_err());

        env::remove_var("TUSK_TEST_NUM");
        let val: Result<Option<f64>, _> = Environment::get_num("TUSK_TEST_NUM");
        assert_eq!(val.unwrap(), None);
    }

    // All TUSK_* session variables are exercised in one test so they cannot race.
    #[test]
    fn test_apply_env_overrides() {
        let session_vars = [
            vars::TUSK_API_BASE_URL,
            vars::TUSK_CLIENT_ID,
            vars::TUSK_CLIENT_SECRET,
            vars::TUSK_ACCESS_TOKEN,
            vars::TUSK_RATELIMIT_METHOD,
            vars::TUSK_RATELIMIT_PACEFACTOR,
            vars::TUSK_REQUEST_TIMEOUT,
        ];
        let saved: Vec<_> = session_vars.iter().map(|v| (*v, env::var(v).ok())).collect();

        env::set_var(vars::TUSK_API_BASE_URL, "https://env.social");
        env::set_var(vars::TUSK_CLIENT_ID, "ID123");
        env::set_var(vars::TUSK_CLIENT_SECRET, "SECRET456");
        env::set_var(vars::TUSK_ACCESS_TOKEN, "tok");
        env::set_var(vars::TUSK_RATELIMIT_METHOD, "pace");
        env::set_var(vars::TUSK_RATELIMIT_PACEFACTOR, "2.5");
        env::set_var(vars::TUSK_REQUEST_TIMEOUT, "30");

        let mut config = ClientConfig::default();
        config.apply_env().unwrap();
        assert_eq!(config.api_base_url, "https://env.social");
        assert_eq!(config.client_id.as_deref(), Some("ID123"));
        assert_eq!(config.client_secret.as_deref(), Some("SECRET456"));
        assert_eq!(config.access_token.as_deref(), Some("tok"));
        assert_eq!(config.ratelimit_method, "pace");
        assert_eq!(config.ratelimit_pacefactor, 2.5);
        assert_eq!(config.request_timeout_secs, 30.0);

        env::set_var(vars::TUSK_REQUEST_TIMEOUT, "soon");
        let mut config = ClientConfig::default();
        assert!(matches!(
            config.apply_env(),
            Err(EnvError::InvalidValue { .. })
        ));

        for (var, value) in saved {
            match value {
                Some(v) => env::set_var(var, v),
                None => env::remove_var(var),
            }
        }
    }

    #[test]
    fn test_environment_init() {
        // Succeeds without any .env files present
        assert!(Environment::init().is_ok());
    }

    #[test]
    fn test_dotenv_file_loading() {
        use std::fs;
        use tempfile::tempdir;

        let dir = tempdir().unwrap();
        let env_path = dir.path().join(".env.tusktest");
        fs::write(&env_path, "TUSK_DOTENV_TEST_VAR=from_dotenv\n").unwrap();

        env::remove_var("TUSK_DOTENV_TEST_VAR");
        dotenvy::from_path(&env_path).unwrap();

        assert_eq!(
            Environment::get("TUSK_DOTENV_TEST_VAR"),
            Some("from_dotenv".to_string())
        );
        env::remove_var("TUSK_DOTENV_TEST_VAR");
    }
}
