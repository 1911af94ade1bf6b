//! Configuration types for Tusk.
//!
//! A client session can be described by a `.tusk/config.yaml` file,
//! `TUSK_*` environment variables, or both (environment wins).

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;

/// Load `.tusk/config.yaml` under `project_dir`, apply `TUSK_*` overrides and validate.
pub fn load_config(project_dir: impl AsRef<std::path::Path>) -> Result<ClientConfig, ConfigError> {
    let loader = ConfigLoader::new(project_dir);
    let mut config = match Environment::get(vars::TUSK_CONFIG_PATH) {
        Some(path) => loader.load_from(std::path::Path::new(&path))?,
        None => loader.load()?,
    };
    config.apply_env()?;
    loader.validate(&config)?;
    Ok(config)
}
