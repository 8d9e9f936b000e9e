use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    BehaviorSettings, CacheSettings, Config, DatabaseSettings, LogFormat, LoggingSettings,
    NarratorSettings, ServerSettings,
};

/// Prefix for environment overrides, e.g. `EDGEIQ__DATABASE__URL`.
const ENV_PREFIX: &str = "EDGEIQ";

/// Loads the application configuration from `config.toml` in the working directory.
///
/// The file is optional: every section falls back to its defaults, and any
/// value can be overridden through `EDGEIQ__<SECTION>__<KEY>` environment variables.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Loads the configuration from an explicit file path, applying the same
/// environment overrides and validation as [`load_config`].
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    tracing::debug!(path = %path.display(), "Configuration loaded.");
    Ok(config)
}
