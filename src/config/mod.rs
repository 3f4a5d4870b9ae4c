mod types;

pub use types::{
    AdditionalColumnsConfig, CoercionPolicy, Config, MutationErrorPolicy, SchemaConfig,
    ServerConfig, StoreBackend, StoreConfig,
};

use crate::error::{DynagraphError, Result};
use ::config::{Environment, File, FileFormat};
use std::fs;

/// Prefix of environment variables overriding file settings,
/// e.g. `DYNAGRAPH_SERVER__PORT=5000` or `DYNAGRAPH_STORE__ENDPOINT=...`
const ENV_PREFIX: &str = "DYNAGRAPH";

/// Load configuration from a TOML file, with environment overrides
pub fn load_config(path: &str) -> Result<Config> {
    load_with_environment(path, Environment::with_prefix(ENV_PREFIX))
}

fn load_with_environment(path: &str, environment: Environment) -> Result<Config> {
    let config: Config = ::config::Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            environment
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| DynagraphError::Config(format!("Failed to read config file '{}': {}", path, e)))?
        .try_deserialize()?;

    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    config.store.validate().map_err(DynagraphError::Config)?;

    for table in &config.table {
        table.validate().map_err(DynagraphError::Config)?;
    }

    if config.schema.mutation_error_attribute.is_empty() {
        return Err(DynagraphError::Config(
            "schema.mutation_error_attribute must not be empty".to_string(),
        ));
    }

    Ok(())
}

/// Save configuration to a TOML file
pub fn save_config(config: &Config, path: &str) -> Result<()> {
    validate(config)?;

    let toml_string = toml::to_string_pretty(config)?;
    fs::write(path, toml_string)
        .map_err(|e| DynagraphError::Config(format!("Failed to write config file '{}': {}", path, e)))?;

    Ok(())
}
