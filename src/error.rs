use thiserror::Error;

#[derive(Error, Debug)]
pub enum DynagraphError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Table or index not found: {0}")]
    TableNotFound(String),

    #[error("Table discovery failed: {0}")]
    Discovery(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Schema generation error: {0}")]
    SchemaGeneration(String),

    #[error("Invalid value for attribute '{attribute}': {reason}")]
    InvalidValue { attribute: String, reason: String },

    #[error("GraphQL schema is not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DynagraphError {
    fn from(err: toml::de::Error) -> Self {
        DynagraphError::Config(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for DynagraphError {
    fn from(err: toml::ser::Error) -> Self {
        DynagraphError::Serialization(format!("TOML serialization error: {}", err))
    }
}

impl From<serde_json::Error> for DynagraphError {
    fn from(err: serde_json::Error) -> Self {
        DynagraphError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<::config::ConfigError> for DynagraphError {
    fn from(err: ::config::ConfigError) -> Self {
        DynagraphError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DynagraphError>;
