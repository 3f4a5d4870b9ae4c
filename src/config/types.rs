use crate::catalog::{AdditionalColumn, TableMetadata};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
    /// Columns not present in a table's formal attribute definitions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_columns: Vec<AdditionalColumnsConfig>,
    /// Tables defined by configuration rather than discovered
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub table: Vec<TableMetadata>,
}

impl Config {
    /// Additional columns keyed by table name
    pub fn additional_columns_by_table(&self) -> HashMap<String, Vec<AdditionalColumn>> {
        let mut by_table: HashMap<String, Vec<AdditionalColumn>> = HashMap::new();
        for entry in &self.additional_columns {
            by_table
                .entry(entry.table.clone())
                .or_default()
                .extend(entry.columns.iter().cloned());
        }
        by_table
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Dynamodb,
    Memory,
}

/// Store connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Store URL (e.g., "http://localhost:8000")
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_region")]
    pub region: String,

    /// Access key used in the request credential scope
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Table names requested per list-tables page
    #[serde(default = "default_list_page_size")]
    pub list_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            endpoint: default_endpoint(),
            region: default_region(),
            access_key_id: None,
            timeout_secs: default_timeout_secs(),
            list_page_size: default_list_page_size(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:8000".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_list_page_size() -> usize {
    100
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind the server to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Interface to bind the server to
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    4000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

/// How argument values are turned into store values on the key-condition
/// and put-item paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Every value becomes a string (`S`) regardless of the declared type
    #[default]
    String,
    /// Values take the attribute's declared type; unknown attributes become strings
    Declared,
}

/// How put-item failures surface in mutation responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationErrorPolicy {
    /// The failure message is returned as data in a synthetic row
    #[default]
    Data,
    /// The failure is a field-level GraphQL error, like read failures
    Field,
}

/// Schema synthesis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub value_coercion: CoercionPolicy,

    #[serde(default)]
    pub mutation_errors: MutationErrorPolicy,

    /// Attribute of the synthetic row that carries a put-item failure message
    #[serde(default = "default_mutation_error_attribute")]
    pub mutation_error_attribute: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            value_coercion: CoercionPolicy::default(),
            mutation_errors: MutationErrorPolicy::default(),
            mutation_error_attribute: default_mutation_error_attribute(),
        }
    }
}

fn default_mutation_error_attribute() -> String {
    "Order".to_string()
}

/// Additional columns for one table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalColumnsConfig {
    pub table: String,
    pub columns: Vec<AdditionalColumn>,
}

impl StoreConfig {
    /// Validate store configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::Dynamodb
            && !self.endpoint.starts_with("http://")
            && !self.endpoint.starts_with("https://")
        {
            return Err(format!(
                "Store endpoint '{}' must be a valid URL (http:// or https://)",
                self.endpoint
            ));
        }

        if self.timeout_secs == 0 {
            return Err("Store timeout_secs must be greater than zero".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AttributeType;

    #[test]
    fn test_store_validation_valid() {
        assert!(StoreConfig::default().validate().is_ok());
    }

    #[test]
    fn test_store_validation_invalid_endpoint() {
        let store = StoreConfig {
            endpoint: "localhost:8000".to_string(),
            ..StoreConfig::default()
        };

        assert!(store.validate().is_err());
    }

    #[test]
    fn test_memory_backend_ignores_endpoint() {
        let store = StoreConfig {
            backend: StoreBackend::Memory,
            endpoint: String::new(),
            ..StoreConfig::default()
        };

        assert!(store.validate().is_ok());
    }

    #[test]
    fn test_schema_defaults_preserve_compatibility() {
        let schema = SchemaConfig::default();

        assert_eq!(schema.value_coercion, CoercionPolicy::String);
        assert_eq!(schema.mutation_errors, MutationErrorPolicy::Data);
        assert_eq!(schema.mutation_error_attribute, "Order");
    }

    #[test]
    fn test_additional_columns_grouped_by_table() {
        let config = Config {
            additional_columns: vec![
                AdditionalColumnsConfig {
                    table: "Animals".to_string(),
                    columns: vec![AdditionalColumn::new("Family", AttributeType::String)],
                },
                AdditionalColumnsConfig {
                    table: "Animals".to_string(),
                    columns: vec![AdditionalColumn::new("CommonNames", AttributeType::StringSet)],
                },
            ],
            ..Config::default()
        };

        let by_table = config.additional_columns_by_table();
        assert_eq!(by_table["Animals"].len(), 2);
    }
}
