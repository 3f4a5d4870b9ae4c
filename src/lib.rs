pub mod catalog;
pub mod config;
pub mod error;
pub mod schema;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use catalog::{CatalogBuilder, TableCatalog, TableMetadata};
pub use config::{Config, SchemaConfig, ServerConfig, StoreConfig};
pub use error::{DynagraphError, Result};
pub use schema::{SchemaBuilder, SchemaState};
pub use store::{DynamoDbClient, MemoryStore, Store};
