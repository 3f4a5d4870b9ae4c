/// Key-value store collaborator
///
/// The gateway talks to its backend only through the [`Store`] trait. Two
/// implementations ship with the crate: [`DynamoDbClient`] speaks the DynamoDB
/// JSON protocol over HTTP, and [`MemoryStore`] keeps tables in-process.

mod dynamodb;
mod memory;
mod value;

pub use dynamodb::DynamoDbClient;
pub use memory::MemoryStore;
pub use value::{AttributeValue, Row};

use crate::catalog::TableMetadata;
use crate::error::Result;
use async_trait::async_trait;
use indexmap::IndexMap;

/// One page of table names from `list_tables`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TablePage {
    pub names: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Indexed equality query against a table or one of its indexes
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table: String,
    pub index: Option<String>,
    pub key_condition_expression: String,
    pub values: IndexMap<String, AttributeValue>,
}

#[async_trait]
pub trait Store: Send + Sync {
    /// List one page of table names, starting after `page_token`
    async fn list_tables(&self, page_token: Option<String>) -> Result<TablePage>;

    async fn describe_table(&self, name: &str) -> Result<TableMetadata>;

    /// Read every item of a table. An empty projection returns all attributes.
    async fn scan(&self, table: &str, projection: &[String]) -> Result<Vec<Row>>;

    /// Read the items matching a key condition; all attributes are returned
    async fn query(&self, request: QueryRequest) -> Result<Vec<Row>>;

    /// Write an item, replacing any item with the same key, and return its new image
    async fn put_item(&self, table: &str, item: Row) -> Result<Row>;
}
