/// Table catalog
///
/// Metadata for every exposed table is collected once by a [`CatalogBuilder`]
/// (explicit registrations plus store discovery) and frozen into an immutable
/// [`TableCatalog`] before the schema is built.

mod discovery;
mod types;

pub use discovery::discover;
pub use types::{
    AdditionalColumn, AttributeDefinition, AttributeType, IndexDescriptor, IndexKind, KeyRole,
    KeySchemaElement, TableMetadata,
};

use crate::error::{DynagraphError, Result};
use crate::store::Store;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Read-only set of table metadata, keyed by table name
#[derive(Debug, Clone, Default)]
pub struct TableCatalog {
    tables: IndexMap<String, Arc<TableMetadata>>,
}

impl TableCatalog {
    pub fn get(&self, name: &str) -> Option<&Arc<TableMetadata>> {
        self.tables.get(name)
    }

    /// Tables in registration/discovery order
    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableMetadata>> {
        self.tables.values()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Mutable phase of the catalog lifecycle
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    tables: IndexMap<String, TableMetadata>,
    additional_columns: HashMap<String, Vec<AdditionalColumn>>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Externally declared columns, per table name
    pub fn with_additional_columns(
        mut self,
        columns: HashMap<String, Vec<AdditionalColumn>>,
    ) -> Self {
        self.additional_columns = columns;
        self
    }

    /// Add a table defined by configuration rather than discovered
    pub fn register(&mut self, metadata: TableMetadata) -> Result<()> {
        metadata.validate().map_err(DynagraphError::Config)?;
        if self.tables.contains_key(&metadata.name) {
            return Err(DynagraphError::Config(format!(
                "Table '{}' is registered twice",
                metadata.name
            )));
        }
        self.tables.insert(metadata.name.clone(), metadata);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Discover every table in the store, then freeze the catalog
    pub async fn discover(mut self, store: &dyn Store) -> Result<TableCatalog> {
        let discovered = discover(store, |name| self.is_registered(name)).await?;
        for metadata in discovered {
            self.tables.insert(metadata.name.clone(), metadata);
        }
        Ok(self.build())
    }

    /// Freeze the catalog without consulting the store
    pub fn build(self) -> TableCatalog {
        let additional_columns = self.additional_columns;
        let tables = self
            .tables
            .into_iter()
            .map(|(name, mut metadata)| {
                if let Some(columns) = additional_columns.get(&name) {
                    metadata.merge_additional_columns(columns);
                }
                (name, Arc::new(metadata))
            })
            .collect();

        TableCatalog { tables }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> TableMetadata {
        TableMetadata::new(
            name,
            vec![AttributeDefinition::new("Id", AttributeType::Number)],
            vec![KeySchemaElement::partition("Id")],
        )
    }

    #[test]
    fn test_register_and_build() {
        let mut builder = CatalogBuilder::new().with_additional_columns(HashMap::from([(
            "Animals".to_string(),
            vec![
                AdditionalColumn::new("Id", AttributeType::String),
                AdditionalColumn::new("Class", AttributeType::String),
            ],
        )]));
        builder.register(table("Animals")).unwrap();

        let catalog = builder.build();
        let animals = catalog.get("Animals").unwrap();

        assert_eq!(catalog.len(), 1);
        assert_eq!(animals.additional_columns.len(), 1);
        assert_eq!(animals.additional_columns[0].name, "Class");
    }

    #[test]
    fn test_register_twice_fails() {
        let mut builder = CatalogBuilder::new();
        builder.register(table("Animals")).unwrap();
        assert!(builder.register(table("Animals")).is_err());
    }

    #[test]
    fn test_register_invalid_metadata_fails() {
        let mut builder = CatalogBuilder::new();
        let mut invalid = table("Animals");
        invalid.key_schema = vec![KeySchemaElement::partition("Missing")];
        assert!(builder.register(invalid).is_err());
    }
}
