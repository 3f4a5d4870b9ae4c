use dynagraph::catalog::{
    AdditionalColumn, AttributeDefinition, AttributeType, IndexDescriptor, KeySchemaElement,
    TableMetadata,
};
use dynagraph::config::{AdditionalColumnsConfig, Config, StoreBackend, StoreConfig};

/// The Animals table: numeric id and genus as its key, queryable by genus
fn animals_table() -> TableMetadata {
    let mut table = TableMetadata::new(
        "Animals",
        vec![
            AttributeDefinition::new("Id", AttributeType::Number),
            AttributeDefinition::new("Genus", AttributeType::String),
        ],
        vec![
            KeySchemaElement::partition("Id"),
            KeySchemaElement::sort("Genus"),
        ],
    );
    table.global_indexes.push(IndexDescriptor {
        name: "Animals_ByGenus".to_string(),
        key_schema: vec![KeySchemaElement::partition("Genus")],
        projected_non_key_attributes: Vec::new(),
    });
    table
}

/// Taxonomy columns the store does not define formally
fn animals_columns() -> Vec<AdditionalColumn> {
    vec![
        AdditionalColumn::new("Family", AttributeType::String),
        AdditionalColumn::new("Order", AttributeType::String),
        AdditionalColumn::new("Class", AttributeType::String),
        AdditionalColumn::new("ScientificName", AttributeType::String),
        AdditionalColumn::new("CommonNames", AttributeType::StringSet),
    ]
}

/// Example configuration serving the Animals table from the in-memory store
pub fn create_example_config() -> Config {
    Config {
        store: StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        },
        additional_columns: vec![AdditionalColumnsConfig {
            table: "Animals".to_string(),
            columns: animals_columns(),
        }],
        table: vec![animals_table()],
        ..Config::default()
    }
}
