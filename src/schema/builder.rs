/// GraphQL schema builder
///
/// This module provides the `SchemaBuilder` which generates a complete GraphQL
/// schema from a frozen [`TableCatalog`]: one namespace field per table on the
/// Query root and one `create<Table>` field per table on the Mutation root.

use crate::catalog::{AdditionalColumn, AttributeDefinition, TableCatalog, TableMetadata};
use crate::config::{MutationErrorPolicy, SchemaConfig};
use crate::error::{DynagraphError, Result};
use crate::schema::arguments::key_arguments;
use crate::schema::resolver::{create_index_resolver, create_put_resolver, create_scan_resolver};
use crate::schema::type_mapping::{is_valid_graphql_name, map_input, map_output, FieldDescriptor};
use crate::store::Store;

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, Object, Schema, TypeRef,
};
use std::collections::HashSet;
use std::sync::Arc;

const QUERY_TYPE: &str = "Query";
const MUTATION_TYPE: &str = "Mutation";

/// Type names that are taken before any table is synthesized
const RESERVED_TYPE_NAMES: &[&str] = &[
    QUERY_TYPE,
    MUTATION_TYPE,
    TypeRef::STRING,
    TypeRef::FLOAT,
    TypeRef::INT,
    TypeRef::BOOLEAN,
    TypeRef::ID,
];

/// Field descriptors for a row type: formal attributes first, then the
/// additional columns not already present.
///
/// Attributes of unsupported store types, and names that cannot be GraphQL
/// field names, are left out with a warning.
pub fn synthesize_fields(
    attribute_definitions: &[AttributeDefinition],
    additional_columns: &[AdditionalColumn],
) -> Vec<FieldDescriptor> {
    let mut fields: Vec<FieldDescriptor> = Vec::new();

    let formal = attribute_definitions.iter().filter_map(|definition| {
        match definition.attribute_type() {
            Some(attribute_type) => Some((definition.name.as_str(), attribute_type)),
            None => {
                tracing::warn!(
                    "Omitting attribute '{}': unsupported store type '{}'",
                    definition.name,
                    definition.type_code
                );
                None
            }
        }
    });
    let additional = additional_columns
        .iter()
        .map(|column| (column.name.as_str(), column.attribute_type));

    for (name, attribute_type) in formal.chain(additional) {
        if fields.iter().any(|f| f.name == name) {
            continue;
        }
        if !is_valid_graphql_name(name) {
            tracing::warn!("Omitting attribute '{}': not a valid GraphQL name", name);
            continue;
        }
        fields.push(map_output(name, attribute_type));
    }

    fields
}

/// Output object type whose fields read attributes out of a row
pub fn build_object_type(type_name: &str, fields: &[FieldDescriptor]) -> Object {
    fields
        .iter()
        .cloned()
        .fold(Object::new(type_name), |object, field| {
            object.field(field.into_output_field())
        })
}

/// Input object type with one optional field per attribute
pub fn build_input_type(type_name: &str, fields: &[FieldDescriptor]) -> InputObject {
    fields.iter().fold(InputObject::new(type_name), |input, field| {
        input.field(map_input(&field.name, field.attribute_type).into_input_value())
    })
}

/// Schema builder for generating GraphQL schemas from table metadata
pub struct SchemaBuilder {
    store: Arc<dyn Store>,
    settings: SchemaConfig,
}

/// Every GraphQL type synthesized for one table
struct TableTypes {
    query_field: Field,
    mutation_field: Field,
    objects: Vec<Object>,
    input: InputObject,
}

impl SchemaBuilder {
    /// Create a new schema builder resolving against `store`
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            settings: SchemaConfig::default(),
        }
    }

    pub fn with_settings(mut self, settings: SchemaConfig) -> Self {
        self.settings = settings;
        self
    }

    /// Build complete GraphQL schema from the catalog
    ///
    /// # Arguments
    ///
    /// * `catalog` - Frozen table catalog
    ///
    /// # Returns
    ///
    /// A dynamic GraphQL schema with query and mutation resolvers
    pub fn build_schema(&self, catalog: &TableCatalog) -> Result<Schema> {
        let mut claimed: HashSet<String> =
            RESERVED_TYPE_NAMES.iter().map(|name| name.to_string()).collect();

        let mut query = Object::new(QUERY_TYPE);
        let mut mutation = Object::new(MUTATION_TYPE);
        let mut objects = Vec::new();
        let mut inputs = Vec::new();

        for table in catalog.tables() {
            let Some(types) = self.build_table_types(table, &mut claimed)? else {
                continue;
            };

            tracing::info!("Building schema for table: {}", table.name);
            query = query.field(types.query_field);
            mutation = mutation.field(types.mutation_field);
            objects.extend(types.objects);
            inputs.push(types.input);
        }

        if objects.is_empty() {
            return Err(DynagraphError::SchemaGeneration(
                "No exposable tables in catalog".to_string(),
            ));
        }

        let mut schema_builder = Schema::build(QUERY_TYPE, Some(MUTATION_TYPE), None);

        for object in objects {
            schema_builder = schema_builder.register(object);
        }
        for input in inputs {
            schema_builder = schema_builder.register(input);
        }

        let schema = schema_builder
            .register(query)
            .register(mutation)
            .data(self.store.clone())
            .finish()
            .map_err(|e| {
                DynagraphError::SchemaGeneration(format!("Failed to build schema: {}", e))
            })?;

        Ok(schema)
    }

    /// Synthesize the namespace, row, index and input types of one table.
    ///
    /// Returns `None` when the table cannot be exposed.
    fn build_table_types(
        &self,
        table: &Arc<TableMetadata>,
        claimed: &mut HashSet<String>,
    ) -> Result<Option<TableTypes>> {
        if !is_valid_graphql_name(&table.name) {
            tracing::warn!("Skipping table '{}': not a valid GraphQL name", table.name);
            return Ok(None);
        }

        let fields = synthesize_fields(&table.attribute_definitions, &table.additional_columns);
        if fields.is_empty() {
            tracing::warn!("Skipping table '{}': no exposable attributes", table.name);
            return Ok(None);
        }

        let row_type = format!("{}_scan", table.name);
        let input_type = format!("create{}", table.name);
        claim(claimed, &table.name)?;
        claim(claimed, &row_type)?;
        claim(claimed, &input_type)?;

        let scan_arguments = key_arguments(table, &table.key_schema, &[]);
        let mut namespace = Object::new(&table.name).field(create_scan_resolver(
            table.clone(),
            &row_type,
            scan_arguments,
        ));
        let mut objects = vec![build_object_type(&row_type, &fields)];

        for (_, index) in table.indexes() {
            if !is_valid_graphql_name(&index.name) || index.name == "_scan" {
                tracing::warn!(
                    "Skipping index '{}' on table '{}': not a usable GraphQL name",
                    index.name,
                    table.name
                );
                continue;
            }
            claim(claimed, &index.name)?;

            let arguments =
                key_arguments(table, &index.key_schema, &index.projected_non_key_attributes);
            namespace = namespace.field(create_index_resolver(
                table.clone(),
                &index.name,
                &index.name,
                arguments,
                &self.settings,
            ));
            objects.push(build_object_type(&index.name, &fields));
        }
        objects.push(namespace);

        let query_field = Field::new(&table.name, TypeRef::named(&table.name), |_| {
            // the namespace carries no data; its fields resolve from captured metadata
            FieldFuture::new(async move { Ok(Some(FieldValue::owned_any(()))) })
        });
        let mutation_field = create_put_resolver(
            table.clone(),
            &input_type,
            &row_type,
            &self.put_settings(table, &fields),
        );

        Ok(Some(TableTypes {
            query_field,
            mutation_field,
            objects,
            input: build_input_type(&input_type, &fields),
        }))
    }

    /// Settings for a table's put field.
    ///
    /// Failures reported as data need a row field to carry the message; tables
    /// without one report them as field errors instead.
    fn put_settings(&self, table: &TableMetadata, fields: &[FieldDescriptor]) -> SchemaConfig {
        let mut settings = self.settings.clone();
        let attribute = &settings.mutation_error_attribute;
        if settings.mutation_errors == MutationErrorPolicy::Data
            && !fields.iter().any(|f| &f.name == attribute)
        {
            tracing::warn!(
                "Table '{}' has no '{}' field, reporting put failures as field errors",
                table.name,
                attribute
            );
            settings.mutation_errors = MutationErrorPolicy::Field;
        }
        settings
    }
}

fn claim(claimed: &mut HashSet<String>, type_name: &str) -> Result<()> {
    if !claimed.insert(type_name.to_string()) {
        return Err(DynagraphError::SchemaGeneration(format!(
            "Type name '{}' is synthesized more than once",
            type_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeType, CatalogBuilder, IndexDescriptor, KeySchemaElement};
    use crate::store::MemoryStore;

    fn builder() -> SchemaBuilder {
        SchemaBuilder::new(Arc::new(MemoryStore::new()))
    }

    fn table(name: &str) -> TableMetadata {
        TableMetadata::new(
            name,
            vec![AttributeDefinition::new("Id", AttributeType::Number)],
            vec![KeySchemaElement::partition("Id")],
        )
    }

    fn catalog_of(tables: Vec<TableMetadata>) -> TableCatalog {
        let mut catalog = CatalogBuilder::new();
        for table in tables {
            catalog.register(table).unwrap();
        }
        catalog.build()
    }

    #[test]
    fn test_additional_column_collision_keeps_formal_type() {
        let fields = synthesize_fields(
            &[AttributeDefinition::new("Id", AttributeType::Number)],
            &[AdditionalColumn::new("Id", AttributeType::String)],
        );

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "Id");
        assert_eq!(fields[0].attribute_type, AttributeType::Number);
    }

    #[test]
    fn test_unsupported_attribute_is_omitted() {
        let fields = synthesize_fields(
            &[
                AttributeDefinition::new("Id", AttributeType::Number),
                AttributeDefinition {
                    name: "Thumbnail".to_string(),
                    type_code: "B".to_string(),
                },
            ],
            &[AdditionalColumn::new("Class", AttributeType::String)],
        );

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Class"]);
    }

    #[test]
    fn test_invalid_attribute_name_is_omitted() {
        let fields = synthesize_fields(
            &[AttributeDefinition::new("Id", AttributeType::Number)],
            &[AdditionalColumn::new("common-names", AttributeType::StringSet)],
        );
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_reserved_prefix_names_are_omitted() {
        let fields = synthesize_fields(
            &[AttributeDefinition::new("Id", AttributeType::Number)],
            &[
                AdditionalColumn::new("__meta", AttributeType::String),
                AdditionalColumn::new("Class", AttributeType::String),
            ],
        );

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Id", "Class"]);
    }

    #[test]
    fn test_reserved_prefix_column_and_index_do_not_fail_schema() {
        let mut animals = table("Animals");
        animals
            .additional_columns
            .push(AdditionalColumn::new("__meta", AttributeType::String));
        animals.global_indexes.push(IndexDescriptor {
            name: "__ById".to_string(),
            key_schema: vec![KeySchemaElement::partition("Id")],
            projected_non_key_attributes: Vec::new(),
        });

        let schema = builder().build_schema(&catalog_of(vec![animals])).unwrap();

        let sdl = schema.sdl();
        assert!(sdl.contains("Animals_scan"));
        assert!(!sdl.contains("__meta"));
        assert!(!sdl.contains("__ById"));
    }

    #[test]
    fn test_put_settings_fall_back_to_field_errors() {
        let animals = table("Animals");
        let without_order = synthesize_fields(&animals.attribute_definitions, &[]);
        let with_order = synthesize_fields(
            &animals.attribute_definitions,
            &[AdditionalColumn::new("Order", AttributeType::String)],
        );

        let builder = builder();
        assert_eq!(
            builder.put_settings(&animals, &without_order).mutation_errors,
            MutationErrorPolicy::Field
        );
        assert_eq!(
            builder.put_settings(&animals, &with_order).mutation_errors,
            MutationErrorPolicy::Data
        );
    }

    #[test]
    fn test_empty_catalog_fails() {
        let result = builder().build_schema(&TableCatalog::default());
        assert!(matches!(result, Err(DynagraphError::SchemaGeneration(_))));
    }

    #[test]
    fn test_invalid_table_name_is_skipped() {
        let catalog = catalog_of(vec![table("my-table"), table("Animals")]);
        let schema = builder().build_schema(&catalog).unwrap();

        let sdl = schema.sdl();
        assert!(sdl.contains("Animals_scan"));
        assert!(!sdl.contains("my-table"));
    }

    #[test]
    fn test_duplicate_type_names_fail() {
        let mut animals = table("Animals");
        animals.global_indexes.push(IndexDescriptor {
            name: "Animals_scan".to_string(),
            key_schema: vec![KeySchemaElement::partition("Id")],
            projected_non_key_attributes: Vec::new(),
        });

        let result = builder().build_schema(&catalog_of(vec![animals]));
        assert!(matches!(result, Err(DynagraphError::SchemaGeneration(_))));
    }

    #[test]
    fn test_index_type_names_must_be_unique_across_tables() {
        let index = IndexDescriptor {
            name: "ById".to_string(),
            key_schema: vec![KeySchemaElement::partition("Id")],
            projected_non_key_attributes: Vec::new(),
        };
        let mut animals = table("Animals");
        animals.global_indexes.push(index.clone());
        let mut plants = table("Plants");
        plants.global_indexes.push(index);

        let result = builder().build_schema(&catalog_of(vec![animals, plants]));
        assert!(result.is_err());
    }
}
