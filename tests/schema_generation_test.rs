/// Integration tests for schema generation from table metadata
///
/// These tests verify through introspection that the schema builder:
/// - Exposes one namespace per table with `_scan` and one field per index
/// - Orders index arguments as key schema then projected attributes
/// - Keeps the formal type when an additional column repeats an attribute
/// - Exposes `create<Table>` mutations taking the table's input type

mod schema_tests {
    use async_graphql::dynamic::Schema;
    use async_graphql::Request;
    use dynagraph::catalog::{
        AdditionalColumn, AttributeDefinition, AttributeType, CatalogBuilder, IndexDescriptor,
        KeySchemaElement, TableMetadata,
    };
    use dynagraph::schema::SchemaBuilder;
    use dynagraph::store::MemoryStore;
    use serde_json::{json, Value as JsonValue};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn animals() -> TableMetadata {
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
        table.local_indexes.push(IndexDescriptor {
            name: "Animals_ByFamily".to_string(),
            key_schema: vec![
                KeySchemaElement::partition("Id"),
                KeySchemaElement::sort("Family"),
            ],
            projected_non_key_attributes: vec!["Class".to_string(), "ScientificName".to_string()],
        });
        table
            .attribute_definitions
            .push(AttributeDefinition::new("Family", AttributeType::String));
        table
    }

    async fn build(columns: Vec<AdditionalColumn>) -> Schema {
        let store = Arc::new(MemoryStore::new());
        store.create_table(animals()).await.unwrap();

        let catalog = CatalogBuilder::new()
            .with_additional_columns(HashMap::from([("Animals".to_string(), columns)]))
            .discover(store.as_ref())
            .await
            .expect("Failed to discover tables");

        SchemaBuilder::new(store)
            .build_schema(&catalog)
            .expect("Failed to build schema")
    }

    async fn introspect(schema: &Schema, query: &str) -> JsonValue {
        let response = schema.execute(Request::new(query)).await;
        assert!(response.errors.is_empty(), "Introspection failed: {:?}", response.errors);
        response.data.into_json().unwrap()
    }

    fn field<'a>(type_data: &'a JsonValue, name: &str) -> &'a JsonValue {
        type_data["fields"]
            .as_array()
            .unwrap()
            .iter()
            .find(|f| f["name"] == name)
            .unwrap_or_else(|| panic!("Field '{}' missing", name))
    }

    #[tokio::test]
    async fn test_additional_column_collision_keeps_one_numeric_id() {
        let schema = build(vec![
            AdditionalColumn::new("Id", AttributeType::String),
            AdditionalColumn::new("Class", AttributeType::String),
        ])
        .await;

        let data = introspect(
            &schema,
            r#"{ __type(name: "Animals_scan") { fields { name type { name } } } }"#,
        )
        .await;

        let fields = data["__type"]["fields"].as_array().unwrap();
        let ids: Vec<&JsonValue> = fields.iter().filter(|f| f["name"] == "Id").collect();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0]["type"]["name"], "Float");
    }

    #[tokio::test]
    async fn test_attribute_type_shapes() {
        let schema = build(vec![
            AdditionalColumn::new("Extinct", AttributeType::Boolean),
            AdditionalColumn::new("CommonNames", AttributeType::StringSet),
        ])
        .await;

        let data = introspect(
            &schema,
            r#"{ __type(name: "Animals_scan") {
                fields { name type { kind name ofType { name } } }
            } }"#,
        )
        .await;
        let row_type = &data["__type"];

        assert_eq!(field(row_type, "Id")["type"]["name"], "Float");
        assert_eq!(field(row_type, "Genus")["type"]["name"], "String");
        assert_eq!(field(row_type, "Extinct")["type"]["name"], "Boolean");
        assert_eq!(
            field(row_type, "CommonNames")["type"],
            json!({ "kind": "LIST", "name": null, "ofType": { "name": "String" } })
        );
    }

    #[tokio::test]
    async fn test_namespace_fields_and_arguments() {
        let schema = build(vec![
            AdditionalColumn::new("Class", AttributeType::String),
            AdditionalColumn::new("ScientificName", AttributeType::String),
        ])
        .await;

        let data = introspect(
            &schema,
            r#"{ __type(name: "Animals") { fields { name args { name } } } }"#,
        )
        .await;
        let namespace = &data["__type"];

        let names: Vec<&str> = namespace["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["_scan", "Animals_ByGenus", "Animals_ByFamily"]);

        assert_eq!(
            field(namespace, "_scan")["args"],
            json!([{ "name": "Id" }, { "name": "Genus" }])
        );
        assert_eq!(
            field(namespace, "Animals_ByFamily")["args"],
            json!([
                { "name": "Id" },
                { "name": "Family" },
                { "name": "Class" },
                { "name": "ScientificName" }
            ])
        );
    }

    #[tokio::test]
    async fn test_index_row_types_registered() {
        let schema = build(Vec::new()).await;
        let sdl = schema.sdl();

        assert!(sdl.contains("type Animals_ByGenus"));
        assert!(sdl.contains("type Animals_ByFamily"));
        assert!(sdl.contains("input createAnimals"));
    }

    #[tokio::test]
    async fn test_create_mutation_signature() {
        let schema = build(vec![AdditionalColumn::new("Class", AttributeType::String)]).await;

        let data = introspect(
            &schema,
            r#"{ __type(name: "Mutation") {
                fields { name args { name type { kind ofType { name } } } type { kind ofType { name } } }
            } }"#,
        )
        .await;
        let create = field(&data["__type"], "createAnimals");

        assert_eq!(
            create["args"],
            json!([{ "name": "input", "type": { "kind": "NON_NULL", "ofType": { "name": "createAnimals" } } }])
        );
        assert_eq!(
            create["type"],
            json!({ "kind": "LIST", "ofType": { "name": "Animals_scan" } })
        );

        let input = introspect(
            &schema,
            r#"{ __type(name: "createAnimals") { inputFields { name } } }"#,
        )
        .await;
        assert_eq!(
            input["__type"]["inputFields"],
            json!([{ "name": "Id" }, { "name": "Genus" }, { "name": "Family" }, { "name": "Class" }])
        );
    }
}
