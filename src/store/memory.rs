use crate::catalog::{KeySchemaElement, KeyRole, TableMetadata};
use crate::error::{DynagraphError, Result};
use crate::store::{AttributeValue, QueryRequest, Row, Store, TablePage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;

struct MemoryTable {
    metadata: TableMetadata,
    items: Vec<Row>,
}

/// In-process store with the same validation rules as DynamoDB for the
/// operations the gateway issues.
///
/// Tables list in name order. Index queries return every attribute of the
/// matching items (indexes behave as if projecting all attributes).
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, MemoryTable>>,
    page_size: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            page_size: 100,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Provision an empty table
    pub async fn create_table(&self, metadata: TableMetadata) -> Result<()> {
        metadata.validate().map_err(validation)?;

        let mut tables = self.tables.write().await;
        if tables.contains_key(&metadata.name) {
            return Err(DynagraphError::Store(format!(
                "ResourceInUseException: Table already exists: {}",
                metadata.name
            )));
        }

        tracing::debug!("Created in-memory table '{}'", metadata.name);
        tables.insert(
            metadata.name.clone(),
            MemoryTable {
                metadata,
                items: Vec::new(),
            },
        );
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validation(message: impl std::fmt::Display) -> DynagraphError {
    DynagraphError::Store(format!("ValidationException: {}", message))
}

fn not_found(table: &str) -> DynagraphError {
    DynagraphError::TableNotFound(format!(
        "Requested resource not found: Table: {} not found",
        table
    ))
}

/// Split `A = :a and B = :b` into `(attribute, placeholder)` pairs
fn parse_key_condition(expression: &str) -> Result<Vec<(String, String)>> {
    let mut clauses = vec![String::new()];
    for token in expression.split_whitespace() {
        if token.eq_ignore_ascii_case("and") {
            clauses.push(String::new());
        } else if let Some(current) = clauses.last_mut() {
            current.push_str(token);
        }
    }

    clauses
        .iter()
        .map(|clause| {
            let (name, placeholder) = clause.split_once('=').ok_or_else(|| {
                validation(format!("Invalid KeyConditionExpression: {}", expression))
            })?;
            if name.is_empty() || !placeholder.starts_with(':') {
                return Err(validation(format!(
                    "Invalid KeyConditionExpression: {}",
                    expression
                )));
            }
            Ok((name.to_string(), placeholder.to_string()))
        })
        .collect()
}

fn check_key_types(
    metadata: &TableMetadata,
    keys: &[KeySchemaElement],
    item: &Row,
    index_name: Option<&str>,
) -> Result<()> {
    for key in keys {
        let Some(value) = item.get(&key.attribute_name) else {
            if index_name.is_none() {
                return Err(validation(format!(
                    "One or more parameter values were invalid: Missing the key {} in the item",
                    key.attribute_name
                )));
            }
            continue;
        };
        let Some(expected) = metadata.attribute_type_of(&key.attribute_name) else {
            continue;
        };
        if value.attribute_type() != expected {
            return Err(match index_name {
                None => validation(format!(
                    "One or more parameter values were invalid: Type mismatch for key {} expected: {} actual: {}",
                    key.attribute_name,
                    expected.code(),
                    value.attribute_type().code()
                )),
                Some(index) => validation(format!(
                    "One or more parameter values were invalid: Type mismatch for Index Key {} Expected: {} Actual: {} IndexName: {}",
                    key.attribute_name,
                    expected.code(),
                    value.attribute_type().code(),
                    index
                )),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_tables(&self, page_token: Option<String>) -> Result<TablePage> {
        let tables = self.tables.read().await;
        let start = match &page_token {
            Some(token) => Bound::Excluded(token.clone()),
            None => Bound::Unbounded,
        };

        let mut remaining = tables.range((start, Bound::Unbounded)).map(|(name, _)| name);
        let names: Vec<String> = remaining.by_ref().take(self.page_size).cloned().collect();
        let next_page_token = if remaining.next().is_some() {
            names.last().cloned()
        } else {
            None
        };

        Ok(TablePage {
            names,
            next_page_token,
        })
    }

    async fn describe_table(&self, name: &str) -> Result<TableMetadata> {
        let tables = self.tables.read().await;
        tables
            .get(name)
            .map(|t| t.metadata.clone())
            .ok_or_else(|| not_found(name))
    }

    async fn scan(&self, table: &str, projection: &[String]) -> Result<Vec<Row>> {
        let tables = self.tables.read().await;
        let table = tables.get(table).ok_or_else(|| not_found(table))?;

        Ok(table
            .items
            .iter()
            .map(|item| {
                if projection.is_empty() {
                    return item.clone();
                }
                item.iter()
                    .filter(|(name, _)| projection.contains(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .collect())
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<Row>> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table)
            .ok_or_else(|| not_found(&request.table))?;

        let keys = table
            .metadata
            .key_schema_for(request.index.as_deref())
            .ok_or_else(|| {
                validation(format!(
                    "The table does not have the specified index: {}",
                    request.index.as_deref().unwrap_or_default()
                ))
            })?;

        let mut conditions: Vec<(String, AttributeValue)> = Vec::new();
        for (name, placeholder) in parse_key_condition(&request.key_condition_expression)? {
            if !keys.iter().any(|k| k.attribute_name == name) {
                return Err(validation("Query key condition not supported"));
            }
            let value = request.values.get(&placeholder).ok_or_else(|| {
                validation(format!(
                    "Value provided in ExpressionAttributeValues unused or missing: {}",
                    placeholder
                ))
            })?;
            conditions.push((name, value.clone()));
        }

        if let Some(partition) = keys.iter().find(|k| k.role == KeyRole::Partition) {
            if !conditions.iter().any(|(name, _)| *name == partition.attribute_name) {
                return Err(validation(format!(
                    "Query condition missed key schema element: {}",
                    partition.attribute_name
                )));
            }
        }

        Ok(table
            .items
            .iter()
            .filter(|item| {
                conditions
                    .iter()
                    .all(|(name, value)| item.get(name) == Some(value))
            })
            .cloned()
            .collect())
    }

    async fn put_item(&self, table: &str, item: Row) -> Result<Row> {
        let mut tables = self.tables.write().await;
        let table = tables.get_mut(table).ok_or_else(|| not_found(table))?;
        let metadata = &table.metadata;

        check_key_types(metadata, &metadata.key_schema, &item, None)?;
        for (_, index) in metadata.indexes() {
            check_key_types(metadata, &index.key_schema, &item, Some(&index.name))?;
        }

        let same_key = |existing: &Row| {
            metadata
                .key_schema
                .iter()
                .all(|k| existing.get(&k.attribute_name) == item.get(&k.attribute_name))
        };
        match table.items.iter().position(same_key) {
            Some(position) => table.items[position] = item.clone(),
            None => table.items.push(item.clone()),
        }

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AttributeDefinition, AttributeType, IndexDescriptor};
    use indexmap::IndexMap;

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
            projected_non_key_attributes: vec![],
        });
        table
    }

    fn row(pairs: &[(&str, AttributeValue)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn n(v: &str) -> AttributeValue {
        AttributeValue::N(v.to_string())
    }

    fn s(v: &str) -> AttributeValue {
        AttributeValue::S(v.to_string())
    }

    #[test]
    fn test_parse_key_condition() {
        let clauses = parse_key_condition("Genus = :v_Genus and Id = :v_Id").unwrap();
        assert_eq!(
            clauses,
            vec![
                ("Genus".to_string(), ":v_Genus".to_string()),
                ("Id".to_string(), ":v_Id".to_string())
            ]
        );
        assert!(parse_key_condition("Genus").is_err());
        assert!(parse_key_condition("Genus = v").is_err());
    }

    #[tokio::test]
    async fn test_list_tables_paginates() {
        let store = MemoryStore::new().with_page_size(1);
        store.create_table(animals()).await.unwrap();
        let mut plants = animals();
        plants.name = "Plants".to_string();
        store.create_table(plants).await.unwrap();

        let first = store.list_tables(None).await.unwrap();
        assert_eq!(first.names, vec!["Animals"]);
        assert_eq!(first.next_page_token.as_deref(), Some("Animals"));

        let second = store.list_tables(first.next_page_token).await.unwrap();
        assert_eq!(second.names, vec!["Plants"]);
        assert!(second.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_put_rejects_key_type_mismatch() {
        let store = MemoryStore::new();
        store.create_table(animals()).await.unwrap();

        let err = store
            .put_item("Animals", row(&[("Id", s("2")), ("Genus", s("Testus"))]))
            .await
            .unwrap_err();

        assert!(err
            .to_string()
            .contains("Type mismatch for key Id expected: N actual: S"));
    }

    #[tokio::test]
    async fn test_put_replaces_same_key() {
        let store = MemoryStore::new();
        store.create_table(animals()).await.unwrap();

        store
            .put_item("Animals", row(&[("Id", n("1")), ("Genus", s("Microcarbo"))]))
            .await
            .unwrap();
        store
            .put_item(
                "Animals",
                row(&[("Id", n("1")), ("Genus", s("Microcarbo")), ("Class", s("Aves"))]),
            )
            .await
            .unwrap();

        let rows = store.scan("Animals", &[]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Class"), Some(&s("Aves")));
    }

    #[tokio::test]
    async fn test_scan_projection() {
        let store = MemoryStore::new();
        store.create_table(animals()).await.unwrap();
        store
            .put_item(
                "Animals",
                row(&[("Id", n("1")), ("Genus", s("Microcarbo")), ("Class", s("Aves"))]),
            )
            .await
            .unwrap();

        let rows = store.scan("Animals", &["Class".to_string()]).await.unwrap();
        assert_eq!(rows[0].len(), 1);
        assert!(rows[0].contains_key("Class"));
    }

    #[tokio::test]
    async fn test_query_index_and_typed_equality() {
        let store = MemoryStore::new();
        store.create_table(animals()).await.unwrap();
        store
            .put_item("Animals", row(&[("Id", n("1")), ("Genus", s("Microcarbo"))]))
            .await
            .unwrap();

        let mut values = IndexMap::new();
        values.insert(":v_Genus".to_string(), s("Microcarbo"));
        let rows = store
            .query(QueryRequest {
                table: "Animals".to_string(),
                index: Some("Animals_ByGenus".to_string()),
                key_condition_expression: "Genus = :v_Genus".to_string(),
                values,
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        // a string never equals a number
        let mut values = IndexMap::new();
        values.insert(":v_Id".to_string(), s("1"));
        let rows = store
            .query(QueryRequest {
                table: "Animals".to_string(),
                index: None,
                key_condition_expression: "Id = :v_Id".to_string(),
                values,
            })
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_query_rejects_non_key_condition() {
        let store = MemoryStore::new();
        store.create_table(animals()).await.unwrap();

        let mut values = IndexMap::new();
        values.insert(":v_Genus".to_string(), s("Microcarbo"));
        values.insert(":v_Class".to_string(), s("Aves"));
        let err = store
            .query(QueryRequest {
                table: "Animals".to_string(),
                index: Some("Animals_ByGenus".to_string()),
                key_condition_expression: "Genus = :v_Genus and Class = :v_Class".to_string(),
                values,
            })
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Query key condition not supported"));
    }

    #[tokio::test]
    async fn test_describe_missing_table() {
        let store = MemoryStore::new();
        let err = store.describe_table("Missing").await.unwrap_err();
        assert!(matches!(err, DynagraphError::TableNotFound(_)));
    }
}
