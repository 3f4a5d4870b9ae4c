/// Field arguments and store key conditions
///
/// Builds the typed arguments of scan and index fields from key schemas, and
/// turns the values a client supplied back into key conditions and items.

use crate::catalog::{AttributeType, KeySchemaElement, TableMetadata};
use crate::config::CoercionPolicy;
use crate::error::{DynagraphError, Result};
use crate::schema::type_mapping::{is_valid_graphql_name, map_input, FieldDescriptor};
use crate::store::{AttributeValue, QueryRequest, Row};

use async_graphql::{Number, Value};
use indexmap::IndexMap;

/// Argument type for a key or projected attribute.
///
/// Only numbers keep their type; every other store type is exposed as a string.
fn argument_type(table: &TableMetadata, name: &str) -> AttributeType {
    match table.attribute_type_of(name) {
        Some(AttributeType::Number) => AttributeType::Number,
        _ => AttributeType::String,
    }
}

/// Arguments for a key schema followed by projected non-key attributes
///
/// # Arguments
///
/// * `table` - Table the key schema belongs to, used to look up attribute types
/// * `key_schema` - Table or index key schema, partition key first
/// * `projected` - Projected non-key attributes of an index
pub fn key_arguments(
    table: &TableMetadata,
    key_schema: &[KeySchemaElement],
    projected: &[String],
) -> Vec<FieldDescriptor> {
    let names = key_schema
        .iter()
        .map(|k| k.attribute_name.as_str())
        .chain(projected.iter().map(String::as_str));

    let mut arguments: Vec<FieldDescriptor> = Vec::new();
    for name in names {
        if !is_valid_graphql_name(name) {
            tracing::warn!(
                "Skipping argument '{}' on table '{}': not a valid GraphQL name",
                name,
                table.name
            );
            continue;
        }
        if arguments.iter().any(|a| a.name == name) {
            continue;
        }
        arguments.push(map_input(name, argument_type(table, name)));
    }
    arguments
}

/// Map a supplied argument name onto the key schema's spelling.
///
/// Matching ignores case. Names that match no key attribute are returned
/// unchanged.
pub fn resolve_key_name(supplied: &str, key_schema: &[KeySchemaElement]) -> String {
    let folded = supplied.to_lowercase();
    key_schema
        .iter()
        .find(|k| k.attribute_name.to_lowercase() == folded)
        .map(|k| k.attribute_name.clone())
        .unwrap_or_else(|| supplied.to_string())
}

/// Key condition expression with its placeholder values
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub expression: String,
    pub values: IndexMap<String, AttributeValue>,
}

/// Build one `<name> = :v_<name>` clause per argument, joined with `and`
pub fn to_key_condition(
    arguments: &[(String, Value)],
    table: &TableMetadata,
    policy: CoercionPolicy,
) -> Result<KeyCondition> {
    let mut clauses = Vec::with_capacity(arguments.len());
    let mut values = IndexMap::new();

    for (name, value) in arguments {
        let placeholder = format!(":v_{}", name);
        let coerced = coerce_value(policy, name, table.attribute_type_of(name), value)?;
        clauses.push(format!("{} = {}", name, placeholder));
        values.insert(placeholder, coerced);
    }

    Ok(KeyCondition {
        expression: clauses.join(" and "),
        values,
    })
}

/// Build the store query for an index field from the arguments the client supplied
pub fn to_query_request(
    table: &TableMetadata,
    index: &str,
    arguments: Vec<(String, Value)>,
    policy: CoercionPolicy,
) -> Result<QueryRequest> {
    let key_schema = table
        .key_schema_for(Some(index))
        .ok_or_else(|| DynagraphError::TableNotFound(format!("{}.{}", table.name, index)))?;

    let resolved: Vec<(String, Value)> = arguments
        .into_iter()
        .filter(|(_, value)| !matches!(value, Value::Null))
        .map(|(name, value)| (resolve_key_name(&name, key_schema), value))
        .collect();

    if resolved.is_empty() {
        let partition = key_schema
            .first()
            .map(|k| k.attribute_name.clone())
            .unwrap_or_default();
        return Err(DynagraphError::InvalidValue {
            attribute: partition,
            reason: format!("index '{}' needs at least its partition key", index),
        });
    }

    let condition = to_key_condition(&resolved, table, policy)?;
    Ok(QueryRequest {
        table: table.name.clone(),
        index: Some(index.to_string()),
        key_condition_expression: condition.expression,
        values: condition.values,
    })
}

/// Build an item to write from the fields of a create input object
pub fn to_item(
    fields: Vec<(String, Value)>,
    table: &TableMetadata,
    policy: CoercionPolicy,
) -> Result<Row> {
    let mut item = Row::new();
    for (name, value) in fields {
        if matches!(value, Value::Null) {
            continue;
        }
        let name = resolve_key_name(&name, &table.key_schema);
        let coerced = coerce_value(policy, &name, table.attribute_type_of(&name), &value)?;
        item.insert(name, coerced);
    }
    Ok(item)
}

fn number_text(number: &Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    match number.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => number.to_string(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => number_text(n),
        Value::Boolean(b) => b.to_string(),
        Value::Enum(name) => name.to_string(),
        other => other
            .clone()
            .into_json()
            .ok()
            .and_then(|json| serde_json::to_string(&json).ok())
            .unwrap_or_else(|| other.to_string()),
    }
}

fn invalid(attribute: &str, reason: impl Into<String>) -> DynagraphError {
    DynagraphError::InvalidValue {
        attribute: attribute.to_string(),
        reason: reason.into(),
    }
}

/// Turn a GraphQL argument value into a store value.
///
/// With [`CoercionPolicy::String`] every value becomes `S`. With
/// [`CoercionPolicy::Declared`] the value takes the attribute's declared type;
/// attributes with no declared type fall back to `S`.
pub fn coerce_value(
    policy: CoercionPolicy,
    attribute: &str,
    declared: Option<AttributeType>,
    value: &Value,
) -> Result<AttributeValue> {
    let declared = match (policy, declared) {
        (CoercionPolicy::Declared, Some(declared)) => declared,
        _ => return Ok(AttributeValue::S(text_of(value))),
    };

    match (declared, value) {
        (AttributeType::Number, Value::Number(n)) => Ok(AttributeValue::N(number_text(n))),
        (AttributeType::Number, Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<f64>()
                .map(|_| AttributeValue::N(trimmed.to_string()))
                .map_err(|_| invalid(attribute, format!("'{}' is not a number", s)))
        }
        (AttributeType::String, Value::String(_) | Value::Number(_) | Value::Boolean(_)) => {
            Ok(AttributeValue::S(text_of(value)))
        }
        (AttributeType::Boolean, Value::Boolean(b)) => Ok(AttributeValue::Bool(*b)),
        (AttributeType::Boolean, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(AttributeValue::Bool(true)),
            "false" => Ok(AttributeValue::Bool(false)),
            _ => Err(invalid(attribute, format!("'{}' is not a boolean", s))),
        },
        (AttributeType::StringSet, Value::List(items)) => {
            if items.is_empty() {
                return Err(invalid(attribute, "string sets cannot be empty"));
            }
            let mut set: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let text = text_of(item);
                if !set.contains(&text) {
                    set.push(text);
                }
            }
            Ok(AttributeValue::Ss(set))
        }
        (AttributeType::StringSet, Value::String(s)) => Ok(AttributeValue::Ss(vec![s.clone()])),
        (declared, other) => Err(invalid(
            attribute,
            format!("{} cannot be stored as {}", other, declared.code()),
        )),
    }
}
