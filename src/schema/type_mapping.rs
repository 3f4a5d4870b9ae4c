/// Store attribute type to GraphQL type mapping
///
/// This module maps the closed set of store attribute types onto GraphQL
/// field shapes and converts stored values into GraphQL values.

use crate::catalog::AttributeType;
use crate::store::{AttributeValue, Row};

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, TypeRef};
use async_graphql::{Number, Value};

/// A typed field or argument derived from one attribute
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub attribute_type: AttributeType,
    pub type_ref: TypeRef,
}

/// Map a store attribute type to a GraphQL type
///
/// # Type Mapping Rules
///
/// - `Number` → `Float` (store numbers are arbitrary decimals)
/// - `String` → `String`
/// - `Boolean` → `Boolean`
/// - `StringSet` → `[String]`
///
/// All fields are nullable: items are schema-less, so any attribute may be
/// missing from a given row.
pub fn attribute_type_ref(attribute_type: AttributeType) -> TypeRef {
    match attribute_type {
        AttributeType::Number => TypeRef::named(TypeRef::FLOAT),
        AttributeType::String => TypeRef::named(TypeRef::STRING),
        AttributeType::Boolean => TypeRef::named(TypeRef::BOOLEAN),
        AttributeType::StringSet => TypeRef::named_list(TypeRef::STRING),
    }
}

/// Descriptor for an output object field
pub fn map_output(name: &str, attribute_type: AttributeType) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        attribute_type,
        type_ref: attribute_type_ref(attribute_type),
    }
}

/// Descriptor for an input object field or a field argument
pub fn map_input(name: &str, attribute_type: AttributeType) -> FieldDescriptor {
    FieldDescriptor {
        name: name.to_string(),
        attribute_type,
        type_ref: attribute_type_ref(attribute_type),
    }
}

impl FieldDescriptor {
    /// Build an output field that reads its attribute out of the parent [`Row`].
    ///
    /// A missing attribute, or one whose stored value cannot be shown as the
    /// declared type, resolves to null.
    pub fn into_output_field(self) -> Field {
        let attribute_type = self.attribute_type;
        let field_name = self.name.clone();

        Field::new(self.name, self.type_ref, move |ctx| {
            let field_name = field_name.clone();
            FieldFuture::new(async move {
                let row = ctx.parent_value.try_downcast_ref::<Row>()?;
                Ok(row
                    .get(&field_name)
                    .and_then(|value| attribute_to_graphql(attribute_type, value))
                    .map(FieldValue::value))
            })
        })
    }

    pub fn into_input_value(self) -> InputValue {
        InputValue::new(self.name, self.type_ref)
    }
}

/// Whether a name can be used as a GraphQL type, field, or argument name
///
/// Names starting with `__` are reserved for introspection.
pub fn is_valid_graphql_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

fn parse_number(text: &str) -> Option<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

/// Convert a stored value to the GraphQL shape of its declared type.
///
/// Values written with string coercion are converted back where they parse
/// (e.g. `S("2")` on a Number field becomes `2`).
pub fn attribute_to_graphql(declared: AttributeType, value: &AttributeValue) -> Option<Value> {
    let converted = match (declared, value) {
        (AttributeType::Number, AttributeValue::N(text) | AttributeValue::S(text)) => {
            parse_number(text)
        }
        (AttributeType::String, AttributeValue::S(text) | AttributeValue::N(text)) => {
            Some(Value::String(text.clone()))
        }
        (AttributeType::String, AttributeValue::Bool(b)) => Some(Value::String(b.to_string())),
        (AttributeType::Boolean, AttributeValue::Bool(b)) => Some(Value::Boolean(*b)),
        (AttributeType::Boolean, AttributeValue::S(text)) => match text.to_ascii_lowercase().as_str() {
            "true" => Some(Value::Boolean(true)),
            "false" => Some(Value::Boolean(false)),
            _ => None,
        },
        (AttributeType::StringSet, AttributeValue::Ss(items)) => Some(Value::List(
            items.iter().cloned().map(Value::String).collect(),
        )),
        (AttributeType::StringSet, AttributeValue::S(text)) => {
            let items = serde_json::from_str::<Vec<String>>(text)
                .unwrap_or_else(|_| vec![text.clone()]);
            Some(Value::List(items.into_iter().map(Value::String).collect()))
        }
        _ => None,
    };

    if converted.is_none() {
        tracing::trace!(
            "Stored {:?} cannot be shown as {:?}, resolving to null",
            value,
            declared
        );
    }
    converted
}
