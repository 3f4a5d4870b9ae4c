use crate::catalog::AttributeType;
use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};

/// Tagged primitive value as held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Numbers travel as their decimal string form
    N(String),
    S(String),
    Bool(bool),
    Ss(Vec<String>),
}

/// A stored item: attribute name to value, in the order the store reported them
pub type Row = IndexMap<String, AttributeValue>;

impl AttributeValue {
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            AttributeValue::N(_) => AttributeType::Number,
            AttributeValue::S(_) => AttributeType::String,
            AttributeValue::Bool(_) => AttributeType::Boolean,
            AttributeValue::Ss(_) => AttributeType::StringSet,
        }
    }

    /// Decode a DynamoDB JSON attribute value such as `{"N": "1"}`.
    ///
    /// Returns `None` for wire types the gateway does not expose (maps, lists,
    /// binaries, number sets, nulls).
    pub fn from_wire(value: &JsonValue) -> Option<Self> {
        let object = value.as_object()?;
        let (tag, inner) = object.iter().next()?;
        match tag.as_str() {
            "N" => inner.as_str().map(|s| AttributeValue::N(s.to_string())),
            "S" => inner.as_str().map(|s| AttributeValue::S(s.to_string())),
            "BOOL" => inner.as_bool().map(AttributeValue::Bool),
            "SS" => inner.as_array().map(|items| {
                AttributeValue::Ss(
                    items
                        .iter()
                        .filter_map(|i| i.as_str().map(str::to_string))
                        .collect(),
                )
            }),
            _ => None,
        }
    }

    pub fn to_wire(&self) -> JsonValue {
        match self {
            AttributeValue::N(n) => json!({ "N": n }),
            AttributeValue::S(s) => json!({ "S": s }),
            AttributeValue::Bool(b) => json!({ "BOOL": b }),
            AttributeValue::Ss(items) => json!({ "SS": items }),
        }
    }

    /// Decode a DynamoDB JSON item, dropping attributes of unsupported types
    pub fn row_from_wire(item: &serde_json::Map<String, JsonValue>) -> Row {
        let mut row = Row::new();
        for (name, value) in item {
            match AttributeValue::from_wire(value) {
                Some(v) => {
                    row.insert(name.clone(), v);
                }
                None => tracing::trace!("Dropping attribute '{}' of unsupported type", name),
            }
        }
        row
    }

    pub fn row_to_wire(row: &Row) -> JsonValue {
        JsonValue::Object(
            row.iter()
                .map(|(name, value)| (name.clone(), value.to_wire()))
                .collect(),
        )
    }
}
