use serde::{Deserialize, Serialize};

/// Primitive store types that can be exposed through the GraphQL schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "S")]
    String,
    #[serde(rename = "BOOL")]
    Boolean,
    #[serde(rename = "SS")]
    StringSet,
}

impl AttributeType {
    /// Parse a store wire type code ("N", "S", "BOOL", "SS")
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(AttributeType::Number),
            "S" => Some(AttributeType::String),
            "BOOL" => Some(AttributeType::Boolean),
            "SS" => Some(AttributeType::StringSet),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AttributeType::Number => "N",
            AttributeType::String => "S",
            AttributeType::Boolean => "BOOL",
            AttributeType::StringSet => "SS",
        }
    }
}

/// A formally typed attribute as reported by the store.
///
/// The type is kept as the raw store code because the store may report codes
/// (e.g. binary "B") that have no GraphQL mapping. Those attributes are
/// omitted from the synthesized schema rather than failing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub type_code: String,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            type_code: attribute_type.code().to_string(),
        }
    }

    pub fn attribute_type(&self) -> Option<AttributeType> {
        AttributeType::from_code(&self.type_code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Partition,
    Sort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchemaElement {
    pub attribute_name: String,
    pub role: KeyRole,
}

impl KeySchemaElement {
    pub fn partition(name: impl Into<String>) -> Self {
        Self {
            attribute_name: name.into(),
            role: KeyRole::Partition,
        }
    }

    pub fn sort(name: impl Into<String>) -> Self {
        Self {
            attribute_name: name.into(),
            role: KeyRole::Sort,
        }
    }
}

/// Global or local secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projected_non_key_attributes: Vec<String>,
}

/// Attribute declared outside the store's formal definitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

impl AdditionalColumn {
    pub fn new(name: impl Into<String>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Global,
    Local,
}

/// Full metadata for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_indexes: Vec<IndexDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub local_indexes: Vec<IndexDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_columns: Vec<AdditionalColumn>,
}

impl TableMetadata {
    pub fn new(
        name: impl Into<String>,
        attribute_definitions: Vec<AttributeDefinition>,
        key_schema: Vec<KeySchemaElement>,
    ) -> Self {
        Self {
            name: name.into(),
            attribute_definitions,
            key_schema,
            global_indexes: Vec::new(),
            local_indexes: Vec::new(),
            additional_columns: Vec::new(),
        }
    }

    pub fn partition_key(&self) -> Option<&KeySchemaElement> {
        self.key_schema.iter().find(|k| k.role == KeyRole::Partition)
    }

    pub fn sort_key(&self) -> Option<&KeySchemaElement> {
        self.key_schema.iter().find(|k| k.role == KeyRole::Sort)
    }

    /// All secondary indexes, global first
    pub fn indexes(&self) -> impl Iterator<Item = (IndexKind, &IndexDescriptor)> {
        self.global_indexes
            .iter()
            .map(|i| (IndexKind::Global, i))
            .chain(self.local_indexes.iter().map(|i| (IndexKind::Local, i)))
    }

    pub fn index(&self, name: &str) -> Option<&IndexDescriptor> {
        self.indexes().map(|(_, i)| i).find(|i| i.name == name)
    }

    /// Key schema of the table itself or of one of its indexes
    pub fn key_schema_for(&self, index_name: Option<&str>) -> Option<&[KeySchemaElement]> {
        match index_name {
            None => Some(&self.key_schema),
            Some(name) => self.index(name).map(|i| i.key_schema.as_slice()),
        }
    }

    /// Declared type of an attribute; formal definitions win over additional columns
    pub fn attribute_type_of(&self, name: &str) -> Option<AttributeType> {
        if let Some(def) = self.attribute_definitions.iter().find(|a| a.name == name) {
            return def.attribute_type();
        }
        self.additional_columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.attribute_type)
    }

    /// Key-schema attributes followed by additional columns.
    /// These are the names requested field selections are normalized against.
    pub fn selectable_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .key_schema
            .iter()
            .map(|k| k.attribute_name.clone())
            .collect();
        for column in &self.additional_columns {
            if !columns.contains(&column.name) {
                columns.push(column.name.clone());
            }
        }
        columns
    }

    /// Merge externally declared columns.
    ///
    /// A column that duplicates a formal definition (or an earlier column) is
    /// dropped; the formal definition wins.
    pub fn merge_additional_columns(&mut self, columns: &[AdditionalColumn]) {
        for column in columns {
            let formal = self
                .attribute_definitions
                .iter()
                .any(|a| a.name == column.name);
            let seen = self.additional_columns.iter().any(|c| c.name == column.name);
            if formal || seen {
                tracing::debug!(
                    "Dropping additional column '{}' on table '{}': already defined",
                    column.name,
                    self.name
                );
                continue;
            }
            self.additional_columns.push(column.clone());
        }
    }

    /// Check the structural invariants the store normally enforces
    pub fn validate(&self) -> Result<(), String> {
        match self.key_schema.first() {
            Some(first) if first.role == KeyRole::Partition => {}
            _ => {
                return Err(format!(
                    "Table '{}' key schema must start with a partition key",
                    self.name
                ))
            }
        }
        if self.key_schema.len() > 2 {
            return Err(format!(
                "Table '{}' key schema has more than two elements",
                self.name
            ));
        }

        let key_names = self
            .key_schema
            .iter()
            .chain(self.indexes().flat_map(|(_, i)| i.key_schema.iter()))
            .map(|k| k.attribute_name.as_str());
        for key in key_names {
            if !self.attribute_definitions.iter().any(|a| a.name == key) {
                return Err(format!(
                    "Key attribute '{}' of table '{}' has no attribute definition",
                    key, self.name
                ));
            }
        }

        Ok(())
    }
}
