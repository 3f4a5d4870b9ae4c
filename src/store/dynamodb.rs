use crate::catalog::{
    AttributeDefinition, IndexDescriptor, KeyRole, KeySchemaElement, TableMetadata,
};
use crate::error::{DynagraphError, Result};
use crate::store::{AttributeValue, QueryRequest, Row, Store, TablePage};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonValue};
use std::time::Duration;

const TARGET_PREFIX: &str = "DynamoDB_20120810";
const CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// DynamoDB client speaking the JSON 1.0 protocol.
///
/// Requests carry a credential scope but are not SigV4 signed, so the client
/// is meant for DynamoDB Local, compatible stores, or a signing proxy.
///
/// # Example
///
/// ```no_run
/// use dynagraph::store::{DynamoDbClient, Store};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = DynamoDbClient::new(
///     "http://localhost:8000".to_string(),
///     "us-east-1".to_string(),
///     Duration::from_secs(30),
/// )?;
///
/// let page = client.list_tables(None).await?;
/// # Ok(())
/// # }
/// ```
pub struct DynamoDbClient {
    endpoint: String,
    region: String,
    access_key_id: String,
    page_size: usize,
    client: Client,
}

impl DynamoDbClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Store URL (e.g., "http://localhost:8000")
    /// * `region` - Region used in the credential scope
    /// * `timeout` - Per-request timeout
    pub fn new(endpoint: String, region: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            region,
            access_key_id: "local".to_string(),
            page_size: 100,
            client,
        })
    }

    pub fn with_access_key_id(mut self, access_key_id: impl Into<String>) -> Self {
        self.access_key_id = access_key_id.into();
        self
    }

    /// Maximum number of table names requested per `ListTables` page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Issue one protocol operation and decode its response body
    async fn call<T: DeserializeOwned>(&self, operation: &str, body: JsonValue) -> Result<T> {
        let now = chrono::Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let scope = format!(
            "{}/{}/{}/dynamodb/aws4_request",
            self.access_key_id,
            now.format("%Y%m%d"),
            self.region
        );

        tracing::debug!("DynamoDB {} request: {}", operation, body);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .header("X-Amz-Date", amz_date)
            .header(
                "Authorization",
                format!(
                    "AWS4-HMAC-SHA256 Credential={}, SignedHeaders=content-type;host;x-amz-date;x-amz-target, Signature=unsigned",
                    scope
                ),
            )
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if status != StatusCode::OK {
            return Err(map_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            DynagraphError::Store(format!("Failed to parse {} response: {}", operation, e))
        })
    }
}

/// Map a failed response to an error, using the protocol's `__type` when present
fn map_error(status: StatusCode, body: &str) -> DynagraphError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let (kind, message) = match parsed {
        Some(err) => {
            let kind = err
                .kind
                .as_deref()
                .and_then(|k| k.rsplit('#').next())
                .unwrap_or_default()
                .to_string();
            (kind, err.message.or(err.message_upper).unwrap_or_default())
        }
        None => (String::new(), body.to_string()),
    };

    match (status, kind.as_str()) {
        (_, "ResourceNotFoundException") => DynagraphError::TableNotFound(message),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _)
        | (_, "UnrecognizedClientException" | "MissingAuthenticationTokenException") => {
            DynagraphError::Unauthorized(message)
        }
        (_, "") => DynagraphError::Store(format!(
            "Request failed with status {}: {}",
            status, message
        )),
        (_, kind) => DynagraphError::Store(format!("{}: {}", kind, message)),
    }
}

#[async_trait]
impl Store for DynamoDbClient {
    async fn list_tables(&self, page_token: Option<String>) -> Result<TablePage> {
        let mut body = json!({ "Limit": self.page_size });
        if let Some(token) = page_token {
            body["ExclusiveStartTableName"] = JsonValue::String(token);
        }

        let response: ListTablesOutput = self.call("ListTables", body).await?;

        Ok(TablePage {
            names: response.table_names,
            next_page_token: response.last_evaluated_table_name,
        })
    }

    async fn describe_table(&self, name: &str) -> Result<TableMetadata> {
        let response: DescribeTableOutput = self
            .call("DescribeTable", json!({ "TableName": name }))
            .await?;

        Ok(response.table.into_metadata())
    }

    async fn scan(&self, table: &str, projection: &[String]) -> Result<Vec<Row>> {
        let mut body = json!({ "TableName": table });
        if !projection.is_empty() {
            body["AttributesToGet"] = json!(projection);
        }

        let response: ItemsOutput = self.call("Scan", body).await?;

        Ok(response.items.iter().map(AttributeValue::row_from_wire).collect())
    }

    async fn query(&self, request: QueryRequest) -> Result<Vec<Row>> {
        let values: Map<String, JsonValue> = request
            .values
            .iter()
            .map(|(placeholder, value)| (placeholder.clone(), value.to_wire()))
            .collect();

        let mut body = json!({
            "TableName": request.table,
            "Select": "ALL_ATTRIBUTES",
            "KeyConditionExpression": request.key_condition_expression,
            "ExpressionAttributeValues": values,
        });
        if let Some(index) = request.index {
            body["IndexName"] = JsonValue::String(index);
        }

        let response: ItemsOutput = self.call("Query", body).await?;

        Ok(response.items.iter().map(AttributeValue::row_from_wire).collect())
    }

    async fn put_item(&self, table: &str, item: Row) -> Result<Row> {
        let body = json!({
            "TableName": table,
            "Item": AttributeValue::row_to_wire(&item),
        });

        // PutItem only reports old images; the written item is the new image
        let _: JsonValue = self.call("PutItem", body).await?;

        Ok(item)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type")]
    kind: Option<String>,
    message: Option<String>,
    #[serde(rename = "Message")]
    message_upper: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListTablesOutput {
    #[serde(default)]
    table_names: Vec<String>,
    last_evaluated_table_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsOutput {
    #[serde(default)]
    items: Vec<Map<String, JsonValue>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeTableOutput {
    table: TableDescription,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TableDescription {
    table_name: String,
    #[serde(default)]
    attribute_definitions: Vec<WireAttributeDefinition>,
    #[serde(default)]
    key_schema: Vec<WireKeySchemaElement>,
    #[serde(default)]
    global_secondary_indexes: Vec<WireIndex>,
    #[serde(default)]
    local_secondary_indexes: Vec<WireIndex>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireAttributeDefinition {
    attribute_name: String,
    attribute_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireKeySchemaElement {
    attribute_name: String,
    key_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireIndex {
    index_name: String,
    #[serde(default)]
    key_schema: Vec<WireKeySchemaElement>,
    projection: Option<WireProjection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireProjection {
    #[serde(default)]
    non_key_attributes: Vec<String>,
}

impl WireKeySchemaElement {
    fn into_element(self) -> KeySchemaElement {
        KeySchemaElement {
            attribute_name: self.attribute_name,
            role: if self.key_type == "RANGE" {
                KeyRole::Sort
            } else {
                KeyRole::Partition
            },
        }
    }
}

impl WireIndex {
    fn into_descriptor(self) -> IndexDescriptor {
        IndexDescriptor {
            name: self.index_name,
            key_schema: self
                .key_schema
                .into_iter()
                .map(WireKeySchemaElement::into_element)
                .collect(),
            projected_non_key_attributes: self
                .projection
                .map(|p| p.non_key_attributes)
                .unwrap_or_default(),
        }
    }
}

impl TableDescription {
    fn into_metadata(self) -> TableMetadata {
        let mut metadata = TableMetadata::new(
            self.table_name,
            self.attribute_definitions
                .into_iter()
                .map(|a| AttributeDefinition {
                    name: a.attribute_name,
                    type_code: a.attribute_type,
                })
                .collect(),
            self.key_schema
                .into_iter()
                .map(WireKeySchemaElement::into_element)
                .collect(),
        );
        metadata.global_indexes = self
            .global_secondary_indexes
            .into_iter()
            .map(WireIndex::into_descriptor)
            .collect();
        metadata.local_indexes = self
            .local_secondary_indexes
            .into_iter()
            .map(WireIndex::into_descriptor)
            .collect();
        metadata
    }
}
