/// GraphQL resolvers for scan, indexed query and put-item fields
///
/// Each resolver closes over the immutable metadata of its table and reads the
/// store handle from schema data. The `execute_*` functions hold the store
/// round-trips so they can be driven without a GraphQL request.

use crate::catalog::TableMetadata;
use crate::config::{MutationErrorPolicy, SchemaConfig};
use crate::error::Result;
use crate::schema::arguments::{to_item, to_query_request};
use crate::schema::type_mapping::FieldDescriptor;
use crate::store::{AttributeValue, QueryRequest, Row, Store};

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputValue, ResolverContext, TypeRef,
};
use async_graphql::Value;
use std::sync::Arc;

/// Match a requested field name against `columns`, ignoring case
fn normalize_column(requested: &str, columns: &[String]) -> String {
    let folded = requested.to_lowercase();
    columns
        .iter()
        .find(|c| c.to_lowercase() == folded)
        .cloned()
        .unwrap_or_else(|| requested.to_string())
}

/// Attribute names for the sub-fields a client selected
fn requested_columns<'a>(
    table: &TableMetadata,
    requested: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let columns = table.selectable_columns();
    let mut names: Vec<String> = Vec::new();
    for name in requested {
        if name.starts_with("__") {
            continue;
        }
        let column = normalize_column(name, &columns);
        if !names.contains(&column) {
            names.push(column);
        }
    }
    names
}

/// Projection for a scan: key attributes always, then the requested fields
pub fn scan_projection<'a>(
    table: &TableMetadata,
    requested: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut projection: Vec<String> = table
        .key_schema
        .iter()
        .map(|k| k.attribute_name.clone())
        .collect();
    for column in requested_columns(table, requested) {
        if !projection.contains(&column) {
            projection.push(column);
        }
    }
    projection
}

pub async fn execute_scan(
    store: &dyn Store,
    table: &TableMetadata,
    projection: &[String],
) -> Result<Vec<Row>> {
    tracing::debug!("Scanning '{}' projecting {:?}", table.name, projection);
    store.scan(&table.name, projection).await
}

pub async fn execute_query(store: &dyn Store, request: QueryRequest) -> Result<Vec<Row>> {
    tracing::debug!(
        "Querying '{}' index {:?}: {} {:?}",
        request.table,
        request.index,
        request.key_condition_expression,
        request.values
    );
    store.query(request).await
}

/// Write an item and return its new image narrowed to `returning`.
///
/// Under [`MutationErrorPolicy::Data`] a failed write is not an error: the
/// result is a row whose only attribute (`settings.mutation_error_attribute`)
/// holds the failure message.
pub async fn execute_put(
    store: &dyn Store,
    table: &TableMetadata,
    item: Row,
    returning: &[String],
    settings: &SchemaConfig,
) -> Result<Row> {
    tracing::debug!("Putting item into '{}': {:?}", table.name, item);

    match store.put_item(&table.name, item).await {
        Ok(written) if returning.is_empty() => Ok(written),
        Ok(written) => Ok(written
            .into_iter()
            .filter(|(name, _)| returning.contains(name))
            .collect()),
        Err(err) => match settings.mutation_errors {
            MutationErrorPolicy::Field => Err(err),
            MutationErrorPolicy::Data => {
                tracing::warn!("Put into '{}' failed, returning error as data: {}", table.name, err);
                let mut row = Row::new();
                row.insert(
                    settings.mutation_error_attribute.clone(),
                    AttributeValue::S(err.to_string()),
                );
                Ok(row)
            }
        },
    }
}

fn selected_names(ctx: &ResolverContext<'_>) -> Vec<String> {
    ctx.field()
        .selection_set()
        .map(|field| field.name().to_string())
        .collect()
}

fn rows_to_field_value(rows: Vec<Row>) -> FieldValue<'static> {
    FieldValue::list(rows.into_iter().map(FieldValue::owned_any))
}

/// Create the `_scan` field of a table namespace
///
/// Key arguments are accepted but do not filter the scan.
pub fn create_scan_resolver(
    table: Arc<TableMetadata>,
    row_type: &str,
    arguments: Vec<FieldDescriptor>,
) -> Field {
    let mut field = Field::new("_scan", TypeRef::named_list(row_type), move |ctx| {
        let table = table.clone();

        FieldFuture::new(async move {
            for (name, value) in ctx.args.iter() {
                tracing::debug!(
                    "Ignoring _scan argument {}={} on '{}'",
                    name,
                    value.as_value(),
                    table.name
                );
            }

            let store = ctx.data::<Arc<dyn Store>>()?;
            let selected = selected_names(&ctx);
            let projection = scan_projection(&table, selected.iter().map(String::as_str));
            let rows = execute_scan(store.as_ref(), &table, &projection).await?;

            Ok(Some(rows_to_field_value(rows)))
        })
    });

    for argument in arguments {
        field = field.argument(argument.into_input_value());
    }
    field
}

/// Create the field querying one index of a table
pub fn create_index_resolver(
    table: Arc<TableMetadata>,
    index_name: &str,
    row_type: &str,
    arguments: Vec<FieldDescriptor>,
    settings: &SchemaConfig,
) -> Field {
    let index = index_name.to_string();
    let policy = settings.value_coercion;

    let mut field = Field::new(index_name, TypeRef::named_list(row_type), move |ctx| {
        let table = table.clone();
        let index = index.clone();

        FieldFuture::new(async move {
            let supplied: Vec<(String, Value)> = ctx
                .args
                .iter()
                .map(|(name, value)| (name.to_string(), value.as_value().clone()))
                .collect();

            let store = ctx.data::<Arc<dyn Store>>()?;
            let request = to_query_request(&table, &index, supplied, policy)?;
            let rows = execute_query(store.as_ref(), request).await?;

            Ok(Some(rows_to_field_value(rows)))
        })
    });

    for argument in arguments {
        field = field.argument(argument.into_input_value());
    }
    field
}

/// Create the `create<Table>(input)` mutation field
///
/// # Arguments
///
/// * `table` - Table the item is written to
/// * `input_type` - Name of the table's input object type
/// * `row_type` - Name of the returned row type
/// * `settings` - Coercion and mutation-error policies
pub fn create_put_resolver(
    table: Arc<TableMetadata>,
    input_type: &str,
    row_type: &str,
    settings: &SchemaConfig,
) -> Field {
    let field_name = format!("create{}", table.name);
    let settings = settings.clone();

    Field::new(field_name, TypeRef::named_list(row_type), move |ctx| {
        let table = table.clone();
        let settings = settings.clone();

        FieldFuture::new(async move {
            let input = ctx.args.try_get("input")?.object()?;
            let fields: Vec<(String, Value)> = input
                .iter()
                .map(|(name, value)| (name.to_string(), value.as_value().clone()))
                .collect();

            let store = ctx.data::<Arc<dyn Store>>()?;
            let item = to_item(fields, &table, settings.value_coercion)?;
            let selected = selected_names(&ctx);
            let returning = requested_columns(&table, selected.iter().map(String::as_str));
            let row = execute_put(store.as_ref(), &table, item, &returning, &settings).await?;

            Ok(Some(rows_to_field_value(vec![row])))
        })
    })
    .argument(InputValue::new("input", TypeRef::named_nn(input_type)))
}
