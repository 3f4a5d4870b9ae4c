/// HTTP surface and startup wiring
///
/// The router is served before the schema exists: `/health` answers at once and
/// `/graphql` rejects requests until [`SchemaState`] is ready.

use crate::catalog::CatalogBuilder;
use crate::config::{Config, StoreBackend};
use crate::error::Result;
use crate::schema::{SchemaBuilder, SchemaState};
use crate::store::{DynamoDbClient, MemoryStore, Store};

use async_graphql::dynamic::Schema;
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

/// Open the configured store.
///
/// The memory backend starts with the tables declared in configuration,
/// provisioned empty.
pub async fn open_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Dynamodb => {
            let mut client = DynamoDbClient::new(
                config.store.endpoint.clone(),
                config.store.region.clone(),
                Duration::from_secs(config.store.timeout_secs),
            )?
            .with_page_size(config.store.list_page_size);
            if let Some(access_key_id) = &config.store.access_key_id {
                client = client.with_access_key_id(access_key_id);
            }
            tracing::info!("Using DynamoDB store at {}", config.store.endpoint);
            Ok(Arc::new(client))
        }
        StoreBackend::Memory => {
            let store = MemoryStore::new().with_page_size(config.store.list_page_size);
            for table in &config.table {
                store.create_table(table.clone()).await?;
            }
            tracing::info!("Using in-memory store with {} table(s)", config.table.len());
            Ok(Arc::new(store))
        }
    }
}

/// Discover the store's tables and synthesize the schema
pub async fn build_schema(config: &Config, store: Arc<dyn Store>) -> Result<Schema> {
    let mut catalog =
        CatalogBuilder::new().with_additional_columns(config.additional_columns_by_table());

    // memory tables were provisioned from the same declarations and are discovered
    if config.store.backend == StoreBackend::Dynamodb {
        for table in &config.table {
            catalog.register(table.clone())?;
        }
    }

    let catalog = catalog.discover(store.as_ref()).await?;
    tracing::info!("🔧 Building GraphQL schema for {} table(s)...", catalog.len());

    SchemaBuilder::new(store)
        .with_settings(config.schema.clone())
        .build_schema(&catalog)
}

/// Router with the GraphQL endpoint, the playground and a health check
pub fn router(state: Arc<SchemaState>) -> Router {
    Router::new()
        .route("/graphql", get(graphql_playground).post(graphql_handler))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

async fn graphql_handler(
    State(state): State<Arc<SchemaState>>,
    request: GraphQLRequest,
) -> GraphQLResponse {
    state.execute(request.into_inner()).await.into()
}

async fn graphql_playground() -> Html<String> {
    Html(playground_source(GraphQLPlaygroundConfig::new("/graphql")))
}

async fn health_check() -> &'static str {
    "OK"
}
