use anyhow::Context;
use dynagraph::schema::SchemaState;
use dynagraph::server::{build_schema, open_store, router};
use std::future::IntoFuture;
use std::sync::Arc;

/// Run the serve command to start the GraphQL server
///
/// The listener is bound before discovery starts. If discovery or schema
/// synthesis fails the server stops with that error.
pub async fn run(config_path: String, port: Option<u16>) -> anyhow::Result<()> {
    tracing::info!("📖 Loading configuration from {}", config_path);

    let config = dynagraph::config::load_config(&config_path)
        .with_context(|| format!("Failed to load {}", config_path))?;

    let server_port = port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", config.server.bind, server_port);

    let state = Arc::new(SchemaState::new());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}. Port may be in use.", addr))?;

    tracing::info!("🚀 GraphQL server listening on http://{}", addr);
    tracing::info!("📊 Playground: http://{}/graphql", addr);

    let server = axum::serve(listener, router(state.clone())).into_future();
    tokio::pin!(server);

    let initialize = async {
        let store = open_store(&config).await?;
        let schema = build_schema(&config, store).await?;
        state.set_ready(schema)
    };

    tokio::select! {
        result = &mut server => {
            result.context("Server error")?;
            return Ok(());
        }
        result = initialize => {
            result.context("Schema initialization failed")?;
        }
    }

    tracing::info!("✅ Schema built successfully, accepting queries");
    tracing::info!("💡 Press Ctrl+C to stop the server");

    server.await.context("Server error")?;
    Ok(())
}
