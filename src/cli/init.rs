use anyhow::Context;
use dynagraph::catalog::CatalogBuilder;
use dynagraph::config::{AdditionalColumnsConfig, Config, StoreConfig};
use dynagraph::store::DynamoDbClient;
use std::time::Duration;

/// Run the init command to discover tables from a store or generate the example configuration
pub async fn run(
    example: bool,
    endpoint: String,
    region: String,
    output: Option<String>,
) -> anyhow::Result<()> {
    if example {
        run_example(output)
    } else {
        run_discovery(endpoint, region, output).await
    }
}

fn write_config(config: &Config, output: Option<&str>) -> anyhow::Result<()> {
    match output {
        Some(output_path) => {
            dynagraph::config::save_config(config, output_path)?;
            tracing::info!("📝 Generated {}", output_path);
            tracing::info!("🚀 Ready to serve! Run: dynagraph serve --config {}", output_path);
        }
        None => {
            let toml_string = toml::to_string_pretty(config)?;
            println!("{}", toml_string);
            tracing::info!("💡 Tip: Add --output <file> to save to a file instead of stdout");
        }
    }
    Ok(())
}

/// Generate example configuration
fn run_example(output: Option<String>) -> anyhow::Result<()> {
    tracing::info!("🎨 Generating the Animals example configuration...");

    let config = crate::cli::example::create_example_config();
    for table in &config.table {
        tracing::info!(
            "   • {} ({} global index(es))",
            table.name,
            table.global_indexes.len()
        );
    }

    write_config(&config, output.as_deref())
}

/// Discover tables from the store
async fn run_discovery(endpoint: String, region: String, output: Option<String>) -> anyhow::Result<()> {
    tracing::info!("🔍 Discovering tables at {}...", endpoint);

    let store = StoreConfig {
        endpoint: endpoint.clone(),
        region: region.clone(),
        ..StoreConfig::default()
    };
    let client = DynamoDbClient::new(endpoint, region, Duration::from_secs(store.timeout_secs))?;

    let catalog = CatalogBuilder::new()
        .discover(&client)
        .await
        .context("Table discovery failed")?;

    if catalog.is_empty() {
        tracing::warn!("No tables found at {}", store.endpoint);
        return Ok(());
    }

    tracing::info!("✅ Found {} table(s)", catalog.len());

    let config = Config {
        store,
        additional_columns: catalog
            .tables()
            .map(|table| AdditionalColumnsConfig {
                table: table.name.clone(),
                columns: Vec::new(),
            })
            .collect(),
        table: catalog.tables().map(|table| table.as_ref().clone()).collect(),
        ..Config::default()
    };

    write_config(&config, output.as_deref())
}
