use clap::{Parser, Subcommand};

mod cli;

#[derive(Parser)]
#[command(name = "dynagraph")]
#[command(version = "0.1.0")]
#[command(about = "Turn DynamoDB tables into GraphQL APIs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate configuration from a store's tables, or the example configuration
    Init {
        /// Generate the Animals example configuration (in-memory store)
        #[arg(long)]
        example: bool,

        /// Store endpoint to discover tables from
        #[arg(long, default_value = "http://localhost:8000")]
        endpoint: String,

        /// Store region
        #[arg(long, default_value = "us-east-1")]
        region: String,

        /// Output config file path (if not specified, outputs to stdout)
        #[arg(long)]
        output: Option<String>,
    },

    /// Start GraphQL server
    Serve {
        /// Config file path
        #[arg(long, default_value = "dynagraph.toml")]
        config: String,

        /// Server port (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            example,
            endpoint,
            region,
            output,
        } => {
            cli::init::run(example, endpoint, region, output).await?;
        }
        Commands::Serve { config, port } => {
            cli::serve::run(config, port).await?;
        }
    }

    Ok(())
}
