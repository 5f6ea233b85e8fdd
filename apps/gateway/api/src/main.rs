//! Gateway REST API
//!
//! Waits for Qdrant, loads the embedding model, ensures the default
//! collection and then serves the REST routes with OpenAPI docs at `/docs`.

use std::path::PathBuf;

use axum_helpers::{create_production_app, create_router};
use clap::Parser;
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_vector::{ConfigOverrides, GatewayApiDoc, GatewayConfig, build_service, router};
use eyre::{Result, WrapErr};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gateway-api")]
#[command(about = "Embedding and semantic search REST API over Qdrant")]
struct Cli {
    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, env = "QDRANT_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Qdrant gRPC endpoint
    #[arg(long)]
    qdrant_url: Option<String>,

    /// Listen host
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Default collection
    #[arg(long)]
    collection: Option<String>,

    /// Embedding provider (fastembed, openai, hashing)
    #[arg(long)]
    embedding_provider: Option<String>,

    /// Embedding model name
    #[arg(long)]
    embedding_model: Option<String>,
}

impl From<Cli> for ConfigOverrides {
    fn from(cli: Cli) -> Self {
        Self {
            config_file: cli.config,
            qdrant_url: cli.qdrant_url,
            api_host: cli.host,
            api_port: cli.port,
            mcp_port: None,
            collection: cli.collection,
            embedding_provider: cli.embedding_provider,
            embedding_model: cli.embedding_model,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let overrides = ConfigOverrides::from(Cli::parse());
    init_tracing(&Environment::from_env());

    let config = GatewayConfig::load(&overrides).wrap_err("Failed to load gateway configuration")?;
    let service = build_service(&config)
        .await
        .wrap_err("Failed to start the vector service")?;

    let app = create_router::<GatewayApiDoc>(router(service), &config.router_options())
        .wrap_err("Failed to build router")?;

    info!(
        collection = %config.vector.collection_name,
        "Starting gateway API with graceful shutdown"
    );
    create_production_app(
        app,
        &config.api_server(),
        config.shutdown_timeout(),
        async {
            info!("Shutting down gateway API");
        },
    )
    .await
    .wrap_err("Server error")?;

    info!("Gateway API shutdown complete");
    Ok(())
}
