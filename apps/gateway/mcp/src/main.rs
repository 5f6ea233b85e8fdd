//! Gateway MCP server
//!
//! Serves the qdrant tools to MCP clients, either as a child process over
//! stdin/stdout or as an HTTP endpoint. Logs always go to stderr.

use std::path::PathBuf;
use std::sync::Arc;

use axum_helpers::create_production_app;
use clap::{Parser, ValueEnum};
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_vector::{ConfigOverrides, GatewayConfig, build_service};
use eyre::{Result, WrapErr};
use qdrant_mcp::McpServer;
use qdrant_mcp::transport::{self, HttpOptions};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Parser, Debug)]
#[command(name = "gateway-mcp")]
#[command(about = "Model Context Protocol server for Qdrant semantic memory")]
struct Cli {
    /// How clients reach the server
    #[arg(short, long, value_enum, default_value_t = Transport::Stdio)]
    transport: Transport,

    /// Configuration file (YAML, JSON or TOML)
    #[arg(short, long, env = "QDRANT_MCP_CONFIG")]
    config: Option<PathBuf>,

    /// Qdrant gRPC endpoint
    #[arg(long)]
    qdrant_url: Option<String>,

    /// HTTP listen port
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

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            qdrant_url: self.qdrant_url.clone(),
            mcp_port: self.port,
            collection: self.collection.clone(),
            embedding_provider: self.embedding_provider.clone(),
            embedding_model: self.embedding_model.clone(),
            ..ConfigOverrides::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let cli = Cli::parse();
    init_tracing(&Environment::from_env());

    let config =
        GatewayConfig::load(&cli.overrides()).wrap_err("Failed to load gateway configuration")?;
    let service = build_service(&config)
        .await
        .wrap_err("Failed to start the vector service")?;
    let server = McpServer::from_settings(service, &config.mcp);

    match cli.transport {
        Transport::Stdio => {
            info!("Serving MCP over stdio");
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            transport::serve_stdio(&server, stdin, tokio::io::stdout())
                .await
                .wrap_err("stdio transport failed")?;
        }
        Transport::Http => {
            let app = transport::router(Arc::new(server), &HttpOptions::from_config(&config));
            info!("Serving MCP over HTTP at /mcp");
            create_production_app(app, &config.mcp_server(), config.shutdown_timeout(), async {
                info!("Shutting down MCP server");
            })
            .await
            .wrap_err("Server error")?;
        }
    }

    info!("MCP server stopped");
    Ok(())
}
