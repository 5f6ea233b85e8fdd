use std::process::ExitCode;

use clap::{Parser, Subcommand};
use core_config::tracing::{init_tracing, install_color_eyre};
use core_config::{Environment, FromEnv};
use eyre::Result;
use gateway_hooks::{GatewayClient, HookConfig, HookError, parse_event, precompact, retrieve};
use serde_json::json;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "gateway-hooks")]
#[command(about = "Transcript vectorization and context retrieval hooks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store long transcript entries and replace them with vector stubs
    Precompact,

    /// Look up stored context for a prompt or tool call
    Retrieve,
}

fn fail(err: &HookError) -> ExitCode {
    eprintln!("{}", json!({"error": err.to_string(), "kind": err.kind()}));
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    install_color_eyre();
    let cli = Cli::parse();
    init_tracing(&Environment::from_env());

    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;

    match cli.command {
        Commands::Precompact => {
            let outcome = async {
                let event = parse_event(&raw)?;
                let config = HookConfig::from_env()?;
                let client = GatewayClient::new(&config)?;
                precompact::precompact(&client, &config, &event).await
            }
            .await;

            match outcome {
                Ok(report) => {
                    println!("{}", serde_json::to_string(&report)?);
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(fail(&e)),
            }
        }
        Commands::Retrieve => {
            let response = match parse_event(&raw).and_then(|event| {
                let config = HookConfig::from_env()?;
                let client = GatewayClient::new(&config)?;
                Ok((event, config, client))
            }) {
                Ok((event, config, client)) => retrieve::retrieve(&client, &config, &event).await,
                Err(e) => {
                    tracing::warn!(error = %e, "Retrieval skipped");
                    retrieve::approve()
                }
            };
            println!("{}", response);
            Ok(ExitCode::SUCCESS)
        }
    }
}
