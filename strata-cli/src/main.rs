//! Strata CLI
//!
//! Command-line interface for configuring and monitoring backup jobs.

mod commands;
mod config;
mod id_resolver;
mod session;
mod types;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata backup jobs CLI", long_about = None)]
struct Cli {
    /// Backup server URL
    #[arg(long, env = "STRATA_API_URL", default_value = "http://localhost:8082")]
    api_url: String,

    /// Log broker WebSocket endpoint
    #[arg(
        long,
        env = "STRATA_BROKER_URL",
        default_value = "ws://localhost:8082/ws-backup"
    )]
    broker_url: String,

    /// Bearer token (overrides the stored session)
    #[arg(long, env = "STRATA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Where the login session is stored
    #[arg(long, env = "STRATA_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "strata=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        broker_url: cli.broker_url,
        token: cli.token,
        session_file: cli.session_file.unwrap_or_else(config::default_session_file),
    };

    handle_command(cli.command, &config).await
}
