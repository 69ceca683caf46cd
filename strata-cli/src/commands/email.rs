//! Email configuration command handlers
//!
//! SMTP settings used by jobs that send notifications.

use anyhow::{Result, anyhow};
use clap::{Args, Subcommand};
use colored::*;
use strata_client::ApiClient;
use strata_core::dto::email::EmailConfigRequest;

use crate::config::Config;
use crate::id_resolver::resolve_email_config_id;
use crate::types::IdOrPrefix;

/// Email configuration subcommands
#[derive(Subcommand)]
pub enum EmailCommands {
    /// List all email configurations
    List,
    /// Get email configuration details
    Get {
        /// Configuration ID or unambiguous prefix
        id: String,
    },
    /// Create an email configuration
    Create(EmailArgs),
    /// Send a test message with the given settings
    Test(EmailArgs),
    /// Delete an email configuration
    Delete {
        /// Configuration ID or unambiguous prefix
        id: String,
    },
}

#[derive(Args)]
pub struct EmailArgs {
    #[arg(long)]
    name: String,

    /// SMTP host
    #[arg(long)]
    host: String,

    #[arg(long, default_value_t = 587)]
    port: u16,

    #[arg(long)]
    username: String,

    #[arg(long, env = "STRATA_SMTP_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl From<EmailArgs> for EmailConfigRequest {
    fn from(args: EmailArgs) -> Self {
        Self {
            name: args.name.trim().to_string(),
            host: args.host.trim().to_string(),
            port: args.port,
            username: args.username.trim().to_string(),
            password: args.password.filter(|p| !p.is_empty()),
        }
    }
}

pub async fn handle_email_command(command: EmailCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        EmailCommands::List => list_configs(&client).await,
        EmailCommands::Get { id } => get_config(&client, &id).await,
        EmailCommands::Create(args) => create_config(&client, args.into()).await,
        EmailCommands::Test(args) => test_config(&client, args.into()).await,
        EmailCommands::Delete { id } => delete_config(&client, &id).await,
    }
}

async fn list_configs(client: &ApiClient) -> Result<()> {
    let configs = client.list_email_configs().await?;

    if configs.is_empty() {
        println!("{}", "No email configurations found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} email configuration(s):", configs.len()).bold()
    );
    println!();
    for cfg in configs {
        println!("  {} {} {}", "▸".cyan(), cfg.name.bold(), cfg.id.to_string().dimmed());
        println!("    Server: {}:{}", cfg.host, cfg.port);
        println!("    User:   {}", cfg.username);
        println!();
    }

    Ok(())
}

async fn get_config(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_email_config_id(client, &IdOrPrefix::parse(id)).await?;
    let cfg = client.get_email_config(uuid).await?;

    println!("{}", "Email Configuration Details:".bold());
    println!("  ID:       {}", cfg.id.to_string().cyan());
    println!("  Name:     {}", cfg.name);
    println!("  Server:   {}:{}", cfg.host, cfg.port);
    println!("  Username: {}", cfg.username);

    Ok(())
}

async fn create_config(client: &ApiClient, req: EmailConfigRequest) -> Result<()> {
    let cfg = client
        .create_email_config(&req)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to save email configuration")))?;

    println!("{} Created email configuration {}", "✓".green(), cfg.name.cyan());
    println!("  ID: {}", cfg.id.to_string().dimmed());
    Ok(())
}

async fn test_config(client: &ApiClient, req: EmailConfigRequest) -> Result<()> {
    let message = client
        .test_email_config(&req)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to reach the mail server")))?;

    println!("{} {}", "✓".green(), message);
    Ok(())
}

async fn delete_config(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_email_config_id(client, &IdOrPrefix::parse(id)).await?;

    client
        .delete_email_config(uuid)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to delete email configuration")))?;

    println!("{} Deleted email configuration {}", "✓".green(), uuid.to_string().dimmed());
    Ok(())
}
