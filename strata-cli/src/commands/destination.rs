//! Destination command handlers

use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};
use colored::*;
use strata_client::ApiClient;
use strata_core::dto::destination::BackupDestinationRequest;

use super::{check_mark, or_dash};
use crate::config::Config;
use crate::id_resolver::resolve_destination_id;
use crate::types::{DestinationTypeArg, IdOrPrefix};

/// Destination subcommands
#[derive(Subcommand)]
pub enum DestinationCommands {
    /// List all backup destinations
    List,
    /// Get destination details
    Get {
        /// Destination ID or unambiguous prefix
        id: String,
    },
    /// Create a backup destination
    Create(DestinationArgs),
    /// Ask the server to reach the given storage target
    Test(DestinationArgs),
    /// Delete a backup destination
    Delete {
        /// Destination ID or unambiguous prefix
        id: String,
    },
}

#[derive(Args)]
pub struct DestinationArgs {
    #[arg(long)]
    name: String,

    #[arg(long = "type", value_enum)]
    destination_type: DestinationTypeArg,

    /// Directory, bucket URL or FTP address
    #[arg(long)]
    endpoint: String,

    #[arg(long)]
    region: Option<String>,

    #[arg(long)]
    access_key: Option<String>,

    #[arg(long, env = "STRATA_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Create the destination disabled
    #[arg(long)]
    inactive: bool,
}

impl DestinationArgs {
    fn into_request(self) -> Result<BackupDestinationRequest> {
        let name = self.name.trim().to_string();
        let endpoint = self.endpoint.trim().to_string();
        if name.is_empty() || endpoint.is_empty() {
            bail!("A destination needs a name and an endpoint");
        }

        let non_blank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Ok(BackupDestinationRequest {
            name,
            destination_type: self.destination_type.into(),
            endpoint,
            region: non_blank(self.region),
            access_key: non_blank(self.access_key),
            secret_key: non_blank(self.secret_key),
            is_active: !self.inactive,
        })
    }
}

pub async fn handle_destination_command(
    command: DestinationCommands,
    config: &Config,
) -> Result<()> {
    let client = config.client()?;

    match command {
        DestinationCommands::List => list_destinations(&client).await,
        DestinationCommands::Get { id } => get_destination(&client, &id).await,
        DestinationCommands::Create(args) => create_destination(&client, args).await,
        DestinationCommands::Test(args) => test_destination(&client, args).await,
        DestinationCommands::Delete { id } => delete_destination(&client, &id).await,
    }
}

async fn list_destinations(client: &ApiClient) -> Result<()> {
    let destinations = client.list_destinations().await?;

    if destinations.is_empty() {
        println!("{}", "No backup destinations found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!("Found {} backup destination(s):", destinations.len()).bold()
    );
    println!();
    for dest in destinations {
        println!("  {} {} {}", "▸".cyan(), dest.name.bold(), dest.id.to_string().dimmed());
        println!("    Type:     {}", dest.destination_type);
        println!("    Endpoint: {}", dest.endpoint);
        println!("    Active:   {}", check_mark(dest.is_active));
        println!();
    }

    Ok(())
}

async fn get_destination(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_destination_id(client, &IdOrPrefix::parse(id)).await?;
    let dest = client.get_destination(uuid).await?;

    println!("{}", "Backup Destination Details:".bold());
    println!("  ID:         {}", dest.id.to_string().cyan());
    println!("  Name:       {}", dest.name);
    println!("  Type:       {}", dest.destination_type);
    println!("  Endpoint:   {}", dest.endpoint);
    println!("  Region:     {}", or_dash(dest.region.as_deref()));
    println!("  Access key: {}", or_dash(dest.access_key.as_deref()));
    println!("  Active:     {}", check_mark(dest.is_active));

    Ok(())
}

async fn create_destination(client: &ApiClient, args: DestinationArgs) -> Result<()> {
    let req = args.into_request()?;

    let dest = client
        .create_destination(&req)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to save backup destination")))?;

    println!("{} Created backup destination {}", "✓".green(), dest.name.cyan());
    println!("  ID: {}", dest.id.to_string().dimmed());
    Ok(())
}

async fn test_destination(client: &ApiClient, args: DestinationArgs) -> Result<()> {
    let req = args.into_request()?;

    let message = client
        .test_destination_connection(&req)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to reach the destination")))?;

    println!("{} {}", "✓".green(), message);
    Ok(())
}

async fn delete_destination(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_destination_id(client, &IdOrPrefix::parse(id)).await?;

    client
        .delete_destination(uuid)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to delete backup destination")))?;

    println!("{} Deleted backup destination {}", "✓".green(), uuid.to_string().dimmed());
    Ok(())
}
