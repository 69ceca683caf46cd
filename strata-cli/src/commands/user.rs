//! User command handlers

use anyhow::{Result, anyhow};
use clap::Subcommand;
use colored::*;
use strata_client::ApiClient;
use strata_core::dto::auth::RegisterRequest;

use crate::config::Config;
use crate::id_resolver::resolve_user_id;
use crate::types::IdOrPrefix;

/// User subcommands
#[derive(Subcommand)]
pub enum UserCommands {
    /// List all users
    List,
    /// Register a user
    Create {
        #[arg(long)]
        email: String,

        /// Initial password; the user is asked to change it at first login
        #[arg(long, env = "STRATA_NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Delete a user
    Delete {
        /// User ID or unambiguous prefix
        id: String,
    },
}

pub async fn handle_user_command(command: UserCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        UserCommands::List => list_users(&client).await,
        UserCommands::Create { email, password } => create_user(&client, email, password).await,
        UserCommands::Delete { id } => delete_user(&client, &id).await,
    }
}

async fn list_users(client: &ApiClient) -> Result<()> {
    let users = client.list_users().await?;

    if users.is_empty() {
        println!("{}", "No users found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} user(s):", users.len()).bold());
    println!();
    for user in users {
        println!("  {} {} {}", "▸".cyan(), user.email, user.id.to_string().dimmed());
    }

    Ok(())
}

async fn create_user(client: &ApiClient, email: String, password: String) -> Result<()> {
    let req = RegisterRequest {
        email: email.trim().to_string(),
        password,
    };

    let user = client
        .create_user(&req)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to create user")))?;

    println!("{} Created user {}", "✓".green(), user.email.cyan());
    println!("  ID: {}", user.id.to_string().dimmed());
    Ok(())
}

async fn delete_user(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_user_id(client, &IdOrPrefix::parse(id)).await?;

    client
        .delete_user(uuid)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to delete user")))?;

    println!("{} Deleted user {}", "✓".green(), uuid.to_string().dimmed());
    Ok(())
}
