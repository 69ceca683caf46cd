//! Source command handlers
//!
//! Create, edit and test go through the source editor, which enforces that
//! only the field group matching the database type is filled in.

use anyhow::{Result, anyhow, bail};
use clap::{Args, Subcommand};
use colored::*;
use strata_client::ApiClient;
use strata_core::domain::source::BackupSource;
use strata_editor::SourceEditor;
use uuid::Uuid;

use super::or_dash;
use crate::config::Config;
use crate::id_resolver::resolve_source_id;
use crate::types::{DatabaseArg, IdOrPrefix};

/// Source subcommands
#[derive(Subcommand)]
pub enum SourceCommands {
    /// List all backup sources
    List,
    /// Get source details
    Get {
        /// Source ID or unambiguous prefix
        id: String,
    },
    /// Create a backup source
    Create(SourceArgs),
    /// Change an existing backup source
    Edit {
        /// Source ID or unambiguous prefix
        id: String,

        #[command(flatten)]
        args: SourceArgs,
    },
    /// Ask the server to connect with the given settings
    Test {
        /// Start from an existing source
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        args: SourceArgs,
    },
    /// Delete a backup source
    Delete {
        /// Source ID or unambiguous prefix
        id: String,
    },
}

/// Source fields; host, port, database, user and password only apply to
/// server engines, `--path` only to file-based ones
#[derive(Args)]
pub struct SourceArgs {
    #[arg(long)]
    name: Option<String>,

    #[arg(long = "type", value_enum)]
    database_type: Option<DatabaseArg>,

    /// Path of the dump tool on the backup server
    #[arg(long)]
    dump_tool: Option<String>,

    /// Database file path
    #[arg(long)]
    path: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<String>,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long, env = "STRATA_DB_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl SourceArgs {
    /// Applies the given fields; the type goes first since it clears fields
    fn apply(self, editor: &mut SourceEditor) {
        if let Some(db_type) = self.database_type {
            editor.set_database_type(Some(db_type.into()));
        }
        if let Some(name) = self.name {
            editor.set_name(name);
        }
        if let Some(path) = self.dump_tool {
            editor.set_dump_tool_path(path);
        }
        if let Some(path) = self.path {
            editor.set_source_path(path);
        }
        if let Some(host) = self.host {
            editor.set_host(host);
        }
        if let Some(port) = self.port {
            editor.set_port(port);
        }
        if let Some(database) = self.database {
            editor.set_database_name(database);
        }
        if let Some(user) = self.user {
            editor.set_user(user);
        }
        if let Some(password) = self.password {
            editor.set_password(password);
        }
    }
}

pub async fn handle_source_command(command: SourceCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        SourceCommands::List => list_sources(&client).await,
        SourceCommands::Get { id } => get_source(&client, &id).await,
        SourceCommands::Create(args) => save_source(&client, None, args).await,
        SourceCommands::Edit { id, args } => {
            let uuid = resolve_source_id(&client, &IdOrPrefix::parse(&id)).await?;
            save_source(&client, Some(uuid), args).await
        }
        SourceCommands::Test { id, args } => {
            let uuid = match id {
                Some(id) => Some(resolve_source_id(&client, &IdOrPrefix::parse(&id)).await?),
                None => None,
            };
            test_source(&client, uuid, args).await
        }
        SourceCommands::Delete { id } => delete_source(&client, &id).await,
    }
}

async fn list_sources(client: &ApiClient) -> Result<()> {
    let sources = client.list_sources().await?;

    if sources.is_empty() {
        println!("{}", "No backup sources found.".yellow());
    } else {
        println!("{}", format!("Found {} backup source(s):", sources.len()).bold());
        println!();
        for source in sources {
            println!(
                "  {} {} {}",
                "▸".cyan(),
                source.name.bold(),
                source.id.to_string().dimmed()
            );
            println!("    Type:   {}", source.database_type);
            println!("    Target: {}", target(&source));
            println!();
        }
    }

    Ok(())
}

async fn get_source(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_source_id(client, &IdOrPrefix::parse(id)).await?;
    let source = client.get_source(uuid).await?;

    println!("{}", "Backup Source Details:".bold());
    println!("  ID:         {}", source.id.to_string().cyan());
    println!("  Name:       {}", source.name);
    println!("  Type:       {}", source.database_type);
    println!("  Dump tool:  {}", or_dash(Some(source.db_dump_tool_path.as_str())));
    if source.database_type.is_file_based() {
        println!("  Path:       {}", or_dash(source.source_path.as_deref()));
    } else {
        println!("  Host:       {}", or_dash(source.db_host.as_deref()));
        println!(
            "  Port:       {}",
            or_dash(source.db_port.map(|p| p.to_string()).as_deref())
        );
        println!("  Database:   {}", or_dash(source.db_name.as_deref()));
        println!("  User:       {}", or_dash(source.db_user.as_deref()));
    }

    Ok(())
}

async fn save_source(client: &ApiClient, source_id: Option<Uuid>, args: SourceArgs) -> Result<()> {
    let mut editor = SourceEditor::open(client, source_id).await?;
    args.apply(&mut editor);

    let editing = editor.mode().is_edit();
    let source = editor.submit(client).await?;

    let verb = if editing { "Updated" } else { "Created" };
    println!("{} {} backup source {}", "✓".green(), verb, source.name.cyan());
    println!("  ID: {}", source.id.to_string().dimmed());

    Ok(())
}

async fn test_source(client: &ApiClient, source_id: Option<Uuid>, args: SourceArgs) -> Result<()> {
    let mut editor = SourceEditor::open(client, source_id).await?;
    args.apply(&mut editor);

    let result = editor.test_connection(client).await;
    if !result.success {
        bail!(result.message);
    }

    println!("{} {}", "✓".green(), result.message);
    Ok(())
}

async fn delete_source(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_source_id(client, &IdOrPrefix::parse(id)).await?;

    client
        .delete_source(uuid)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to delete backup source")))?;

    println!("{} Deleted backup source {}", "✓".green(), uuid.to_string().dimmed());
    Ok(())
}

/// Where a source's data lives, for summaries
fn target(source: &BackupSource) -> String {
    if source.database_type.is_file_based() {
        return source.source_path.clone().unwrap_or_default();
    }

    let host = source.db_host.as_deref().unwrap_or_default();
    let db = source.db_name.as_deref().unwrap_or_default();
    match source.db_port {
        Some(port) => format!("{}:{}/{}", host, port, db),
        None => format!("{}/{}", host, db),
    }
}
