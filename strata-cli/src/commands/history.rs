//! Backup history command handlers
//!
//! Lists past backup runs, newest first, and restores a chosen one.

use anyhow::{Result, anyhow};
use clap::Subcommand;
use colored::*;
use strata_client::ApiClient;
use strata_core::domain::record::{BackupRecord, BackupStatus};
use uuid::Uuid;

use super::or_dash;
use crate::config::Config;

/// History subcommands
#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List backup runs, newest first
    List {
        /// Page number, starting at 0
        #[arg(long, default_value_t = 0)]
        page: u32,

        #[arg(long, default_value_t = 10)]
        size: u32,
    },
    /// Restore a backup into its source
    Restore {
        /// Full ID of the backup record
        record_id: Uuid,
    },
}

pub async fn handle_history_command(command: HistoryCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        HistoryCommands::List { page, size } => list_history(&client, page, size).await,
        HistoryCommands::Restore { record_id } => restore(&client, record_id).await,
    }
}

async fn list_history(client: &ApiClient, page: u32, size: u32) -> Result<()> {
    let page = client.backup_history(page, size.max(1)).await?;

    if page.content.is_empty() {
        println!("{}", "No backups found.".yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(
            "Backups {} of {} (page {}/{}):",
            page.content.len(),
            page.total_elements,
            page.number + 1,
            page.total_pages.max(1)
        )
        .bold()
    );
    println!();
    for record in &page.content {
        print_record(record);
    }

    if !page.is_last() {
        println!(
            "{}",
            format!("More with --page {}", page.number + 1).dimmed()
        );
    }

    Ok(())
}

async fn restore(client: &ApiClient, record_id: Uuid) -> Result<()> {
    client
        .restore_backup(record_id)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to start the restore")))?;

    println!("{} Restore started from backup {}", "✓".green(), record_id.to_string().cyan());
    Ok(())
}

fn print_record(record: &BackupRecord) {
    println!(
        "  {} {} {}",
        "▸".cyan(),
        record.filename.bold(),
        record.id.to_string().dimmed()
    );
    println!("    Job:    {}", record.job.name);
    println!("    Status: {}", colorize_status(record.status));
    println!(
        "    Taken:  {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    println!("    Size:   {}", human_size(record.size_bytes));
    println!("    Path:   {}", or_dash(record.remote_path.as_deref()));
    if let Some(summary) = record.log_summary.as_deref().filter(|s| !s.is_empty()) {
        println!("    Log:    {}", summary.dimmed());
    }
    println!();
}

fn colorize_status(status: BackupStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        BackupStatus::Success => text.green(),
        BackupStatus::Failed => text.red(),
        BackupStatus::InProgress => text.cyan(),
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
