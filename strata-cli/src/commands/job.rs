//! Job command handlers
//!
//! Handles listing, viewing, creating, editing, running and deleting backup
//! jobs, and following a job's live log stream.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use colored::*;
use strata_client::ApiClient;
use strata_core::domain::job::{BackupJob, NotificationPolicy};
use strata_editor::{DestinationCatalog, JobEditor};
use strata_stream::viewer::{MISSING_JOB_ID, STREAM_CLOSED};
use strata_stream::{ConnectionManager, LogViewer};
use uuid::Uuid;

use super::{check_mark, or_dash};
use crate::config::Config;
use crate::id_resolver::{
    resolve_destination_ids, resolve_email_config_id, resolve_job_id, resolve_source_id,
};
use crate::types::{IdOrPrefix, PolicyArg, ScheduleArg};

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// List all backup jobs
    List,
    /// Get job details
    Get {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Create a backup job
    Create(JobArgs),
    /// Change an existing backup job
    Edit {
        /// Job ID or unambiguous prefix
        id: String,

        #[command(flatten)]
        args: JobArgs,
    },
    /// Start a backup now
    Run {
        /// Job ID or unambiguous prefix
        id: String,

        /// Follow the job's log stream after starting it
        #[arg(short, long)]
        follow: bool,
    },
    /// Delete a backup job
    Delete {
        /// Job ID or unambiguous prefix
        id: String,
    },
    /// Follow a job's live log stream until Ctrl-C
    Logs {
        /// Job ID or unambiguous prefix
        id: String,
    },
}

/// Editable job fields; anything left out keeps its current or default value
#[derive(Args)]
pub struct JobArgs {
    #[arg(long)]
    name: Option<String>,

    /// Source ID or prefix
    #[arg(long)]
    source: Option<String>,

    /// Destination ID or prefix; repeat for several. Replaces the selection.
    #[arg(long = "destination")]
    destinations: Vec<String>,

    #[arg(long, value_enum)]
    schedule: Option<ScheduleArg>,

    /// Time of day, HH:MM or HH:MM:SS
    #[arg(long)]
    time: Option<String>,

    /// Days to keep backups
    #[arg(long)]
    retention: Option<u32>,

    /// Enable or disable the schedule
    #[arg(long)]
    active: Option<bool>,

    #[arg(long, value_enum)]
    notify: Option<PolicyArg>,

    /// Comma-separated notification recipients
    #[arg(long)]
    recipients: Option<String>,

    /// Email configuration ID or prefix
    #[arg(long)]
    email_config: Option<String>,
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        JobCommands::List => list_jobs(&client).await,
        JobCommands::Get { id } => get_job(&client, &id).await,
        JobCommands::Create(args) => save_job(&client, None, args).await,
        JobCommands::Edit { id, args } => {
            let uuid = resolve_job_id(&client, &IdOrPrefix::parse(&id)).await?;
            save_job(&client, Some(uuid), args).await
        }
        JobCommands::Run { id, follow } => run_job(config, &client, &id, follow).await,
        JobCommands::Delete { id } => delete_job(&client, &id).await,
        JobCommands::Logs { id } => {
            let job_id = if id.trim().is_empty() {
                String::new()
            } else {
                resolve_job_id(&client, &IdOrPrefix::parse(&id))
                    .await?
                    .to_string()
            };
            follow_logs(config, &job_id).await
        }
    }
}

async fn list_jobs(client: &ApiClient) -> Result<()> {
    let jobs = client.list_jobs().await?;

    if jobs.is_empty() {
        println!("{}", "No backup jobs found.".yellow());
    } else {
        println!("{}", format!("Found {} backup job(s):", jobs.len()).bold());
        println!();
        for job in jobs {
            print_job_summary(&job);
        }
    }

    Ok(())
}

async fn get_job(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;
    let job = client.get_job(uuid).await?;

    print_job_details(&job);

    Ok(())
}

/// Opens an editor, applies the given fields and submits
///
/// Validation happens in the editor, so nothing is sent for an incomplete job.
async fn save_job(client: &ApiClient, job_id: Option<Uuid>, args: JobArgs) -> Result<()> {
    let catalog = DestinationCatalog::fetch(client).await?;
    let mut editor = JobEditor::open(client, &catalog, job_id).await?;

    if let Some(name) = args.name {
        editor.set_name(name);
    }
    if let Some(source) = args.source {
        let source_id = resolve_source_id(client, &IdOrPrefix::parse(&source)).await?;
        editor.set_source(Some(source_id));
    }
    if !args.destinations.is_empty() {
        let ids = resolve_destination_ids(client, &args.destinations).await?;
        let unknown = editor.replace_destinations(&ids);
        if !unknown.is_empty() {
            let unknown: Vec<String> = unknown.iter().map(Uuid::to_string).collect();
            return Err(anyhow!("Unknown destination(s): {}", unknown.join(", ")));
        }
    }
    if let Some(schedule) = args.schedule {
        editor.set_schedule_type(schedule.into());
    }
    if let Some(time) = args.time {
        editor.set_backup_time(time);
    }
    if let Some(days) = args.retention {
        editor.set_retention_days(Some(days));
    }
    if let Some(active) = args.active {
        editor.set_active(active);
    }
    if let Some(policy) = args.notify {
        editor.set_notification_policy(policy.into());
    }
    if let Some(recipients) = args.recipients {
        editor.set_notification_recipients(recipients);
    }
    if let Some(email_config) = args.email_config {
        let config_id = resolve_email_config_id(client, &IdOrPrefix::parse(&email_config)).await?;
        editor.set_email_config(Some(config_id));
    }

    let editing = editor.mode().is_edit();
    let job = editor.submit(client).await?;

    let verb = if editing { "Updated" } else { "Created" };
    println!("{} {} backup job {}", "✓".green(), verb, job.name.cyan());
    println!("  ID: {}", job.id.to_string().dimmed());

    Ok(())
}

async fn run_job(config: &Config, client: &ApiClient, id: &str, follow: bool) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;

    client
        .execute_job(uuid)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to start backup")))?;

    println!("{} Backup started for job {}", "✓".green(), uuid.to_string().cyan());

    if follow {
        follow_logs(config, &uuid.to_string()).await?;
    }

    Ok(())
}

async fn delete_job(client: &ApiClient, id: &str) -> Result<()> {
    let uuid = resolve_job_id(client, &IdOrPrefix::parse(id)).await?;

    client
        .delete_job(uuid)
        .await
        .map_err(|e| anyhow!(e.user_message("Failed to delete backup job")))?;

    println!("{} Deleted backup job {}", "✓".green(), uuid.to_string().dimmed());
    Ok(())
}

/// Prints a job's log lines as they arrive, until the stream ends or Ctrl-C
async fn follow_logs(config: &Config, job_id: &str) -> Result<()> {
    let manager = ConnectionManager::start(config.stream_config())
        .context("Invalid log stream configuration")?;
    let mut viewer = LogViewer::open(&manager, job_id);

    if viewer.is_streaming() {
        println!("{}", format!("Logs for job {} (Ctrl-C to stop):", job_id).bold());
        println!("{}", "─".repeat(80).dimmed());
    } else {
        for line in viewer.lines() {
            print_log_line(line);
        }
    }

    print_until(&mut viewer, tokio::signal::ctrl_c()).await;

    viewer.close();
    manager.shutdown().await;

    Ok(())
}

/// Prints lines until the stream ends or `stop` completes, returning how many
///
/// `stop` is polled across iterations, so it fires even while a line prints.
async fn print_until<F: Future>(viewer: &mut LogViewer, stop: F) -> usize {
    tokio::pin!(stop);
    let mut printed = 0;

    while viewer.is_streaming() {
        tokio::select! {
            line = viewer.next_line() => match line {
                Some(line) => print_log_line(line),
                None => break,
            },
            _ = &mut stop => break,
        }
        printed += 1;
    }

    printed
}

fn print_log_line(line: &str) {
    if line.starts_with("[error]") {
        println!("{}", line.red());
    } else if line == STREAM_CLOSED || line == MISSING_JOB_ID {
        println!("{}", line.yellow());
    } else {
        println!("{}", line);
    }
}

fn print_job_summary(job: &BackupJob) {
    println!("  {} {} {}", "▸".cyan(), job.name.bold(), job.id.to_string().dimmed());
    println!("    Source:    {}", job.source.name);
    println!(
        "    Schedule:  {} at {}",
        job.schedule_type, job.backup_time
    );
    println!("    Active:    {}", check_mark(job.is_active));
    println!();
}

fn print_job_details(job: &BackupJob) {
    println!("{}", "Backup Job Details:".bold());
    println!("  ID:           {}", job.id.to_string().cyan());
    println!("  Name:         {}", job.name);
    println!(
        "  Source:       {} {}",
        job.source.name,
        format!("({})", job.source.database_type).dimmed()
    );
    println!("  Schedule:     {}", job.schedule_type);
    println!("  Backup time:  {}", job.backup_time);
    println!("  Retention:    {} day(s)", job.retention_days);
    println!("  Active:       {}", check_mark(job.is_active));

    println!("\n{}", "Destinations:".bold());
    if job.destinations.is_empty() {
        println!("  {}", "none".dimmed());
    }
    for dest in &job.destinations {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            dest.name,
            format!("({})", dest.destination_type).dimmed()
        );
    }

    println!("\n{}", "Notifications:".bold());
    println!("  Policy:       {}", job.notification_policy);
    if job.notification_policy != NotificationPolicy::Never {
        println!(
            "  Recipients:   {}",
            or_dash(job.notification_recipients.as_deref())
        );
        println!(
            "  Email config: {}",
            or_dash(job.email_config.as_ref().map(|c| c.name.as_str()))
        );
    }
}
