//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod auth;
mod destination;
mod email;
mod history;
mod job;
mod source;
mod user;

pub use auth::AuthCommands;
pub use destination::DestinationCommands;
pub use email::EmailCommands;
pub use history::HistoryCommands;
pub use job::JobCommands;
pub use source::SourceCommands;
pub use user::UserCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use strata_client::ClientError;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Login, password change and logout
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Backup job management
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
    /// Backup source management
    Source {
        #[command(subcommand)]
        command: SourceCommands,
    },
    /// Backup destination management
    Destination {
        #[command(subcommand)]
        command: DestinationCommands,
    },
    /// Notification email configurations
    Email {
        #[command(subcommand)]
        command: EmailCommands,
    },
    /// User management
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Backup history and restore
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    let result = match command {
        Commands::Auth { command } => auth::handle_auth_command(command, config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
        Commands::Source { command } => source::handle_source_command(command, config).await,
        Commands::Destination { command } => {
            destination::handle_destination_command(command, config).await
        }
        Commands::Email { command } => email::handle_email_command(command, config).await,
        Commands::User { command } => user::handle_user_command(command, config).await,
        Commands::History { command } => history::handle_history_command(command, config).await,
    };

    result.map_err(with_next_step)
}

/// Adds what to do next when the server refused the token or lacks the resource
fn with_next_step(err: anyhow::Error) -> anyhow::Error {
    let hint = match err.downcast_ref::<ClientError>() {
        Some(e) if e.is_unauthorized() => {
            "The server rejected the session: run `strata auth login` again"
        }
        Some(e) if e.is_not_found() => "The server has no such resource",
        _ => return err,
    };
    err.context(hint)
}

/// `✓`/`✗` marker for a yes/no value
fn check_mark(value: bool) -> ColoredString {
    if value { "✓".green() } else { "✗".red() }
}

/// Text for an optional value, dimmed placeholder when absent
fn or_dash(value: Option<&str>) -> ColoredString {
    match value {
        Some(v) if !v.is_empty() => v.normal(),
        _ => "-".dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_rejected_token_suggests_login() {
        let err = with_next_step(ClientError::api_error(401, "Token expired").into());
        assert!(err.to_string().contains("strata auth login"));
        assert_eq!(err.root_cause().to_string(), "API error (status 401): Token expired");
    }

    #[test]
    fn test_hint_survives_context() {
        let err = Err::<(), _>(ClientError::api_error(404, "Job not found"))
            .context("Failed to fetch jobs for ID resolution")
            .unwrap_err();
        let err = with_next_step(err);
        assert_eq!(err.to_string(), "The server has no such resource");
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err = with_next_step(ClientError::api_error(500, "boom").into());
        assert_eq!(err.to_string(), "API error (status 500): boom");
    }
}
