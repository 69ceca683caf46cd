//! Auth command handlers
//!
//! Login stores the returned token in the session file. When the server asks
//! for a new password, the session is marked and every other command refuses
//! to run until `change-password` succeeds.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use strata_core::dto::auth::{ChangePasswordRequest, LoginRequest};

use crate::config::Config;
use crate::session::Session;

/// Auth subcommands
#[derive(Subcommand)]
pub enum AuthCommands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "STRATA_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Replace the password of the logged-in account
    ChangePassword {
        /// Defaults to the email of the stored session
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        old_password: String,

        #[arg(long)]
        new_password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is logged in
    Status,
}

pub async fn handle_auth_command(command: AuthCommands, config: &Config) -> Result<()> {
    match command {
        AuthCommands::Login { email, password } => login(config, email, password).await,
        AuthCommands::ChangePassword {
            email,
            old_password,
            new_password,
        } => change_password(config, email, old_password, new_password).await,
        AuthCommands::Logout => logout(config),
        AuthCommands::Status => status(config),
    }
}

async fn login(config: &Config, email: String, password: String) -> Result<()> {
    let client = config.anonymous_client();
    let req = LoginRequest {
        email: email.clone(),
        password,
    };

    let resp = client
        .login(&req)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Login failed")))?;

    let session = Session::from_login(email, resp);
    session.save(&config.session_file)?;

    println!("{} Logged in as {}", "✓".green(), session.email.cyan());
    if session.must_change_password {
        println!(
            "{}",
            "⚠ A password change is required before anything else.".yellow()
        );
        println!(
            "{}",
            "  Run `strata auth change-password --old-password .. --new-password ..`".dimmed()
        );
    }

    Ok(())
}

async fn change_password(
    config: &Config,
    email: Option<String>,
    old_password: String,
    new_password: String,
) -> Result<()> {
    let stored = Session::load(&config.session_file)?;

    let email = match (email, &stored) {
        (Some(email), _) => email,
        (None, Some(session)) => session.email.clone(),
        (None, None) => bail!("No stored session: pass --email"),
    };

    if new_password.is_empty() {
        bail!("The new password must not be empty");
    }
    if new_password == old_password {
        bail!("The new password must differ from the old one");
    }

    let req = ChangePasswordRequest {
        email: email.clone(),
        old_password,
        new_password,
    };

    // The change endpoint accepts the pending session's token
    let mut client = config.anonymous_client();
    if let Some(token) = config
        .token
        .clone()
        .or_else(|| stored.as_ref().map(|s| s.token.clone()))
    {
        client = client.with_token(token);
    }

    let resp = client
        .change_password(&req)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Failed to change password")))?;

    Session::from_login(email, resp)
        .save(&config.session_file)
        .context("Password changed but the new session could not be stored")?;

    println!("{} Password changed", "✓".green());
    Ok(())
}

fn logout(config: &Config) -> Result<()> {
    if Session::clear(&config.session_file)? {
        println!("{} Logged out", "✓".green());
    } else {
        println!("{}", "Not logged in.".yellow());
    }
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    match Session::load(&config.session_file)? {
        Some(session) => {
            println!("Logged in as {}", session.email.cyan());
            if session.must_change_password {
                println!("{}", "⚠ Password change required".yellow());
            }
        }
        None => println!("{}", "Not logged in.".yellow()),
    }
    Ok(())
}
