//! Configuration module
//!
//! Server endpoints and credentials shared by every command.

use std::path::PathBuf;

use anyhow::{Result, bail};
use strata_client::ApiClient;
use strata_stream::StreamConfig;

use crate::session::Session;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the backup server REST API
    pub api_url: String,
    /// WebSocket endpoint of the log broker
    pub broker_url: String,
    /// Token given on the command line, used instead of the session
    pub token: Option<String>,
    /// Location of the stored login session
    pub session_file: PathBuf,
}

/// `~/.strata/session.json`, or the working directory without a home
pub fn default_session_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".strata"))
        .unwrap_or_default()
        .join("session.json")
}

impl Config {
    /// Client without credentials, for login
    pub fn anonymous_client(&self) -> ApiClient {
        ApiClient::new(&self.api_url)
    }

    /// Authenticated client
    ///
    /// Refuses to build one while the stored session still requires a
    /// password change.
    pub fn client(&self) -> Result<ApiClient> {
        if let Some(token) = &self.token {
            return Ok(self.anonymous_client().with_token(token));
        }

        let Some(session) = Session::load(&self.session_file)? else {
            bail!("Not logged in: run `strata auth login` first");
        };

        if session.must_change_password {
            bail!(
                "Password change required for {}: run `strata auth change-password` first",
                session.email
            );
        }

        Ok(self.anonymous_client().with_token(session.token))
    }

    pub fn stream_config(&self) -> StreamConfig {
        let mut config = StreamConfig::from_env();
        config.broker_url = self.broker_url.clone();
        config
    }
}
