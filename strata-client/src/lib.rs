//! Strata HTTP Client
//!
//! A typed HTTP client for the backup server's REST API.
//!
//! Every request carries the bearer token obtained at login, when one is set.
//!
//! # Example
//!
//! ```no_run
//! use strata_client::ApiClient;
//!
//! # async fn example() -> strata_client::Result<()> {
//! let client = ApiClient::new("http://localhost:8082").with_token("eyJhbGciOi...");
//!
//! for job in client.list_jobs().await? {
//!     println!("{} ({})", job.name, job.id);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
mod auth;
mod destinations;
mod email_configs;
mod history;
mod jobs;
mod sources;
mod users;

pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use strata_core::dto::email::MessageResponse;

/// HTTP client for the backup server API
///
/// Endpoints are grouped by resource:
/// - Jobs (CRUD, execute now)
/// - Sources, destinations and email configurations (CRUD, test connection)
/// - Users and authentication
/// - Backup history and restore
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Base URL of the server (e.g., "http://localhost:8082")
    base_url: String,
    /// HTTP client instance
    client: Client,
    /// Bearer credential attached to every request
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:8082")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new API client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            token: None,
        }
    }

    /// Attach a bearer token to every subsequent request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code of a response that carries no content
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await.map(|_| ())
    }

    /// Handle a test-connection response, returning the server's message
    async fn handle_message_response(
        &self,
        response: reqwest::Response,
        default: &str,
    ) -> Result<String> {
        let response = Self::check_status(response).await?;
        let body = response.text().await?;

        let message = serde_json::from_str::<MessageResponse>(&body)
            .ok()
            .and_then(|m| m.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default.to_string());

        Ok(message)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("API request failed with status {}", status);
        Err(ClientError::from_response(status.as_u16(), &body))
    }
}
