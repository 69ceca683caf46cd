//! Stream configuration
//!
//! Broker endpoint and connection timings. The defaults match the backup
//! server's STOMP endpoint.

use std::time::Duration;

use tokio_tungstenite::tungstenite::http::Uri;

use crate::error::{Result, StreamError};

pub const DEFAULT_BROKER_URL: &str = "ws://localhost:8082/ws-backup";
pub const DEFAULT_DESTINATION_PREFIX: &str = "/topic/";

/// Broker connection settings
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// WebSocket endpoint of the broker (e.g., "ws://localhost:8082/ws-backup")
    pub broker_url: String,

    /// Fixed wait between a disconnect and the next connection attempt
    pub reconnect_delay: Duration,

    /// Heart-beat interval we offer to send (zero disables)
    pub heartbeat_outgoing: Duration,

    /// Heart-beat interval we ask the broker to send (zero disables)
    pub heartbeat_incoming: Duration,

    /// Prepended to a topic to form the broker destination
    pub destination_prefix: String,

    /// How long to wait for CONNECTED after the socket opens
    pub connect_timeout: Duration,
}

impl StreamConfig {
    pub fn new(broker_url: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            reconnect_delay: Duration::from_millis(5000),
            heartbeat_outgoing: Duration::from_millis(4000),
            heartbeat_incoming: Duration::from_millis(4000),
            destination_prefix: DEFAULT_DESTINATION_PREFIX.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables (all optional):
    /// - STRATA_BROKER_URL (default: ws://localhost:8082/ws-backup)
    /// - STRATA_RECONNECT_DELAY_MS (default: 5000)
    /// - STRATA_HEARTBEAT_OUTGOING_MS (default: 4000)
    /// - STRATA_HEARTBEAT_INCOMING_MS (default: 4000)
    pub fn from_env() -> Self {
        let mut config = Self::new(
            std::env::var("STRATA_BROKER_URL").unwrap_or_else(|_| DEFAULT_BROKER_URL.to_string()),
        );

        if let Some(delay) = env_millis("STRATA_RECONNECT_DELAY_MS") {
            config.reconnect_delay = delay;
        }
        if let Some(outgoing) = env_millis("STRATA_HEARTBEAT_OUTGOING_MS") {
            config.heartbeat_outgoing = outgoing;
        }
        if let Some(incoming) = env_millis("STRATA_HEARTBEAT_INCOMING_MS") {
            config.heartbeat_incoming = incoming;
        }

        config
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.broker_url.is_empty() {
            return Err(StreamError::InvalidConfig(
                "broker_url cannot be empty".to_string(),
            ));
        }

        if !self.broker_url.starts_with("ws://") && !self.broker_url.starts_with("wss://") {
            return Err(StreamError::InvalidConfig(
                "broker_url must start with ws:// or wss://".to_string(),
            ));
        }

        if self.host().is_none() {
            return Err(StreamError::InvalidConfig(format!(
                "broker_url has no host: {}",
                self.broker_url
            )));
        }

        if self.reconnect_delay.is_zero() {
            return Err(StreamError::InvalidConfig(
                "reconnect_delay must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout.is_zero() {
            return Err(StreamError::InvalidConfig(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Host named in the broker URL, sent in the CONNECT frame
    pub fn host(&self) -> Option<String> {
        self.broker_url
            .parse::<Uri>()
            .ok()
            .and_then(|uri| uri.host().map(str::to_string))
    }

    /// Broker destination for a topic (e.g., "logs/job/42" -> "/topic/logs/job/42")
    pub fn destination(&self, topic: &str) -> String {
        format!("{}{}", self.destination_prefix, topic.trim_start_matches('/'))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BROKER_URL)
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}
