//! Strata Stream
//!
//! Live backup logs over STOMP. A single [`ConnectionManager`] keeps one
//! WebSocket connection to the broker alive for the whole process and
//! multiplexes every topic subscription over it. Each job's log lines are
//! published on `logs/job/{id}`; [`LogViewer`] turns one of those topics
//! into an ordered, append-only list of lines.
//!
//! # Example
//!
//! ```no_run
//! use strata_stream::{ConnectionManager, LogViewer, StreamConfig};
//!
//! # async fn example() -> strata_stream::Result<()> {
//! let manager = ConnectionManager::start(StreamConfig::from_env())?;
//! let mut viewer = LogViewer::open(&manager, "3f2c0d9e-8f43-4f7b-9a53-0c1d7c8d4b21");
//!
//! while let Some(line) = viewer.next_line().await {
//!     println!("{}", line);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod heartbeat;
pub mod subscription;
pub mod viewer;

#[cfg(test)]
pub(crate) mod testing;

pub use config::StreamConfig;
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{Result, StreamError};
pub use subscription::{Delivery, Subscription, Topic};
pub use viewer::LogViewer;
