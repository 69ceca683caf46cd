//! Data transfer objects
//!
//! Flat request and response shapes exchanged with the backup server.

pub mod auth;
pub mod destination;
pub mod email;
pub mod job;
pub mod page;
pub mod source;
