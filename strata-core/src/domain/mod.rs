//! Core domain types
//!
//! Server-side views of the entities managed through the backup REST API.
//! These are what the API returns; editors never send them back as-is, they
//! build the flatter DTOs in [`crate::dto`] instead.

pub mod destination;
pub mod email;
pub mod job;
pub mod record;
pub mod source;
pub mod user;
