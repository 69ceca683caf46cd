//! Strata Core
//!
//! Core types for the Strata backup console.
//!
//! This crate contains:
//! - Domain types: entities as the backup server reports them (jobs, sources, destinations, ...)
//! - DTOs: request and response shapes sent to the backup server

pub mod domain;
pub mod dto;
