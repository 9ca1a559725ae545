//! Core types and client for querying Avri waste pickup schedules.

/// Cached schedule and its expiry rule.
mod cache;
/// Stateful client combining address lookup, calendar fetch, and queries.
pub mod client;
/// Endpoints, tenant constants, and cache settings.
pub mod config;
/// Domain models shared by the client and its callers.
pub mod model;
/// Decoding of service responses.
pub mod parser;
/// Traits describing the transport and clock seams.
pub mod ports;
/// Date-relative queries over pickup records.
pub mod query;

pub use client::*;
pub use config::*;
pub use model::*;
pub use ports::*;
