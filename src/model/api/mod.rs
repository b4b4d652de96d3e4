//! API-compatible types.
//!
//! The types in this module are serialised in an API-friendly way, e.g.:
//!
//! - Field names are camelCase.
//! - IDs are plain numbers under `id`.
//! - Datetimes are serialised as RFC 3339 strings.

pub mod account;
pub mod auth;
pub mod ballot;
pub mod candidate;
pub mod leaderboard;
pub mod results;
