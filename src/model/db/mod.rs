//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in an DB-friendly way, e.g.:
//!
//! - IDs are stored under `_id`.
//! - Datetimes are serialised in MongoDB's own format.
//!
//! The in-memory store holds exactly the same types, so both backends agree on
//! what a record contains.

pub mod candidate;
pub mod setting;
pub mod vote;
pub mod voter;
