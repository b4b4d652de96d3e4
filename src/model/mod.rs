//! Data models.
//!
//! - `db` holds records as persisted by the store backends.
//! - `api` holds request and response bodies, plus authentication.
//! - `common` holds types shared by both.
//! - `mongodb` holds the MongoDB collection plumbing.

pub mod api;
pub mod common;
pub mod db;
pub mod mongodb;
