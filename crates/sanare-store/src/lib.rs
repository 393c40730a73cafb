//! # sanare-store
//!
//! SQLite persistence for the sanare hospital blog service.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. The handle is constructed once by the process entry point and
//! injected into the HTTP layer; business-logic modules never open their own
//! connections.

pub mod blogs;
pub mod database;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
