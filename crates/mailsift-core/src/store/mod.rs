//! SQLite storage for accepted, enriched messages.
//!
//! Stores one row per provider message id (re-ingesting a message updates
//! it in place) plus the time of each account's last successful sync.

mod repository;

pub use repository::{EmailRepository, StoreStats};
