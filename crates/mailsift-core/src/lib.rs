//! # mailsift-core
//!
//! Policy-driven filtering and enrichment for social-notification email.
//!
//! This crate provides:
//! - **Policy** - layered `global` / per-account settings loaded from JSON,
//!   validated up front and resolved into an [`EffectivePolicy`] per account
//! - **Filtering** - ordered include/exclude evaluation of each message
//! - **Enrichment** - platform, notification type and post-link detection
//! - **Upstream queries** - Gmail and Microsoft Graph fetch queries that
//!   over-approximate what the policy accepts
//! - **Pipeline** - per-account processing with dedup and a per-sync cap
//! - **Store** - `SQLite` storage for accepted, enriched messages
//!
//! Fetching mail is left to the caller: records come in as [`EmailRecord`]s.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod detect;
mod error;
pub mod filter;
pub mod pipeline;
pub mod policy;
pub mod query;
pub mod record;
pub mod store;

pub use detect::{Enricher, NotificationDetector, PlatformDetector};
pub use error::{Error, Result};
pub use filter::{FilterDecision, RejectReason, evaluate};
pub use pipeline::{AccountReport, process_account, process_records};
pub use policy::{
    AccountKey, EffectivePolicy, Policy, PolicyDocument, PolicySettings, Provider, ReadStatus,
    ValidationIssue, validate_document,
};
pub use query::{UpstreamQuery, build_query};
pub use record::{EmailRecord, EnrichedRecord, Enrichment};
pub use store::{EmailRepository, StoreStats};
