//! Email policy: document model, loading, validation and resolution.
//!
//! A policy file holds `global` defaults, per-account overrides for Gmail and
//! Microsoft accounts, and the tables used to detect platforms and
//! notification types. Loading validates everything up front, so resolving
//! and evaluating afterwards cannot fail on a bad pattern.
//!
//! # Example
//!
//! ```
//! use mailsift_core::policy::{AccountKey, Policy, Provider};
//!
//! let policy = Policy::from_json_str(r#"{
//!     "_schema_version": "1.0",
//!     "global": {"max_emails_per_sync": 500},
//!     "gmail_accounts": {"work": {"max_emails_per_sync": 100}}
//! }"#).unwrap();
//!
//! let work = policy.resolve(&AccountKey::new(Provider::Gmail, "work")).unwrap();
//! assert_eq!(work.max_emails_per_sync, 100);
//! ```

mod date;
mod document;
mod load;
mod resolve;
mod validation;

pub use date::{DateRangeError, DateWindow};
pub use document::{
    AccountKey, AccountPolicy, DateRangeSpec, ListFilter, OrderedMap, PolicyDocument,
    PolicySettings, Provider, ReadStatus, SenderPlatformMappings,
};
pub use load::{Policy, SUPPORTED_SCHEMA_VERSIONS, SchemaVersion};
pub use resolve::{DEFAULT_MAX_EMAILS_PER_SYNC, EffectivePolicy, resolve};
pub use validation::{ValidationIssue, ValidationResult, validate_document};
