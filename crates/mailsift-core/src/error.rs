//! Error types for the core library.

use thiserror::Error;

use crate::policy::Provider;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The policy document is malformed or ambiguous.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A regex field in the policy document failed to compile.
    #[error("Invalid pattern {pattern:?} in {field}: {source}")]
    PatternCompilation {
        /// Dotted path of the offending field.
        field: String,
        /// The pattern as written in the document.
        pattern: String,
        /// Underlying compile error.
        #[source]
        source: Box<regex::Error>,
    },

    /// The requested account is not configured under its provider.
    #[error("Account not found: {provider} account {name:?}")]
    UnknownAccount {
        /// Provider the account was looked up under.
        provider: Provider,
        /// Account name.
        name: String,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
