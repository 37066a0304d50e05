//! Loading a policy document into a ready-to-use [`Policy`].

use std::path::Path;

use tracing::{debug, info, warn};

use super::document::{AccountKey, PolicyDocument, Provider};
use super::resolve::{EffectivePolicy, resolve};
use super::validation::validate_document;
use crate::detect::Enricher;
use crate::{Error, Result};

/// Schema versions this build understands.
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["1", "1.0"];

/// Outcome of the schema version check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaVersion {
    /// A supported version.
    Supported(String),
    /// No `_schema_version` key.
    Missing,
    /// A version this build does not know.
    Unrecognized(String),
}

impl SchemaVersion {
    /// Classify a document's declared version.
    #[must_use]
    pub fn of(document: &PolicyDocument) -> Self {
        match document.schema_version.as_deref().map(str::trim) {
            None => Self::Missing,
            Some(v) if SUPPORTED_SCHEMA_VERSIONS.contains(&v) => Self::Supported(v.to_string()),
            Some(v) => Self::Unrecognized(v.to_string()),
        }
    }
}

/// A validated policy document with its detectors built.
///
/// Immutable once constructed. Pass it by reference to whatever needs it.
#[derive(Debug, Clone)]
pub struct Policy {
    document: PolicyDocument,
    enricher: Enricher,
}

impl Policy {
    /// Validate a document and build detectors.
    ///
    /// A missing or unrecognized schema version is logged and parsing
    /// proceeds on a best-effort basis.
    ///
    /// # Errors
    ///
    /// Returns `Error::PatternCompilation` or `Error::Configuration` for the
    /// first fatal issue in `global` or the detection tables. Issues inside
    /// one account are logged and surface from [`Policy::resolve`] for that
    /// account only.
    pub fn from_document(document: PolicyDocument) -> Result<Self> {
        match SchemaVersion::of(&document) {
            SchemaVersion::Supported(v) => debug!(version = %v, "Policy schema version"),
            SchemaVersion::Missing => {
                warn!("Policy document has no _schema_version; assuming current schema");
            }
            SchemaVersion::Unrecognized(v) => warn!(
                version = %v,
                supported = ?SUPPORTED_SCHEMA_VERSIONS,
                "Unrecognized policy schema version; parsing on a best-effort basis"
            ),
        }

        if let Err(issues) = validate_document(&document) {
            let (blocking, rest): (Vec<_>, Vec<_>) = issues
                .into_iter()
                .partition(|i| i.is_fatal() && !i.is_account_scoped());
            for issue in &rest {
                if issue.is_fatal() {
                    warn!(%issue, "Account policy invalid; it will fail to resolve");
                } else {
                    warn!(%issue, "Policy validation warning");
                }
            }
            if let Some(first) = blocking.into_iter().next() {
                return Err(first.into());
            }
        }

        let enricher = Enricher::from_document(&document)?;

        info!(
            gmail_accounts = document.gmail_accounts.len(),
            microsoft_accounts = document.microsoft_accounts.len(),
            platform_patterns = document.sender_platform_mappings.patterns.len(),
            notification_types = document.notification_type_keywords.len(),
            "Loaded email policy"
        );

        Ok(Self { document, enricher })
    }

    /// Build a policy from an already-parsed JSON tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` if the tree does not match the schema, or any
    /// error of [`Policy::from_document`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Self::from_document(serde_json::from_value(value)?)
    }

    /// Parse a policy from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Json` for malformed JSON or unknown fields, or any
    /// error of [`Policy::from_document`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_document(serde_json::from_str(json)?)
    }

    /// Load a policy from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, or any error of
    /// [`Policy::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading policy file");
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The underlying document.
    #[must_use]
    pub const fn document(&self) -> &PolicyDocument {
        &self.document
    }

    /// Detectors built from the document's mapping tables.
    #[must_use]
    pub const fn enricher(&self) -> &Enricher {
        &self.enricher
    }

    /// Every configured account, Gmail first.
    #[must_use]
    pub fn accounts(&self) -> Vec<AccountKey> {
        Provider::ALL
            .into_iter()
            .flat_map(|provider| {
                self.document
                    .accounts(provider)
                    .keys()
                    .map(move |name| AccountKey::new(provider, name.clone()))
            })
            .collect()
    }

    /// Find an account by name under any provider, Gmail first.
    #[must_use]
    pub fn find_account(&self, name: &str) -> Option<AccountKey> {
        Provider::ALL
            .into_iter()
            .find(|p| self.document.accounts(*p).contains_key(name))
            .map(|provider| AccountKey::new(provider, name))
    }

    /// Resolve the effective policy for an account.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownAccount` if the account is not configured
    /// under its provider. Falling back to [`Policy::resolve_global`] is the
    /// caller's decision. Returns `Error::PatternCompilation` or
    /// `Error::Configuration` if this account's overrides are invalid; other
    /// accounts are unaffected.
    pub fn resolve(&self, key: &AccountKey) -> Result<EffectivePolicy> {
        let account = self
            .document
            .accounts(key.provider)
            .get(&key.name)
            .ok_or_else(|| Error::UnknownAccount {
                provider: key.provider,
                name: key.name.clone(),
            })?;
        resolve(&self.document.global, Some(account), Some(key.clone()))
    }

    /// Resolve the global-only policy.
    ///
    /// # Errors
    ///
    /// Returns an error only if the global settings are invalid, which
    /// loading already rules out.
    pub fn resolve_global(&self) -> Result<EffectivePolicy> {
        resolve(&self.document.global, None, None)
    }
}
