//! Policy document model.
//!
//! These types mirror the JSON layout of the policy file one-to-one. Every
//! record rejects unknown keys, so a typo in the file surfaces as a load
//! error instead of a silently ignored setting.

use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Mail provider an account belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gmail (`gmail_accounts`).
    Gmail,
    /// Microsoft Graph / Outlook (`microsoft_accounts`).
    Microsoft,
}

impl Provider {
    /// All providers, in lookup order.
    pub const ALL: [Self; 2] = [Self::Gmail, Self::Microsoft];

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Microsoft => "microsoft",
        }
    }

    /// Name of the top-level document key holding this provider's accounts.
    #[must_use]
    pub const fn accounts_key(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail_accounts",
            Self::Microsoft => "microsoft_accounts",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gmail" | "google" => Ok(Self::Gmail),
            "microsoft" | "outlook" | "graph" => Ok(Self::Microsoft),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Identifies one configured account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountKey {
    /// Provider the account is configured under.
    pub provider: Provider,
    /// Account name (key in the provider's account map).
    pub name: String,
}

impl AccountKey {
    /// Create a new account key.
    #[must_use]
    pub fn new(provider: Provider, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.name)
    }
}

/// Include/exclude lists for one filter category.
///
/// `include` and `exclude` override independently: an account that only sets
/// `exclude` keeps the global `include` list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListFilter {
    /// Values (or patterns) a message must match at least one of.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
    /// Values (or patterns) that reject a message outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,
}

impl ListFilter {
    /// Build a fully specified filter.
    #[must_use]
    pub const fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include: Some(include),
            exclude: Some(exclude),
        }
    }
}

/// Which messages to keep by read state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadStatus {
    /// Read and unread messages.
    #[default]
    All,
    /// Only messages already read.
    Read,
    /// Only unread messages.
    Unread,
}

impl ReadStatus {
    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Read => "read",
            Self::Unread => "unread",
        }
    }
}

const fn default_true() -> bool {
    true
}

/// Date window settings.
///
/// Either a relative window (`last_days`) or explicit bounds
/// (`after` / `before`), never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DateRangeSpec {
    /// Whether the window is applied at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Keep messages from the last N days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_days: Option<u32>,
    /// Inclusive lower bound (RFC 3339 timestamp or `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
    /// Inclusive upper bound (RFC 3339 timestamp or `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
}

impl Default for DateRangeSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            last_days: None,
            after: None,
            before: None,
        }
    }
}

impl DateRangeSpec {
    /// Relative window of `days` days.
    #[must_use]
    pub const fn last_days(days: u32) -> Self {
        Self {
            enabled: true,
            last_days: Some(days),
            after: None,
            before: None,
        }
    }

    /// Whether both a relative and an explicit bound are set.
    #[must_use]
    pub const fn is_ambiguous(&self) -> bool {
        self.last_days.is_some() && (self.after.is_some() || self.before.is_some())
    }
}

/// Filtering knobs shared by `global` and every per-account override.
///
/// Every field is optional. In `global` an unset field falls back to the
/// system default; in an account it inherits the global value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySettings {
    /// Whether the account is synced at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Folder (label) names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<ListFilter>,
    /// Sender address regexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub senders: Option<ListFilter>,
    /// Subject regexes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<ListFilter>,
    /// Platform names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<ListFilter>,
    /// Notification type names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_types: Option<ListFilter>,
    /// Date window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRangeSpec>,
    /// Read-state filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_status: Option<ReadStatus>,
    /// Required attachment state; `null` accepts both.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_attachments: Option<bool>,
    /// Upper bound on accepted messages per sync run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_emails_per_sync: Option<u32>,
}

/// Alias used for per-account override records.
pub type AccountPolicy = PolicySettings;

/// Sender address to platform tables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SenderPlatformMappings {
    /// Exact (case-insensitive) address lookups, checked first.
    #[serde(default)]
    pub exact: BTreeMap<String, String>,
    /// Regex to platform, first declared match wins.
    #[serde(default)]
    pub patterns: OrderedMap<String>,
}

/// Root of the policy file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    /// Schema version string.
    #[serde(
        rename = "_schema_version",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<String>,
    /// Defaults for every account.
    #[serde(default)]
    pub global: PolicySettings,
    /// Gmail account overrides by name.
    #[serde(default)]
    pub gmail_accounts: BTreeMap<String, AccountPolicy>,
    /// Microsoft account overrides by name.
    #[serde(default)]
    pub microsoft_accounts: BTreeMap<String, AccountPolicy>,
    /// Platform detection tables.
    #[serde(default)]
    pub sender_platform_mappings: SenderPlatformMappings,
    /// Notification type to trigger keywords, first declared type wins.
    #[serde(default)]
    pub notification_type_keywords: OrderedMap<Vec<String>>,
}

impl PolicyDocument {
    /// Account map for a provider.
    #[must_use]
    pub const fn accounts(&self, provider: Provider) -> &BTreeMap<String, AccountPolicy> {
        match provider {
            Provider::Gmail => &self.gmail_accounts,
            Provider::Microsoft => &self.microsoft_accounts,
        }
    }
}

/// String-keyed map that keeps document order.
///
/// Used where declaration order decides precedence. Duplicate keys are a
/// parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V>(Vec<(String, V)>);

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<V> OrderedMap<V> {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an entry, replacing the value of an existing key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.0.push((key, value));
        }
    }

    /// Iterate entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries: Vec<(String, V)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            if entries.iter().any(|(k, _)| *k == key) {
                return Err(de::Error::custom(format!("duplicate key {key:?}")));
            }
            entries.push((key, value));
        }
        Ok(OrderedMap(entries))
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_raw_string_hashes)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("gmail".parse::<Provider>().unwrap(), Provider::Gmail);
        assert_eq!("Outlook".parse::<Provider>().unwrap(), Provider::Microsoft);
        assert!("imap".parse::<Provider>().is_err());
    }

    #[test]
    fn test_ordered_map_keeps_document_order() {
        let map: OrderedMap<String> =
            serde_json::from_str(r#"{"zeta": "z", "alpha": "a", "mid": "m"}"#).unwrap();
        let keys: Vec<&str> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);

        let back = serde_json::to_string(&map).unwrap();
        assert_eq!(back, r#"{"zeta":"z","alpha":"a","mid":"m"}"#);
    }

    #[test]
    fn test_ordered_map_rejects_duplicates() {
        let result: Result<OrderedMap<u32>, _> = serde_json::from_str(r#"{"a": 1, "a": 2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<PolicySettings, _> =
            serde_json::from_str(r#"{"max_emails": 10}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_null_means_unset() {
        let settings: PolicySettings =
            serde_json::from_str(r#"{"read_status": null, "has_attachments": null}"#).unwrap();
        assert_eq!(settings, PolicySettings::default());
    }

    #[test]
    fn test_date_range_enabled_by_default() {
        let spec: DateRangeSpec = serde_json::from_str(r#"{"last_days": 7}"#).unwrap();
        assert!(spec.enabled);
        assert!(!spec.is_ambiguous());

        let spec: DateRangeSpec =
            serde_json::from_str(r#"{"last_days": 7, "after": "2024-01-01"}"#).unwrap();
        assert!(spec.is_ambiguous());
    }
}
