//! Message records exchanged with the fetch and storage collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One inbound message as supplied by a mail fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Provider message id.
    pub id: String,
    /// `From` value: a bare address or `Display Name <address>`.
    pub sender: String,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Folder or label the message was fetched from.
    pub folder: String,
    /// When the message was received.
    pub timestamp: DateTime<Utc>,
    /// Whether the message has been read.
    #[serde(default)]
    pub is_read: bool,
    /// Whether the message carries attachments.
    #[serde(default)]
    pub has_attachments: bool,
    /// Plain-text body.
    #[serde(default)]
    pub body: String,
}

impl EmailRecord {
    /// Bare sender address, lowercased.
    ///
    /// Strips a display name and angle brackets when present.
    #[must_use]
    pub fn sender_address(&self) -> String {
        parse_address(&self.sender).to_lowercase()
    }
}

/// Extract the address part of a `From` header value.
#[must_use]
pub fn parse_address(raw: &str) -> &str {
    let raw = raw.trim();
    match (raw.rfind('<'), raw.rfind('>')) {
        (Some(start), Some(end)) if start < end => raw[start + 1..end].trim(),
        _ => raw.trim_matches(|c| c == '"' || c == '<' || c == '>'),
    }
}

/// Fields derived from a message during enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    /// Detected platform, if any.
    pub platform: Option<String>,
    /// Detected notification type, if any.
    pub notification_type: Option<String>,
    /// Link to the post the notification is about, if found.
    pub original_url: Option<String>,
}

/// A fetched message plus its derived fields.
///
/// The original record is kept untouched; enrichment only adds fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    /// The message as fetched.
    #[serde(flatten)]
    pub record: EmailRecord,
    /// Derived fields.
    #[serde(flatten)]
    pub enrichment: Enrichment,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("TradingView <noreply@tradingview.com>"),
            "noreply@tradingview.com"
        );
        assert_eq!(
            parse_address("\"Doe, Jane\" <jane@example.com>"),
            "jane@example.com"
        );
        assert_eq!(parse_address("  plain@example.com "), "plain@example.com");
        assert_eq!(parse_address("<bracketed@example.com>"), "bracketed@example.com");
    }

    #[test]
    fn test_record_from_json() {
        let record: EmailRecord = serde_json::from_str(
            r#"{
                "id": "18c2",
                "sender": "GitHub <Notifications@GitHub.com>",
                "subject": "Re: [repo] Fix build",
                "folder": "INBOX",
                "timestamp": "2024-05-01T08:30:00Z"
            }"#,
        )
        .unwrap();

        assert_eq!(record.sender_address(), "notifications@github.com");
        assert!(!record.is_read);
        assert!(record.body.is_empty());
    }

    #[test]
    fn test_enriched_record_is_flat() {
        let record: EmailRecord = serde_json::from_str(
            r#"{"id":"1","sender":"a@b.c","folder":"INBOX","timestamp":"2024-05-01T08:30:00Z"}"#,
        )
        .unwrap();
        let enriched = EnrichedRecord {
            record,
            enrichment: Enrichment {
                platform: Some("github".into()),
                ..Enrichment::default()
            },
        };

        let value = serde_json::to_value(&enriched).unwrap();
        assert_eq!(value["id"], "1");
        assert_eq!(value["platform"], "github");
        assert!(value["notification_type"].is_null());
    }
}
