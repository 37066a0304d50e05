//! Message enrichment: platform, notification type and post link.
//!
//! Detection never fails. A sender or subject that matches nothing simply
//! yields `None` for that field.

mod notification;
mod platform;
mod url;

pub use notification::NotificationDetector;
pub use platform::PlatformDetector;
pub use url::{extract_original_url, extract_urls};

use crate::Result;
use crate::policy::PolicyDocument;
use crate::record::{EmailRecord, EnrichedRecord, Enrichment};

/// Runs every detector over a message.
#[derive(Debug, Clone, Default)]
pub struct Enricher {
    platforms: PlatformDetector,
    notifications: NotificationDetector,
}

impl Enricher {
    /// Build detectors from a policy document.
    ///
    /// # Errors
    ///
    /// Returns `Error::PatternCompilation` if a platform pattern is invalid.
    pub fn from_document(document: &PolicyDocument) -> Result<Self> {
        Ok(Self {
            platforms: PlatformDetector::from_mappings(&document.sender_platform_mappings)?,
            notifications: NotificationDetector::from_keywords(
                &document.notification_type_keywords,
            ),
        })
    }

    /// Platform detector.
    #[must_use]
    pub const fn platforms(&self) -> &PlatformDetector {
        &self.platforms
    }

    /// Notification type detector.
    #[must_use]
    pub const fn notifications(&self) -> &NotificationDetector {
        &self.notifications
    }

    /// Derive the enrichment fields for a message without consuming it.
    #[must_use]
    pub fn derive(&self, record: &EmailRecord) -> Enrichment {
        let platform = self.platforms.detect(&record.sender).map(ToString::to_string);
        let notification_type = self
            .notifications
            .detect(&record.subject)
            .map(ToString::to_string);
        let original_url = extract_original_url(&record.body, platform.as_deref());

        Enrichment {
            platform,
            notification_type,
            original_url,
        }
    }

    /// Attach enrichment fields to a message.
    #[must_use]
    pub fn enrich(&self, record: EmailRecord) -> EnrichedRecord {
        let enrichment = self.derive(&record);
        EnrichedRecord { record, enrichment }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_keeps_record_intact() {
        let document: PolicyDocument = serde_json::from_str(
            r#"{
                "sender_platform_mappings": {
                    "exact": {"noreply@medium.com": "medium"},
                    "patterns": {}
                },
                "notification_type_keywords": {"reply": ["replied"]}
            }"#,
        )
        .unwrap();
        let enricher = Enricher::from_document(&document).unwrap();

        let record: EmailRecord = serde_json::from_str(
            r#"{
                "id": "m1",
                "sender": "Medium <noreply@medium.com>",
                "subject": "Jane replied to your story",
                "folder": "Social Notifications",
                "timestamp": "2024-05-01T08:30:00Z",
                "body": "Read: https://medium.com/@jane/my-story-abc123"
            }"#,
        )
        .unwrap();
        let original = record.clone();

        let enriched = enricher.enrich(record);
        assert_eq!(enriched.record, original);
        assert_eq!(enriched.enrichment.platform.as_deref(), Some("medium"));
        assert_eq!(enriched.enrichment.notification_type.as_deref(), Some("reply"));
        assert_eq!(
            enriched.enrichment.original_url.as_deref(),
            Some("https://medium.com/@jane/my-story-abc123")
        );
    }
}
