//! Per-message accept/reject evaluation.

use chrono::{DateTime, Utc};

use crate::policy::{EffectivePolicy, ReadStatus};
use crate::record::{EmailRecord, Enrichment};

/// Rule category that rejected a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RejectReason {
    /// Folder not included or excluded.
    Folder,
    /// Sender address not included or excluded.
    Sender,
    /// Subject not included or excluded.
    Subject,
    /// Timestamp outside the date window.
    DateRange,
    /// Read state does not match.
    ReadStatus,
    /// Attachment state does not match.
    Attachments,
    /// Detected platform not included or excluded.
    Platform,
    /// Detected notification type not included or excluded.
    NotificationType,
}

impl RejectReason {
    /// All reasons, in evaluation order.
    pub const ALL: [Self; 8] = [
        Self::Folder,
        Self::Sender,
        Self::Subject,
        Self::DateRange,
        Self::ReadStatus,
        Self::Attachments,
        Self::Platform,
        Self::NotificationType,
    ];

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Sender => "sender",
            Self::Subject => "subject",
            Self::DateRange => "date_range",
            Self::ReadStatus => "read_status",
            Self::Attachments => "attachments",
            Self::Platform => "platform",
            Self::NotificationType => "notification_type",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    /// The message should be ingested.
    Accept,
    /// The message was rejected by the given category.
    Reject(RejectReason),
}

impl FilterDecision {
    /// Whether the message was accepted.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accept)
    }

    /// The rejecting category, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accept => None,
            Self::Reject(reason) => Some(*reason),
        }
    }
}

/// Decide whether a message passes a policy.
///
/// Categories are checked in a fixed order and the first failing one is
/// reported. `enrichment` must already hold the detected platform and
/// notification type. `now` anchors relative date windows.
#[must_use]
pub fn evaluate(
    policy: &EffectivePolicy,
    record: &EmailRecord,
    enrichment: &Enrichment,
    now: DateTime<Utc>,
) -> FilterDecision {
    use RejectReason as R;

    if !policy.folders.allows(Some(&record.folder)) {
        return FilterDecision::Reject(R::Folder);
    }
    if !policy.senders.allows(&record.sender_address()) {
        return FilterDecision::Reject(R::Sender);
    }
    if !policy.subjects.allows(&record.subject) {
        return FilterDecision::Reject(R::Subject);
    }
    if !policy.date_window.contains(record.timestamp, now) {
        return FilterDecision::Reject(R::DateRange);
    }
    let read_ok = match policy.read_status {
        ReadStatus::All => true,
        ReadStatus::Read => record.is_read,
        ReadStatus::Unread => !record.is_read,
    };
    if !read_ok {
        return FilterDecision::Reject(R::ReadStatus);
    }
    if policy
        .has_attachments
        .is_some_and(|wanted| wanted != record.has_attachments)
    {
        return FilterDecision::Reject(R::Attachments);
    }
    if !policy.platforms.allows(enrichment.platform.as_deref()) {
        return FilterDecision::Reject(R::Platform);
    }
    if !policy
        .notification_types
        .allows(enrichment.notification_type.as_deref())
    {
        return FilterDecision::Reject(R::NotificationType);
    }

    FilterDecision::Accept
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::{DateRangeSpec, ListFilter, PolicySettings, resolve};
    use chrono::{TimeDelta, TimeZone};

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(ToString::to_string).collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn record() -> EmailRecord {
        EmailRecord {
            id: "m1".into(),
            sender: "GitHub <notifications@github.com>".into(),
            subject: "Someone commented on your pull request".into(),
            folder: "INBOX".into(),
            timestamp: now() - TimeDelta::hours(2),
            is_read: false,
            has_attachments: false,
            body: String::new(),
        }
    }

    fn enrichment(platform: Option<&str>, ntype: Option<&str>) -> Enrichment {
        Enrichment {
            platform: platform.map(String::from),
            notification_type: ntype.map(String::from),
            original_url: None,
        }
    }

    fn policy(settings: PolicySettings) -> EffectivePolicy {
        resolve(&settings, None, None).unwrap()
    }

    #[test]
    fn test_default_policy_accepts() {
        let decision = evaluate(
            &policy(PolicySettings::default()),
            &record(),
            &enrichment(None, None),
            now(),
        );
        assert_eq!(decision, FilterDecision::Accept);
        assert!(decision.is_accepted());
        assert_eq!(decision.reason(), None);
    }

    #[test]
    fn test_folder_compare_is_case_insensitive() {
        let p = policy(PolicySettings {
            folders: Some(ListFilter::new(strings(&["inbox"]), vec![])),
            ..PolicySettings::default()
        });
        assert!(evaluate(&p, &record(), &enrichment(None, None), now()).is_accepted());

        let p = policy(PolicySettings {
            folders: Some(ListFilter::new(vec![], strings(&["Inbox"]))),
            ..PolicySettings::default()
        });
        assert_eq!(
            evaluate(&p, &record(), &enrichment(None, None), now()),
            FilterDecision::Reject(RejectReason::Folder)
        );
    }

    #[test]
    fn test_sender_matches_bare_address() {
        let p = policy(PolicySettings {
            senders: Some(ListFilter::new(strings(&["^notifications@"]), vec![])),
            ..PolicySettings::default()
        });
        assert!(evaluate(&p, &record(), &enrichment(None, None), now()).is_accepted());
    }

    #[test]
    fn test_first_failing_category_reported() {
        let p = policy(PolicySettings {
            subjects: Some(ListFilter::new(vec![], strings(&["commented"]))),
            read_status: Some(ReadStatus::Read),
            ..PolicySettings::default()
        });
        assert_eq!(
            evaluate(&p, &record(), &enrichment(None, None), now()),
            FilterDecision::Reject(RejectReason::Subject)
        );
    }

    #[test]
    fn test_date_window() {
        let p = policy(PolicySettings {
            date_range: Some(DateRangeSpec::last_days(7)),
            ..PolicySettings::default()
        });

        let mut r = record();
        r.timestamp = now() - TimeDelta::days(7);
        assert!(evaluate(&p, &r, &enrichment(None, None), now()).is_accepted());

        r.timestamp = now() - TimeDelta::days(8);
        assert_eq!(
            evaluate(&p, &r, &enrichment(None, None), now()),
            FilterDecision::Reject(RejectReason::DateRange)
        );
    }

    #[test]
    fn test_read_status_and_attachments() {
        let unread_only = policy(PolicySettings {
            read_status: Some(ReadStatus::Unread),
            ..PolicySettings::default()
        });
        let mut r = record();
        assert!(evaluate(&unread_only, &r, &enrichment(None, None), now()).is_accepted());
        r.is_read = true;
        assert_eq!(
            evaluate(&unread_only, &r, &enrichment(None, None), now()),
            FilterDecision::Reject(RejectReason::ReadStatus)
        );

        let with_attachments = policy(PolicySettings {
            has_attachments: Some(true),
            ..PolicySettings::default()
        });
        assert_eq!(
            evaluate(&with_attachments, &record(), &enrichment(None, None), now()),
            FilterDecision::Reject(RejectReason::Attachments)
        );
    }

    #[test]
    fn test_platform_and_notification_type() {
        let p = policy(PolicySettings {
            platforms: Some(ListFilter::new(strings(&["github"]), vec![])),
            notification_types: Some(ListFilter::new(vec![], strings(&["like"]))),
            ..PolicySettings::default()
        });

        assert_eq!(
            evaluate(&p, &record(), &enrichment(None, None), now()),
            FilterDecision::Reject(RejectReason::Platform)
        );
        assert!(evaluate(&p, &record(), &enrichment(Some("github"), None), now()).is_accepted());
        assert_eq!(
            evaluate(&p, &record(), &enrichment(Some("github"), Some("like")), now()),
            FilterDecision::Reject(RejectReason::NotificationType)
        );
    }
}
