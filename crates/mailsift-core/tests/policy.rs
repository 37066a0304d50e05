//! Integration tests for policy resolution, filtering and detection.
//!
//! Every test builds its own policy document, so fixtures never leak
//! between tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;

use mailsift_core::filter::{NameRule, PatternRule};
use mailsift_core::{
    AccountKey, EmailRecord, Enrichment, FilterDecision, Policy, PolicySettings, Provider,
    ReadStatus, RejectReason, evaluate,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn message(sender: &str, subject: &str, timestamp: DateTime<Utc>) -> EmailRecord {
    EmailRecord {
        id: "msg-1".into(),
        sender: sender.into(),
        subject: subject.into(),
        folder: "INBOX".into(),
        timestamp,
        is_read: false,
        has_attachments: false,
        body: String::new(),
    }
}

fn gmail(name: &str) -> AccountKey {
    AccountKey::new(Provider::Gmail, name)
}

fn decide(policy: &Policy, key: &AccountKey, record: &EmailRecord) -> FilterDecision {
    let effective = policy.resolve(key).unwrap();
    let enrichment = policy.enricher().derive(record);
    evaluate(&effective, record, &enrichment, now())
}

#[test]
fn empty_lists_accept_every_value() {
    let policy = Policy::from_json_str(
        r#"{
            "_schema_version": "1.0",
            "global": {
                "senders": {"include": [], "exclude": []},
                "subjects": {"include": [], "exclude": []}
            },
            "gmail_accounts": {"main": {}}
        }"#,
    )
    .unwrap();

    for (sender, subject) in [
        ("a@b.c", ""),
        ("Somebody <x@y.org>", "Anything at all"),
        ("weird+tag@sub.domain.io", "ünïcödé subject"),
    ] {
        let decision = decide(&policy, &gmail("main"), &message(sender, subject, now()));
        assert!(decision.is_accepted(), "{sender} / {subject}: {decision:?}");
    }
}

#[test]
fn exclude_wins_over_include() {
    let policy = Policy::from_json_str(
        r#"{
            "global": {
                "subjects": {"include": ["pull request"], "exclude": ["merged"]}
            },
            "gmail_accounts": {"main": {}}
        }"#,
    )
    .unwrap();

    let record = message("a@b.c", "Pull request merged", now());
    assert_eq!(
        decide(&policy, &gmail("main"), &record),
        FilterDecision::Reject(RejectReason::Subject)
    );

    let record = message("a@b.c", "Pull request opened", now());
    assert!(decide(&policy, &gmail("main"), &record).is_accepted());
}

proptest! {
    #[test]
    fn empty_pattern_rule_allows_anything(value in ".*") {
        let rule = PatternRule::compile("global.subjects", &[], &[]).unwrap();
        prop_assert!(rule.allows(&value));
    }

    #[test]
    fn empty_name_rule_allows_anything(value in proptest::option::of("[a-z]{0,12}")) {
        let rule = NameRule::new(Vec::new(), Vec::new());
        prop_assert!(rule.allows(value.as_deref()));
    }

    #[test]
    fn exclude_dominates_include(word in "[a-z]{1,12}", prefix in "[a-z ]{0,8}") {
        let pattern = vec![regex::escape(&word)];
        let rule = PatternRule::compile("global.senders", &pattern, &pattern).unwrap();
        let value = format!("{prefix}{word}");
        prop_assert!(!rule.allows(&value));

        let names = NameRule::new(vec![word.clone()], vec![word.to_uppercase()]);
        prop_assert!(!names.allows(Some(&word)));
    }
}

#[test]
fn exact_mapping_beats_pattern() {
    let policy = Policy::from_json_str(
        r#"{
            "sender_platform_mappings": {
                "exact": {"alerts@example.com": "exact-platform"},
                "patterns": {".*@example\\.com": "pattern-platform"}
            }
        }"#,
    )
    .unwrap();

    let platforms = policy.enricher().platforms();
    assert_eq!(platforms.detect("alerts@example.com"), Some("exact-platform"));
    assert_eq!(platforms.detect("ALERTS@Example.com"), Some("exact-platform"));
    assert_eq!(platforms.detect("other@example.com"), Some("pattern-platform"));
}

#[test]
fn first_declared_pattern_wins() {
    let policy = Policy::from_json_str(
        r#"{
            "sender_platform_mappings": {
                "patterns": {
                    "noreply@.*": "first",
                    ".*@medium\\.com": "second"
                }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(
        policy.enricher().platforms().detect("noreply@medium.com"),
        Some("first")
    );

    let swapped = Policy::from_json_str(
        r#"{
            "sender_platform_mappings": {
                "patterns": {
                    ".*@medium\\.com": "second",
                    "noreply@.*": "first"
                }
            }
        }"#,
    )
    .unwrap();
    assert_eq!(
        swapped.enricher().platforms().detect("noreply@medium.com"),
        Some("second")
    );
}

#[test]
fn last_days_lower_edge_is_inclusive() {
    let policy = Policy::from_json_str(
        r#"{
            "global": {"date_range": {"enabled": true, "last_days": 7}},
            "gmail_accounts": {"main": {}}
        }"#,
    )
    .unwrap();
    let key = gmail("main");

    let on_edge = message("a@b.c", "hi", now() - TimeDelta::days(7));
    assert!(decide(&policy, &key, &on_edge).is_accepted());

    let too_old = message("a@b.c", "hi", now() - TimeDelta::days(8));
    assert_eq!(
        decide(&policy, &key, &too_old),
        FilterDecision::Reject(RejectReason::DateRange)
    );

    let just_past_edge = message(
        "a@b.c",
        "hi",
        now() - TimeDelta::days(7) - TimeDelta::seconds(1),
    );
    assert!(!decide(&policy, &key, &just_past_edge).is_accepted());
}

#[test]
fn read_status_override_leaves_other_fields_alone() {
    let policy = Policy::from_json_str(
        r#"{
            "global": {
                "enabled": true,
                "folders": {"include": ["INBOX"], "exclude": ["Spam"]},
                "senders": {"exclude": ["noreply@spam\\.example"]},
                "subjects": {"include": ["commented"]},
                "platforms": {"include": ["github"]},
                "notification_types": {"exclude": ["digest"]},
                "date_range": {"enabled": true, "last_days": 30},
                "read_status": "all",
                "has_attachments": false,
                "max_emails_per_sync": 250
            },
            "gmail_accounts": {
                "plain": {},
                "unread_only": {"read_status": "unread"}
            }
        }"#,
    )
    .unwrap();

    let base = policy.resolve(&gmail("plain")).unwrap().to_settings();
    let over = policy.resolve(&gmail("unread_only")).unwrap().to_settings();

    assert_eq!(over.read_status, Some(ReadStatus::Unread));
    assert_eq!(base.read_status, Some(ReadStatus::All));
    assert_eq!(
        PolicySettings {
            read_status: base.read_status,
            ..over
        },
        base
    );
}

#[test]
fn resolved_policy_round_trips_to_global() {
    let json = r#"{
        "enabled": true,
        "folders": {"include": ["INBOX", "Social"], "exclude": ["Spam"]},
        "senders": {"include": [".*@github\\.com"], "exclude": ["noreply@.*"]},
        "subjects": {"include": [], "exclude": ["digest"]},
        "platforms": {"include": ["github", "reddit"], "exclude": []},
        "notification_types": {"include": [], "exclude": ["newsletter"]},
        "date_range": {"enabled": true, "last_days": 14},
        "read_status": "unread",
        "has_attachments": true,
        "max_emails_per_sync": 42
    }"#;
    let global: PolicySettings = serde_json::from_str(json).unwrap();

    let document = serde_json::json!({
        "_schema_version": "1.0",
        "global": serde_json::from_str::<serde_json::Value>(json).unwrap(),
        "microsoft_accounts": {"work": {}}
    });
    let policy = Policy::from_value(document).unwrap();

    let resolved = policy
        .resolve(&AccountKey::new(Provider::Microsoft, "work"))
        .unwrap();
    assert_eq!(resolved.to_settings(), global);

    let reserialized = serde_json::to_value(resolved.to_settings()).unwrap();
    let reparsed: PolicySettings = serde_json::from_value(reserialized).unwrap();
    assert_eq!(reparsed, global);
}

#[test]
fn first_declared_notification_type_wins() {
    let policy = Policy::from_json_str(
        r#"{
            "notification_type_keywords": {
                "reply": ["reply", "replied"],
                "comment": ["comment"]
            }
        }"#,
    )
    .unwrap();

    assert_eq!(
        policy
            .enricher()
            .notifications()
            .detect("Someone replied to your comment"),
        Some("reply")
    );
}

#[test]
fn tradingview_pattern_detected() {
    let policy = Policy::from_json_str(
        r#"{
            "sender_platform_mappings": {
                "exact": {"notifications@github.com": "github"},
                "patterns": {".*@mail\\.tradingview\\.com": "tradingview"}
            }
        }"#,
    )
    .unwrap();

    let record = message("noreply@mail.tradingview.com", "New idea", now());
    let enrichment: Enrichment = policy.enricher().derive(&record);
    assert_eq!(enrichment.platform.as_deref(), Some("tradingview"));
}

#[test]
fn account_cap_override_is_isolated() {
    let policy = Policy::from_json_str(
        r#"{
            "global": {"max_emails_per_sync": 500},
            "gmail_accounts": {
                "capped": {"max_emails_per_sync": 100},
                "other": {}
            }
        }"#,
    )
    .unwrap();

    assert_eq!(
        policy.resolve(&gmail("capped")).unwrap().max_emails_per_sync,
        100
    );
    assert_eq!(
        policy.resolve(&gmail("other")).unwrap().max_emails_per_sync,
        500
    );
}

#[test]
fn unknown_account_is_an_error() {
    let policy = Policy::from_json_str(r#"{"gmail_accounts": {"main": {}}}"#).unwrap();
    let err = policy.resolve(&gmail("missing")).unwrap_err();
    assert!(matches!(err, mailsift_core::Error::UnknownAccount { .. }));
    assert!(policy.resolve_global().is_ok());
}

#[test]
fn ambiguous_date_range_rejected_at_load() {
    let result = Policy::from_json_str(
        r#"{
            "global": {
                "date_range": {"last_days": 7, "after": "2024-01-01"}
            }
        }"#,
    );
    assert!(result.is_err());
}

#[test]
fn bad_pattern_names_field_and_pattern() {
    let policy = Policy::from_json_str(
        r#"{
            "gmail_accounts": {
                "main": {"senders": {"include": ["(unclosed"]}},
                "other": {}
            }
        }"#,
    )
    .unwrap();

    assert!(policy.resolve(&gmail("other")).is_ok());

    let err = policy.resolve(&gmail("main")).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("gmail_accounts.main.senders"), "{message}");
    assert!(message.contains("(unclosed"), "{message}");
}
