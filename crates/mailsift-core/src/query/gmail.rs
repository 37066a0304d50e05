//! Gmail search query builder.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::policy::{EffectivePolicy, ReadStatus};

/// Labels addressed with `in:` rather than `label:`.
const SYSTEM_LABELS: &[&str] = &[
    "inbox", "sent", "trash", "spam", "drafts", "starred", "important", "chats",
];

/// A Gmail `q=` search string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GmailQuery {
    /// Search expression; empty means every message.
    pub q: String,
}

impl std::fmt::Display for GmailQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.q)
    }
}

/// `None` for labels the search syntax cannot quote.
fn folder_term(folder: &str) -> Option<String> {
    let lower = folder.to_lowercase();
    if SYSTEM_LABELS.contains(&lower.as_str()) {
        Some(format!("in:{lower}"))
    } else if folder.contains('"') {
        None
    } else {
        Some(format!("label:\"{folder}\""))
    }
}

fn gmail_date(date: NaiveDate) -> String {
    date.format("%Y/%m/%d").to_string()
}

/// Build the Gmail search string for a policy.
///
/// Folder includes become an OR group, the date window becomes
/// `after:`/`before:` with a day of slack on each side (Gmail compares whole
/// days in the mailbox's time zone), and read status maps to `is:`. Folder
/// excludes, regex lists and labels containing `"` are left to the
/// evaluator.
#[must_use]
pub fn gmail_query(policy: &EffectivePolicy, now: DateTime<Utc>) -> GmailQuery {
    let mut terms = Vec::new();

    // One unquotable label drops the whole group; the evaluator still
    // applies the folder rule.
    let folders: Vec<String> = policy
        .folders
        .include()
        .iter()
        .map(|f| folder_term(f))
        .collect::<Option<_>>()
        .unwrap_or_default();
    match folders.len() {
        0 => {}
        1 => terms.extend(folders),
        _ => terms.push(format!("({})", folders.join(" OR "))),
    }

    let (after, before) = policy.date_window.bounds(now);
    if let Some(after) = after.and_then(|a| a.checked_sub_signed(TimeDelta::days(1))) {
        terms.push(format!("after:{}", gmail_date(after.date_naive())));
    }
    if let Some(before) = before.and_then(|b| b.checked_add_signed(TimeDelta::days(2))) {
        terms.push(format!("before:{}", gmail_date(before.date_naive())));
    }

    match policy.read_status {
        ReadStatus::All => {}
        ReadStatus::Read => terms.push("is:read".to_string()),
        ReadStatus::Unread => terms.push("is:unread".to_string()),
    }

    GmailQuery {
        q: terms.join(" "),
    }
}
