//! Global ⊕ account override resolution.

use tracing::debug;

use super::date::DateWindow;
use super::document::{AccountKey, DateRangeSpec, ListFilter, PolicySettings, ReadStatus};
use crate::filter::{NameRule, PatternRule};
use crate::{Error, Result};

/// Cap applied when neither the account nor `global` sets one.
pub const DEFAULT_MAX_EMAILS_PER_SYNC: u32 = 500;

/// Fully resolved policy for one account.
///
/// Every field holds a concrete value; regexes are compiled and the date
/// range is parsed. Compute once per account per sync run and share it
/// read-only.
#[derive(Debug, Clone)]
pub struct EffectivePolicy {
    /// Account this policy was resolved for, `None` for the global policy.
    pub account: Option<AccountKey>,
    /// Whether the account is synced.
    pub enabled: bool,
    /// Folder names.
    pub folders: NameRule,
    /// Sender address patterns.
    pub senders: PatternRule,
    /// Subject patterns.
    pub subjects: PatternRule,
    /// Platform names.
    pub platforms: NameRule,
    /// Notification type names.
    pub notification_types: NameRule,
    /// Date range as configured.
    pub date_range: DateRangeSpec,
    /// Parsed date window.
    pub date_window: DateWindow,
    /// Read-state filter.
    pub read_status: ReadStatus,
    /// Required attachment state, `None` accepts both.
    pub has_attachments: Option<bool>,
    /// Upper bound on accepted messages per sync run.
    pub max_emails_per_sync: u32,
}

impl EffectivePolicy {
    /// Label used in logs and error messages.
    #[must_use]
    pub fn scope(&self) -> String {
        self.account
            .as_ref()
            .map_or_else(|| "global".to_string(), |key| key.to_string())
    }

    /// Convert back to the document's settings shape, every field populated.
    #[must_use]
    pub fn to_settings(&self) -> PolicySettings {
        PolicySettings {
            enabled: Some(self.enabled),
            folders: Some(ListFilter::new(
                self.folders.include().to_vec(),
                self.folders.exclude().to_vec(),
            )),
            senders: Some(ListFilter::new(self.senders.include(), self.senders.exclude())),
            subjects: Some(ListFilter::new(
                self.subjects.include(),
                self.subjects.exclude(),
            )),
            platforms: Some(ListFilter::new(
                self.platforms.include().to_vec(),
                self.platforms.exclude().to_vec(),
            )),
            notification_types: Some(ListFilter::new(
                self.notification_types.include().to_vec(),
                self.notification_types.exclude().to_vec(),
            )),
            date_range: Some(self.date_range.clone()),
            read_status: Some(self.read_status),
            has_attachments: self.has_attachments,
            max_emails_per_sync: Some(self.max_emails_per_sync),
        }
    }
}

/// Account value if set, else global value.
fn pick<T: Clone>(
    account: Option<&PolicySettings>,
    global: &PolicySettings,
    get: impl Fn(&PolicySettings) -> Option<&T>,
) -> Option<T> {
    account.and_then(&get).or_else(|| get(global)).cloned()
}

/// Resolve include and exclude independently.
fn pick_lists(
    account: Option<&ListFilter>,
    global: Option<&ListFilter>,
) -> (Vec<String>, Vec<String>) {
    let include = account
        .and_then(|f| f.include.as_ref())
        .or_else(|| global.and_then(|f| f.include.as_ref()))
        .cloned()
        .unwrap_or_default();
    let exclude = account
        .and_then(|f| f.exclude.as_ref())
        .or_else(|| global.and_then(|f| f.exclude.as_ref()))
        .cloned()
        .unwrap_or_default();
    (include, exclude)
}

/// Resolve an effective policy from `global` and an optional override.
///
/// # Errors
///
/// Returns `Error::PatternCompilation` for an invalid regex and
/// `Error::Configuration` for an invalid date range or a zero cap.
pub fn resolve(
    global: &PolicySettings,
    account: Option<&PolicySettings>,
    key: Option<AccountKey>,
) -> Result<EffectivePolicy> {
    let scope = key.as_ref().map_or_else(
        || "global".to_string(),
        |k| format!("{}.{}", k.provider.accounts_key(), k.name),
    );

    let (include, exclude) = pick_lists(
        account.and_then(|a| a.folders.as_ref()),
        global.folders.as_ref(),
    );
    let folders = NameRule::new(include, exclude);

    let (include, exclude) = pick_lists(
        account.and_then(|a| a.senders.as_ref()),
        global.senders.as_ref(),
    );
    let senders = PatternRule::compile(&format!("{scope}.senders"), &include, &exclude)?;

    let (include, exclude) = pick_lists(
        account.and_then(|a| a.subjects.as_ref()),
        global.subjects.as_ref(),
    );
    let subjects = PatternRule::compile(&format!("{scope}.subjects"), &include, &exclude)?;

    let (include, exclude) = pick_lists(
        account.and_then(|a| a.platforms.as_ref()),
        global.platforms.as_ref(),
    );
    let platforms = NameRule::new(include, exclude);

    let (include, exclude) = pick_lists(
        account.and_then(|a| a.notification_types.as_ref()),
        global.notification_types.as_ref(),
    );
    let notification_types = NameRule::new(include, exclude);

    let date_range = pick(account, global, |s| s.date_range.as_ref()).unwrap_or_default();
    let date_window = DateWindow::from_spec(&date_range)
        .map_err(|e| Error::Configuration(format!("{scope}.date_range: {e}")))?;

    let max_emails_per_sync = pick(account, global, |s| s.max_emails_per_sync.as_ref())
        .unwrap_or(DEFAULT_MAX_EMAILS_PER_SYNC);
    if max_emails_per_sync == 0 {
        return Err(Error::Configuration(format!(
            "{scope}.max_emails_per_sync: must be at least 1"
        )));
    }

    let policy = EffectivePolicy {
        enabled: pick(account, global, |s| s.enabled.as_ref()).unwrap_or(true),
        folders,
        senders,
        subjects,
        platforms,
        notification_types,
        date_range,
        date_window,
        read_status: pick(account, global, |s| s.read_status.as_ref()).unwrap_or_default(),
        has_attachments: pick(account, global, |s| s.has_attachments.as_ref()),
        max_emails_per_sync,
        account: key,
    };

    debug!(
        scope = %policy.scope(),
        enabled = policy.enabled,
        read_status = policy.read_status.as_str(),
        max_emails = policy.max_emails_per_sync,
        "Resolved effective policy"
    );

    Ok(policy)
}
