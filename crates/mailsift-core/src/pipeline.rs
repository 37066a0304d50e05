//! Per-account sync pipeline: resolve once, then enrich and filter each
//! fetched message.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::Result;
use crate::detect::Enricher;
use crate::filter::{FilterDecision, RejectReason, evaluate};
use crate::policy::{AccountKey, EffectivePolicy, Policy};
use crate::record::{EmailRecord, EnrichedRecord};

/// Platform label used in counts when detection found nothing.
pub const UNKNOWN_PLATFORM: &str = "unknown";

/// Outcome of processing one account's fetched messages.
#[derive(Debug, Clone, Default)]
pub struct AccountReport {
    /// Account processed, `None` for the global policy.
    pub account: Option<AccountKey>,
    /// The account is disabled and nothing was evaluated.
    pub skipped: bool,
    /// Accepted, enriched messages in fetch order.
    pub accepted: Vec<EnrichedRecord>,
    /// Rejected message count per category.
    pub rejected: BTreeMap<RejectReason, usize>,
    /// Messages skipped because their id was already stored or repeated.
    pub duplicates: usize,
    /// Accepted messages dropped because the per-sync cap was reached.
    pub over_cap: usize,
    /// Accepted message count per platform.
    pub platforms: BTreeMap<String, usize>,
}

impl AccountReport {
    /// Total rejected messages.
    #[must_use]
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Enrich and filter messages against an already resolved policy.
///
/// Messages whose id is in `existing` (or repeats within `records`) are
/// counted as duplicates. Once `max_emails_per_sync` messages are accepted,
/// further accepted messages are counted in `over_cap` and dropped.
pub fn process_records<I>(
    policy: &EffectivePolicy,
    enricher: &Enricher,
    records: I,
    existing: &HashSet<String>,
    now: DateTime<Utc>,
) -> AccountReport
where
    I: IntoIterator<Item = EmailRecord>,
{
    let mut report = AccountReport {
        account: policy.account.clone(),
        ..AccountReport::default()
    };

    if !policy.enabled {
        info!(scope = %policy.scope(), "Account disabled, skipping");
        report.skipped = true;
        return report;
    }

    let cap = usize::try_from(policy.max_emails_per_sync).unwrap_or(usize::MAX);
    let mut seen: HashSet<String> = HashSet::new();

    for record in records {
        if existing.contains(&record.id) || !seen.insert(record.id.clone()) {
            report.duplicates += 1;
            continue;
        }

        let enrichment = enricher.derive(&record);
        match evaluate(policy, &record, &enrichment, now) {
            FilterDecision::Reject(reason) => {
                debug!(id = %record.id, %reason, "Message rejected");
                *report.rejected.entry(reason).or_default() += 1;
            }
            FilterDecision::Accept if report.accepted.len() >= cap => {
                report.over_cap += 1;
            }
            FilterDecision::Accept => {
                let platform = enrichment
                    .platform
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());
                *report.platforms.entry(platform).or_default() += 1;
                report.accepted.push(EnrichedRecord { record, enrichment });
            }
        }
    }

    info!(
        scope = %policy.scope(),
        accepted = report.accepted.len(),
        rejected = report.rejected_total(),
        duplicates = report.duplicates,
        over_cap = report.over_cap,
        "Processed account messages"
    );

    report
}

/// Resolve an account's policy and process its fetched messages.
///
/// # Errors
///
/// Returns `Error::UnknownAccount` if the account is not configured.
pub fn process_account<I>(
    policy: &Policy,
    key: &AccountKey,
    records: I,
    existing: &HashSet<String>,
    now: DateTime<Utc>,
) -> Result<AccountReport>
where
    I: IntoIterator<Item = EmailRecord>,
{
    let effective = policy.resolve(key)?;
    Ok(process_records(
        &effective,
        policy.enricher(),
        records,
        existing,
        now,
    ))
}
