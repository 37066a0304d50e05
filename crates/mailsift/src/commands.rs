//! Command implementations.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use mailsift_core::policy::SchemaVersion;
use mailsift_core::{
    AccountKey, EmailRecord, EmailRepository, Policy, PolicyDocument, Provider,
    RejectReason, build_query, process_account, validate_document,
};

/// Validate a policy document, printing every issue.
///
/// Returns `false` if the document is unusable.
pub fn validate(path: &Path) -> Result<bool> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy {}", path.display()))?;

    let document: PolicyDocument = match serde_json::from_str(&json) {
        Ok(document) => document,
        Err(e) => {
            println!("{}: invalid document: {e}", path.display());
            return Ok(false);
        }
    };

    match SchemaVersion::of(&document) {
        SchemaVersion::Supported(_) => {}
        SchemaVersion::Missing => println!("warning: _schema_version is missing"),
        SchemaVersion::Unrecognized(v) => {
            println!("warning: _schema_version {v:?} is not recognized");
        }
    }

    match validate_document(&document) {
        Ok(()) => {
            let accounts: usize = Provider::ALL
                .iter()
                .map(|p| document.accounts(*p).len())
                .sum();
            println!("{}: valid ({accounts} accounts)", path.display());
            Ok(true)
        }
        Err(issues) => {
            for issue in &issues {
                let level = if issue.is_fatal() { "error" } else { "warning" };
                println!("{level}: {issue}");
            }
            let fatal = issues.iter().filter(|i| i.is_fatal()).count();
            println!(
                "{}: {fatal} error(s), {} warning(s)",
                path.display(),
                issues.len() - fatal
            );
            Ok(fatal == 0)
        }
    }
}

/// Pick the account named on the command line.
///
/// Without `--provider` the name is looked up under every provider.
pub fn select_account(
    policy: &Policy,
    name: Option<&str>,
    provider: Option<Provider>,
) -> Result<Option<AccountKey>> {
    let Some(name) = name else {
        return Ok(None);
    };
    let key = match provider {
        Some(provider) => AccountKey::new(provider, name),
        None => match policy.find_account(name) {
            Some(key) => key,
            None => bail!("Account {name:?} is not configured under any provider"),
        },
    };
    // Surface unknown accounts before any work is done.
    policy.resolve(&key)?;
    Ok(Some(key))
}

#[derive(Serialize)]
struct ShowOutput {
    scope: String,
    policy: mailsift_core::PolicySettings,
}

/// Print the resolved policy for an account, or the global policy.
pub fn show(policy: &Policy, key: Option<&AccountKey>) -> Result<()> {
    let effective = match key {
        Some(key) => policy.resolve(key)?,
        None => policy.resolve_global()?,
    };
    let output = ShowOutput {
        scope: effective.scope(),
        policy: effective.to_settings(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Print the platform detected for a sender.
pub fn test_sender(policy: &Policy, sender: &str) {
    match policy.enricher().platforms().detect(sender) {
        Some(platform) => println!("{sender} -> {platform}"),
        None => println!("{sender} -> (no platform)"),
    }
}

/// Print the notification type detected for a subject.
pub fn test_subject(policy: &Policy, subject: &str) {
    match policy.enricher().notifications().detect(subject) {
        Some(kind) => println!("{subject:?} -> {kind}"),
        None => println!("{subject:?} -> (no notification type)"),
    }
}

/// Print the upstream query for one account, or for every enabled account.
pub fn query(policy: &Policy, key: Option<&AccountKey>) -> Result<()> {
    let now = Utc::now();
    let keys = key.map_or_else(|| policy.accounts(), |k| vec![k.clone()]);

    for key in keys {
        let effective = match policy.resolve(&key) {
            Ok(effective) => effective,
            Err(e) => {
                println!("{key}: invalid: {e}");
                continue;
            }
        };
        if !effective.enabled {
            println!("{key}: disabled");
            continue;
        }
        println!("{key}: {}", build_query(key.provider, &effective, now));
    }
    Ok(())
}

/// List configured accounts.
pub fn list_accounts(policy: &Policy) -> Result<()> {
    let keys = policy.accounts();
    if keys.is_empty() {
        println!("No accounts configured; only the global policy applies.");
    }
    for key in keys {
        let effective = match policy.resolve(&key) {
            Ok(effective) => effective,
            Err(e) => {
                println!("{key} (invalid: {e})");
                continue;
            }
        };
        let state = if effective.enabled { "enabled" } else { "disabled" };
        println!(
            "{key} ({state}, max {} per sync)",
            effective.max_emails_per_sync
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct IngestSummary<'a> {
    account: String,
    skipped: bool,
    accepted: usize,
    rejected: usize,
    rejected_by: BTreeMap<&'static str, usize>,
    duplicates: usize,
    over_cap: usize,
    platforms: &'a BTreeMap<String, usize>,
    stored: u64,
    dry_run: bool,
}

/// Rejection counts for every reason, including those that never fired.
fn rejected_by_reason(
    rejected: &BTreeMap<RejectReason, usize>,
) -> BTreeMap<&'static str, usize> {
    RejectReason::ALL
        .iter()
        .map(|reason| (reason.as_str(), rejected.get(reason).copied().unwrap_or_default()))
        .collect()
}

async fn open_store(db_path: &Path) -> Result<EmailRepository> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let path = db_path
        .to_str()
        .with_context(|| format!("Database path is not valid UTF-8: {}", db_path.display()))?;
    EmailRepository::new(path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))
}

/// Filter, enrich and store fetched messages for one account.
pub async fn ingest(
    policy: &Policy,
    key: &AccountKey,
    records_path: &Path,
    db_path: &Path,
    dry_run: bool,
) -> Result<()> {
    let json = std::fs::read_to_string(records_path)
        .with_context(|| format!("Failed to read records {}", records_path.display()))?;
    let records: Vec<EmailRecord> = serde_json::from_str(&json)
        .with_context(|| format!("Invalid records in {}", records_path.display()))?;
    info!(account = %key, count = records.len(), "Loaded fetched messages");

    let store = if dry_run {
        None
    } else {
        Some(open_store(db_path).await?)
    };
    let existing = match &store {
        Some(store) => store.existing_ids().await?,
        None => HashSet::new(),
    };

    let now = Utc::now();
    let report = process_account(policy, key, records, &existing, now)?;

    let mut stored = 0;
    if let Some(store) = &store
        && !report.skipped
    {
        stored = store.upsert_batch(key, &report.accepted).await?;
        store.set_last_sync(key, now).await?;
    }

    let summary = IngestSummary {
        account: key.to_string(),
        skipped: report.skipped,
        accepted: report.accepted.len(),
        rejected: report.rejected_total(),
        rejected_by: rejected_by_reason(&report.rejected),
        duplicates: report.duplicates,
        over_cap: report.over_cap,
        platforms: &report.platforms,
        stored,
        dry_run,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Print stored message counts.
pub async fn stats(db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        bail!("No database at {}", db_path.display());
    }
    let store = open_store(db_path).await?;
    let stats = store.stats().await?;

    println!("Total messages: {}", stats.total);
    for (title, counts) in [
        ("By account", &stats.by_account),
        ("By platform", &stats.by_platform),
        ("By notification type", &stats.by_notification_type),
    ] {
        println!("\n{title}:");
        for (name, count) in counts {
            println!("  {name}: {count}");
        }
    }
    Ok(())
}
