//! Microsoft Graph message query builder.

use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::policy::{EffectivePolicy, ReadStatus};

/// Folders to list plus an OData `$filter` expression.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GraphQuery {
    /// Mail folders to fetch from; empty means every folder.
    pub folders: Vec<String>,
    /// `$filter` expression, if any.
    pub filter: Option<String>,
}

impl std::fmt::Display for GraphQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.folders.is_empty() {
            f.write_str("folders=*")?;
        } else {
            write!(f, "folders={}", self.folders.join(","))?;
        }
        if let Some(filter) = &self.filter {
            write!(f, " $filter={filter}")?;
        }
        Ok(())
    }
}

fn odata_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Build the Graph query for a policy.
///
/// Bounds are rounded outward to whole seconds so the filter never drops a
/// message the evaluator would keep.
#[must_use]
pub fn graph_query(policy: &EffectivePolicy, now: DateTime<Utc>) -> GraphQuery {
    let mut clauses = Vec::new();

    let (after, before) = policy.date_window.bounds(now);
    if let Some(after) = after.and_then(|a| a.duration_trunc(TimeDelta::seconds(1)).ok()) {
        clauses.push(format!("receivedDateTime ge {}", odata_time(after)));
    }
    if let Some(before) = before
        .and_then(|b| b.duration_trunc(TimeDelta::seconds(1)).ok())
        .and_then(|b| b.checked_add_signed(TimeDelta::seconds(1)))
    {
        clauses.push(format!("receivedDateTime lt {}", odata_time(before)));
    }

    match policy.read_status {
        ReadStatus::All => {}
        ReadStatus::Read => clauses.push("isRead eq true".to_string()),
        ReadStatus::Unread => clauses.push("isRead eq false".to_string()),
    }

    GraphQuery {
        folders: policy.folders.include().to_vec(),
        filter: (!clauses.is_empty()).then(|| clauses.join(" and ")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::{DateRangeSpec, ListFilter, PolicySettings, resolve};
    use chrono::TimeZone;

    fn policy(settings: PolicySettings) -> EffectivePolicy {
        resolve(&settings, None, None).unwrap()
    }

    #[test]
    fn test_no_filter_for_default_policy() {
        let q = graph_query(&policy(PolicySettings::default()), Utc::now());
        assert!(q.folders.is_empty());
        assert_eq!(q.filter, None);
        assert_eq!(q.to_string(), "folders=*");
    }

    #[test]
    fn test_bounds_and_read_state() {
        let p = policy(PolicySettings {
            folders: Some(ListFilter::new(vec!["Inbox".into()], vec![])),
            date_range: Some(DateRangeSpec {
                enabled: true,
                last_days: None,
                after: Some("2024-03-01".into()),
                before: Some("2024-03-31".into()),
            }),
            read_status: Some(ReadStatus::Read),
            ..PolicySettings::default()
        });

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let q = graph_query(&p, now);
        assert_eq!(q.folders, ["Inbox"]);
        assert_eq!(
            q.filter.as_deref(),
            Some(
                "receivedDateTime ge 2024-03-01T00:00:00Z and \
                 receivedDateTime lt 2024-04-01T00:00:00Z and isRead eq true"
            )
        );
    }
}
