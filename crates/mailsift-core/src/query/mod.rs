//! Upstream fetch queries.
//!
//! Translates an effective policy's folder, date and read-status settings
//! into what a provider's fetch API understands. Queries only narrow the
//! fetch conservatively: they may return more than the policy accepts, never
//! less. The filter evaluator makes the final call on every message.

mod gmail;
mod graph;

pub use gmail::{GmailQuery, gmail_query};
pub use graph::{GraphQuery, graph_query};

use chrono::{DateTime, Utc};

use crate::policy::{EffectivePolicy, Provider};

/// Provider-specific fetch query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamQuery {
    /// Gmail search string.
    Gmail(GmailQuery),
    /// Microsoft Graph folders and `$filter`.
    Graph(GraphQuery),
}

impl std::fmt::Display for UpstreamQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gmail(q) => q.fmt(f),
            Self::Graph(q) => q.fmt(f),
        }
    }
}

/// Build the fetch query for a provider.
#[must_use]
pub fn build_query(
    provider: Provider,
    policy: &EffectivePolicy,
    now: DateTime<Utc>,
) -> UpstreamQuery {
    match provider {
        Provider::Gmail => UpstreamQuery::Gmail(gmail_query(policy, now)),
        Provider::Microsoft => UpstreamQuery::Graph(graph_query(policy, now)),
    }
}
