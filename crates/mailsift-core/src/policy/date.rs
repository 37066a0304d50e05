//! Date window parsing and evaluation.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use super::document::DateRangeSpec;

/// Resolved date window of an effective policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateWindow {
    /// No date filtering.
    #[default]
    Disabled,
    /// Messages from the last N days relative to evaluation time.
    LastDays(u32),
    /// Messages between two inclusive bounds; either side may be open.
    Between {
        /// Inclusive lower bound.
        after: Option<DateTime<Utc>>,
        /// Inclusive upper bound.
        before: Option<DateTime<Utc>>,
    },
}

/// Why a date range could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateRangeError {
    /// `last_days` set together with `after` or `before`.
    Ambiguous,
    /// A bound is neither RFC 3339 nor `YYYY-MM-DD`.
    InvalidDate {
        /// `after` or `before`.
        field: &'static str,
        /// The literal as written.
        value: String,
    },
    /// `after` is later than `before`.
    Inverted,
}

impl std::fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ambiguous => {
                f.write_str("last_days cannot be combined with after/before")
            }
            Self::InvalidDate { field, value } => {
                write!(f, "{field} is not a date or RFC 3339 timestamp: {value:?}")
            }
            Self::Inverted => f.write_str("after is later than before"),
        }
    }
}

impl std::error::Error for DateRangeError {}

#[derive(Clone, Copy)]
enum Edge {
    Lower,
    Upper,
}

/// Parse a bound. A bare date covers the whole day on the given edge.
fn parse_bound(value: &str, edge: Edge) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let naive = match edge {
        Edge::Lower => date.and_hms_opt(0, 0, 0)?,
        Edge::Upper => date.and_hms_nano_opt(23, 59, 59, 999_999_999)?,
    };
    Some(naive.and_utc())
}

impl DateWindow {
    /// Resolve a date range spec.
    ///
    /// # Errors
    ///
    /// Returns a `DateRangeError` when the range is ambiguous, a bound fails
    /// to parse, or the bounds are inverted.
    pub fn from_spec(spec: &DateRangeSpec) -> Result<Self, DateRangeError> {
        if spec.is_ambiguous() {
            return Err(DateRangeError::Ambiguous);
        }

        let after = spec
            .after
            .as_deref()
            .map(|v| {
                parse_bound(v, Edge::Lower).ok_or_else(|| DateRangeError::InvalidDate {
                    field: "after",
                    value: v.to_string(),
                })
            })
            .transpose()?;
        let before = spec
            .before
            .as_deref()
            .map(|v| {
                parse_bound(v, Edge::Upper).ok_or_else(|| DateRangeError::InvalidDate {
                    field: "before",
                    value: v.to_string(),
                })
            })
            .transpose()?;

        if let (Some(a), Some(b)) = (after, before)
            && a > b
        {
            return Err(DateRangeError::Inverted);
        }

        if !spec.enabled {
            return Ok(Self::Disabled);
        }

        Ok(match (spec.last_days, after, before) {
            (Some(days), _, _) => Self::LastDays(days),
            (None, None, None) => Self::Disabled,
            (None, after, before) => Self::Between { after, before },
        })
    }

    /// Concrete inclusive bounds at evaluation time `now`.
    #[must_use]
    pub fn bounds(&self, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        match *self {
            Self::Disabled => (None, None),
            Self::LastDays(days) => (
                now.checked_sub_signed(TimeDelta::days(i64::from(days))),
                None,
            ),
            Self::Between { after, before } => (after, before),
        }
    }

    /// Whether `ts` falls inside the window at evaluation time `now`.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let (after, before) = self.bounds(now);
        after.is_none_or(|a| ts >= a) && before.is_none_or(|b| ts <= b)
    }
}
