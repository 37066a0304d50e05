//! Policy document validation.
//!
//! Collects every problem in a document instead of stopping at the first, so
//! a diagnostic run can report them all at once.

use std::collections::BTreeMap;

use super::date::{DateRangeError, DateWindow};
use super::document::{ListFilter, PolicyDocument, PolicySettings, Provider};
use crate::Error;
use crate::filter::compile_pattern;

/// One problem found in a policy document.
#[derive(Debug, Clone)]
pub enum ValidationIssue {
    /// A regex does not compile.
    InvalidPattern {
        /// Dotted path of the field.
        field: String,
        /// The pattern as written.
        pattern: String,
        /// Compiler message.
        message: String,
    },
    /// A date range is ambiguous, unparsable or inverted.
    InvalidDateRange {
        /// Dotted path of the `date_range` field.
        field: String,
        /// What is wrong with it.
        error: DateRangeError,
    },
    /// `max_emails_per_sync` is zero.
    ZeroMessageCap {
        /// Dotted path of the field.
        field: String,
    },
    /// A notification type has no non-empty keyword.
    EmptyKeywords {
        /// Notification type name.
        notification_type: String,
    },
    /// Two exact sender keys differ only by case.
    DuplicateExactSender {
        /// The address, lowercased.
        address: String,
    },
}

impl ValidationIssue {
    /// Get the field path this issue relates to.
    #[must_use]
    pub fn field(&self) -> String {
        match self {
            Self::InvalidPattern { field, .. }
            | Self::InvalidDateRange { field, .. }
            | Self::ZeroMessageCap { field } => field.clone(),
            Self::EmptyKeywords { notification_type } => {
                format!("notification_type_keywords.{notification_type}")
            }
            Self::DuplicateExactSender { .. } => "sender_platform_mappings.exact".to_string(),
        }
    }

    /// Whether the document cannot be used as written.
    ///
    /// Non-fatal issues (an empty keyword list, exact senders that differ
    /// only by case) are reported but do not stop a load.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::EmptyKeywords { .. } | Self::DuplicateExactSender { .. }
        )
    }

    /// Whether this issue sits inside one account's override.
    ///
    /// Such issues only make that account fail to resolve.
    #[must_use]
    pub fn is_account_scoped(&self) -> bool {
        let field = self.field();
        Provider::ALL.iter().any(|p| {
            field
                .strip_prefix(p.accounts_key())
                .is_some_and(|rest| rest.starts_with('.'))
        })
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPattern {
                field,
                pattern,
                message,
            } => write!(f, "{field}: invalid pattern {pattern:?}: {message}"),
            Self::InvalidDateRange { field, error } => write!(f, "{field}: {error}"),
            Self::ZeroMessageCap { field } => write!(f, "{field}: must be at least 1"),
            Self::EmptyKeywords { .. } => {
                write!(f, "{}: keyword list is empty", self.field())
            }
            Self::DuplicateExactSender { address } => {
                write!(f, "{}: {address:?} is listed more than once", self.field())
            }
        }
    }
}

impl std::error::Error for ValidationIssue {}

impl From<ValidationIssue> for Error {
    fn from(issue: ValidationIssue) -> Self {
        match issue {
            ValidationIssue::InvalidPattern { field, pattern, .. } => {
                match compile_pattern(field.clone(), &pattern) {
                    Err(err) => err,
                    Ok(_) => Self::Configuration(format!("{field}: invalid pattern {pattern:?}")),
                }
            }
            other => Self::Configuration(other.to_string()),
        }
    }
}

/// Result of validating a policy document.
pub type ValidationResult = Result<(), Vec<ValidationIssue>>;

fn check_patterns(field: &str, filter: Option<&ListFilter>, issues: &mut Vec<ValidationIssue>) {
    let Some(filter) = filter else {
        return;
    };
    for (side, list) in [("include", &filter.include), ("exclude", &filter.exclude)] {
        for (i, pattern) in list.iter().flatten().enumerate() {
            if let Err(Error::PatternCompilation { source, .. }) =
                compile_pattern(String::new(), pattern)
            {
                issues.push(ValidationIssue::InvalidPattern {
                    field: format!("{field}.{side}[{i}]"),
                    pattern: pattern.clone(),
                    message: source.to_string(),
                });
            }
        }
    }
}

fn check_settings(scope: &str, settings: &PolicySettings, issues: &mut Vec<ValidationIssue>) {
    check_patterns(&format!("{scope}.senders"), settings.senders.as_ref(), issues);
    check_patterns(&format!("{scope}.subjects"), settings.subjects.as_ref(), issues);

    if let Some(spec) = &settings.date_range
        && let Err(error) = DateWindow::from_spec(spec)
    {
        issues.push(ValidationIssue::InvalidDateRange {
            field: format!("{scope}.date_range"),
            error,
        });
    }

    if settings.max_emails_per_sync == Some(0) {
        issues.push(ValidationIssue::ZeroMessageCap {
            field: format!("{scope}.max_emails_per_sync"),
        });
    }
}

/// Validate a policy document.
///
/// Returns `Ok(())` if valid, or `Err(Vec<ValidationIssue>)` with all issues.
///
/// # Errors
///
/// Returns a vector of `ValidationIssue` if any field is invalid.
pub fn validate_document(document: &PolicyDocument) -> ValidationResult {
    let mut issues = Vec::new();

    check_settings("global", &document.global, &mut issues);
    for provider in Provider::ALL {
        for (name, settings) in document.accounts(provider) {
            check_settings(
                &format!("{}.{name}", provider.accounts_key()),
                settings,
                &mut issues,
            );
        }
    }

    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    for address in document.sender_platform_mappings.exact.keys() {
        *seen.entry(address.trim().to_lowercase()).or_default() += 1;
    }
    issues.extend(
        seen.into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(address, _)| ValidationIssue::DuplicateExactSender { address }),
    );

    for (i, (pattern, _)) in document.sender_platform_mappings.patterns.iter().enumerate() {
        if let Err(Error::PatternCompilation { source, .. }) =
            compile_pattern(String::new(), pattern)
        {
            issues.push(ValidationIssue::InvalidPattern {
                field: format!("sender_platform_mappings.patterns[{i}]"),
                pattern: pattern.to_string(),
                message: source.to_string(),
            });
        }
    }

    for (name, keywords) in document.notification_type_keywords.iter() {
        if keywords.iter().all(|k| k.is_empty()) {
            issues.push(ValidationIssue::EmptyKeywords {
                notification_type: name.to_string(),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}
