//! Include/exclude rules.
//!
//! One rule shape serves every category: an empty include list lets every
//! value through, a non-empty one requires at least one match, and any
//! exclude match rejects regardless of the include outcome.

use regex::{Regex, RegexBuilder};

use crate::{Error, Result};

/// Compile a case-insensitive search pattern.
///
/// # Errors
///
/// Returns `Error::PatternCompilation` naming `field` and the pattern.
pub fn compile_pattern(field: impl Into<String>, pattern: &str) -> Result<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::PatternCompilation {
            field: field.into(),
            pattern: pattern.to_string(),
            source: Box::new(source),
        })
}

fn compile_list(field: &str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| compile_pattern(format!("{field}[{i}]"), p))
        .collect()
}

/// Regex include/exclude rule (senders, subjects).
///
/// Patterns are matched with `search` semantics: anywhere in the value.
#[derive(Debug, Clone, Default)]
pub struct PatternRule {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PatternRule {
    /// Compile a rule; `field` is the dotted path used in error messages.
    ///
    /// # Errors
    ///
    /// Returns `Error::PatternCompilation` for the first pattern that fails.
    pub fn compile(field: &str, include: &[String], exclude: &[String]) -> Result<Self> {
        Ok(Self {
            include: compile_list(&format!("{field}.include"), include)?,
            exclude: compile_list(&format!("{field}.exclude"), exclude)?,
        })
    }

    /// Whether `value` passes the rule.
    #[must_use]
    pub fn allows(&self, value: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|r| r.is_match(value));
        included && !self.exclude.iter().any(|r| r.is_match(value))
    }

    /// Include patterns as written.
    #[must_use]
    pub fn include(&self) -> Vec<String> {
        self.include.iter().map(|r| r.as_str().to_string()).collect()
    }

    /// Exclude patterns as written.
    #[must_use]
    pub fn exclude(&self) -> Vec<String> {
        self.exclude.iter().map(|r| r.as_str().to_string()).collect()
    }
}

/// Name include/exclude rule (folders, platforms, notification types).
///
/// Matching is case-insensitive set membership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRule {
    include: Vec<String>,
    exclude: Vec<String>,
    include_folded: Vec<String>,
    exclude_folded: Vec<String>,
}

fn fold(values: &[String]) -> Vec<String> {
    values.iter().map(|v| v.to_lowercase()).collect()
}

impl NameRule {
    /// Build a rule from resolved lists.
    #[must_use]
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include_folded: fold(&include),
            exclude_folded: fold(&exclude),
            include,
            exclude,
        }
    }

    /// Whether `value` passes the rule.
    ///
    /// An absent value only passes when the include list is empty.
    #[must_use]
    pub fn allows(&self, value: Option<&str>) -> bool {
        let Some(value) = value else {
            return self.include.is_empty();
        };
        let value = value.to_lowercase();
        let included = self.include_folded.is_empty() || self.include_folded.contains(&value);
        included && !self.exclude_folded.contains(&value)
    }

    /// Include names as written.
    #[must_use]
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Exclude names as written.
    #[must_use]
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }
}
