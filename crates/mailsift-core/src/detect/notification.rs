//! Subject line to notification type detection.

use crate::policy::OrderedMap;

/// Maps subject lines to notification types by keyword.
///
/// Types are tried in declaration order; the first type with any keyword
/// contained in the subject wins.
#[derive(Debug, Clone, Default)]
pub struct NotificationDetector {
    types: Vec<(String, Vec<String>)>,
}

impl NotificationDetector {
    /// Build a detector from the document's keyword table.
    #[must_use]
    pub fn from_keywords(keywords: &OrderedMap<Vec<String>>) -> Self {
        let types = keywords
            .iter()
            .map(|(name, words)| {
                let words = words
                    .iter()
                    .map(|w| w.to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect();
                (name.to_string(), words)
            })
            .collect();
        Self { types }
    }

    /// Detect the notification type of a subject line.
    #[must_use]
    pub fn detect(&self, subject: &str) -> Option<&str> {
        let subject = subject.to_lowercase();
        self.types
            .iter()
            .find(|(_, words)| words.iter().any(|w| subject.contains(w.as_str())))
            .map(|(name, _)| name.as_str())
    }
}
