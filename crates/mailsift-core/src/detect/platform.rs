//! Sender address to platform detection.

use std::collections::HashMap;

use regex::Regex;

use crate::Result;
use crate::filter::compile_pattern;
use crate::policy::SenderPlatformMappings;
use crate::record::parse_address;

/// Maps sender addresses to platform names.
///
/// Exact entries always win over patterns; among patterns the first one
/// declared wins.
#[derive(Debug, Clone, Default)]
pub struct PlatformDetector {
    exact: HashMap<String, String>,
    patterns: Vec<(Regex, String)>,
}

impl PlatformDetector {
    /// Build a detector from the document's mapping tables.
    ///
    /// # Errors
    ///
    /// Returns `Error::PatternCompilation` if a pattern key does not compile.
    pub fn from_mappings(mappings: &SenderPlatformMappings) -> Result<Self> {
        let exact = mappings
            .exact
            .iter()
            .map(|(addr, platform)| (addr.trim().to_lowercase(), platform.clone()))
            .collect();

        let patterns = mappings
            .patterns
            .iter()
            .enumerate()
            .map(|(i, (pattern, platform))| {
                compile_pattern(format!("sender_platform_mappings.patterns[{i}]"), pattern)
                    .map(|re| (re, platform.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { exact, patterns })
    }

    /// Detect the platform for a sender.
    ///
    /// Accepts a bare address or a `Name <address>` value. Returns `None`
    /// when nothing matches.
    #[must_use]
    pub fn detect(&self, sender: &str) -> Option<&str> {
        let address = parse_address(sender).to_lowercase();

        if let Some(platform) = self.exact.get(&address) {
            return Some(platform);
        }

        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(&address))
            .map(|(_, platform)| platform.as_str())
    }
}
