//! Original-post link extraction from notification bodies.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

#[allow(clippy::expect_used)]
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("valid URL pattern"));

/// Per-platform shape of a link to the post being notified about.
const POST_URL_PATTERNS: &[(&str, &str)] = &[
    ("tradingview", r"tradingview\.com/(chart|i)/"),
    ("medium", r"medium\.com/.+/[a-z0-9-]+"),
    ("substack", r"substack\.com/p/"),
    ("linkedin", r"linkedin\.com/(posts|feed/update)/"),
    ("youtube", r"youtube\.com/watch\?v=|youtu\.be/"),
    ("reddit", r"reddit\.com/r/.+/comments/"),
    ("devto", r"dev\.to/.+/[a-z0-9-]+"),
    ("github", r"github\.com/.+/(issues|discussions|pull)/"),
];

#[allow(clippy::expect_used)]
static POST_URLS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    POST_URL_PATTERNS
        .iter()
        .map(|(platform, pattern)| {
            let re = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .expect("valid post URL pattern");
            (*platform, re)
        })
        .collect()
});

/// Links that point at account plumbing rather than content.
const NOISE: &[&str] = &["unsubscribe", "settings", "manage", "preferences"];

/// All `http(s)` links in a body, in order of appearance.
#[must_use]
pub fn extract_urls(body: &str) -> Vec<&str> {
    URL.find_iter(body).map(|m| m.as_str()).collect()
}

/// Find the link to the post a notification is about.
///
/// Prefers a link shaped like a post on the detected platform, then falls
/// back to the first link that is not an unsubscribe/settings link.
#[must_use]
pub fn extract_original_url(body: &str, platform: Option<&str>) -> Option<String> {
    let urls = extract_urls(body);

    let platform_pattern = platform.and_then(|p| {
        POST_URLS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(p))
            .map(|(_, re)| re)
    });
    if let Some(re) = platform_pattern
        && let Some(url) = urls.iter().find(|u| re.is_match(u))
    {
        return Some((*url).to_string());
    }

    urls.into_iter()
        .find(|u| {
            let lower = u.to_lowercase();
            !NOISE.iter().any(|n| lower.contains(n))
        })
        .map(ToString::to_string)
}
