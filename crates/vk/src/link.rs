//! Group-link parsing.
//!
//! Accepts the link shapes users actually paste: with or without scheme,
//! `www.` / `m.` hosts, numeric `club123` / `public123` / `event123` forms
//! and plain screen names.

use std::sync::OnceLock;

use regex::Regex;

/// Ordered patterns; numeric id forms are tried before screen names so
/// `vk.com/club123` resolves to `123` and not the literal `club123`.
const LINK_PATTERNS: &[&str] = &[
    r"(?i)(?:https?://)?(?:www\.)?vk\.com/(?:club|public|event)(\d+)",
    r"(?i)(?:https?://)?(?:m\.)?vk\.com/(?:club|public)(\d+)",
    r"(?i)(?:https?://)?(?:www\.)?vk\.com/([a-zA-Z0-9_.]+)",
    r"(?i)(?:https?://)?(?:m\.)?vk\.com/([a-zA-Z0-9_.]+)",
];

fn compiled_patterns() -> &'static Vec<Regex> {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LINK_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("link pattern must compile"))
            .collect()
    })
}

/// Extract the group id or screen name from a pasted link.
///
/// Returns `None` when nothing in the text looks like a VK group
/// reference.
pub fn parse_group_link(link: &str) -> Option<String> {
    let link = link.trim().trim_end_matches('/');
    for pattern in compiled_patterns() {
        if let Some(captures) = pattern.captures(link) {
            return Some(captures[1].to_string());
        }
    }
    None
}
