//! Built-in supported-platform rules.

use super::MatchRule;

/// Bumped whenever the built-in list changes.
pub const BUILTIN_RULESET_VERSION: u32 = 2;

const BUILTIN: &[(&str, &str)] = &[
    ("facebook", r"(?i)https?://(?:www\.)?facebook\.com/[^\n\r\x{2028}\x{2029}]+"),
    ("fb.watch", r"https://fb\.watch/[a-zA-Z0-9_-]+"),
    ("tiktok", r"https://(www\.)?(vm\.)?tiktok\.com/\S*"),
    ("instagram", r"https://(www\.)?instagram\.com/\S*"),
    ("x", r"https://(www\.)?(x\.com|twitter\.com)/\S*"),
    ("reddit", r"https://(www\.)?reddit\.com/\S*"),
];

pub(super) fn builtin_rules() -> Vec<MatchRule> {
    BUILTIN
        .iter()
        .map(|(platform, pattern)| MatchRule::new(*platform, *pattern))
        .collect()
}
