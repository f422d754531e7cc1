//! Supported-platform URL matching.
//!
//! A URL is "possible" when at least one rule of an ordered list matches it.
//! Rules are plain regexes searched anywhere in the input (unanchored); the
//! first match wins and there is no ranking between rules. The list is either
//! the built-in one or injected from config.

mod builtin;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use builtin::BUILTIN_RULESET_VERSION;

/// One platform family and the pattern recognizing its URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    pub platform: String,
    pub pattern: String,
}

impl MatchRule {
    pub fn new(platform: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            pattern: pattern.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error("invalid pattern for platform {platform}: {source}")]
    InvalidPattern {
        platform: String,
        #[source]
        source: regex::Error,
    },
}

/// Ordered, compiled rule set.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    version: Option<u32>,
    rules: Vec<(MatchRule, Regex)>,
}

impl UrlMatcher {
    /// The built-in rule set (facebook, fb.watch, tiktok, instagram, x/twitter, reddit).
    pub fn builtin() -> Self {
        let rules = builtin::builtin_rules()
            .into_iter()
            .map(|rule| {
                let re = Regex::new(&rule.pattern).expect("built-in pattern compiles");
                (rule, re)
            })
            .collect();
        Self {
            version: Some(BUILTIN_RULESET_VERSION),
            rules,
        }
    }

    /// Compile a caller-supplied rule set, keeping its order.
    pub fn from_rules(rules: Vec<MatchRule>) -> Result<Self, MatcherError> {
        let compiled = rules
            .into_iter()
            .map(|rule| match Regex::new(&rule.pattern) {
                Ok(re) => Ok((rule, re)),
                Err(source) => Err(MatcherError::InvalidPattern {
                    platform: rule.platform,
                    source,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            version: None,
            rules: compiled,
        })
    }

    /// Built-in set unless `rules` is given.
    pub fn from_config(rules: Option<&[MatchRule]>) -> Result<Self, MatcherError> {
        match rules {
            Some(r) => Self::from_rules(r.to_vec()),
            None => Ok(Self::builtin()),
        }
    }

    /// True iff any rule matches `url`.
    pub fn is_possible_url(&self, url: &str) -> bool {
        self.matching_platform(url).is_some()
    }

    /// Platform label of the first rule matching `url`.
    pub fn matching_platform(&self, url: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|(_, re)| re.is_match(url))
            .map(|(rule, _)| rule.platform.as_str())
    }

    pub fn rules(&self) -> impl Iterator<Item = &MatchRule> {
        self.rules.iter().map(|(rule, _)| rule)
    }

    /// Built-in ruleset version; `None` for injected rules.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for UrlMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}
