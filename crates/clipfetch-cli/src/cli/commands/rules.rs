//! `clipfetch rules` – list the active URL rules.

use anyhow::Result;
use clipfetch_core::config::ClipfetchConfig;
use clipfetch_core::UrlMatcher;

pub fn run_rules(cfg: &ClipfetchConfig) -> Result<()> {
    let matcher = UrlMatcher::from_config(cfg.matcher.rules.as_deref())?;
    match matcher.version() {
        Some(v) => println!("built-in rules, version {v}"),
        None => println!("rules from config"),
    }
    println!("{:<12} {}", "PLATFORM", "PATTERN");
    for rule in matcher.rules() {
        println!("{:<12} {}", rule.platform, rule.pattern);
    }
    Ok(())
}
