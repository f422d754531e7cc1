//! `clipfetch check <url>` – test a URL against the platform rules.

use anyhow::Result;
use clipfetch_core::config::ClipfetchConfig;
use clipfetch_core::UrlMatcher;

pub fn run_check(cfg: &ClipfetchConfig, url: &str) -> Result<()> {
    let matcher = UrlMatcher::from_config(cfg.matcher.rules.as_deref())?;
    match matcher.matching_platform(url) {
        Some(platform) => println!("supported ({platform}): {url}"),
        None => println!("unsupported: {url}"),
    }
    Ok(())
}
