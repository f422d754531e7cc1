//! `clipfetch fetch <url>` – single download, JSON result on stdout.

use anyhow::{bail, Result};
use clipfetch_core::config::ClipfetchConfig;
use clipfetch_core::slot::AcquireOptions;
use clipfetch_core::{DownloadReport, Fetcher};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub url: String,
    pub timeout_secs: Option<u64>,
    pub require_supported: bool,
}

pub async fn run_fetch(cfg: &ClipfetchConfig, args: &FetchArgs) -> Result<()> {
    let fetcher = Fetcher::open(cfg).await?;
    if args.require_supported && !fetcher.is_possible_url(&args.url) {
        bail!("no supported-platform rule matches {}", args.url);
    }

    let opts = AcquireOptions {
        deadline: args
            .timeout_secs
            .map(Duration::from_secs)
            .or_else(|| cfg.acquire_timeout()),
        cancel: None,
    };
    let outcome = fetcher.request_download_with(&args.url, &opts).await?;
    let report = DownloadReport::from(&outcome);
    println!("{}", report.to_json()?);
    if !report.status {
        bail!("download failed: {}", report.data);
    }
    Ok(())
}
