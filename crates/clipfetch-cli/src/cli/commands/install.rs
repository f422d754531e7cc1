//! `clipfetch install` – provision yt-dlp.

use anyhow::Result;
use clipfetch_core::config::ClipfetchConfig;
use clipfetch_core::provision;

pub async fn run_install(cfg: &ClipfetchConfig) -> Result<()> {
    let paths = cfg.resolve_paths()?;
    let binary = provision::ensure_binary_async(
        paths.folder,
        paths.binary,
        cfg.binary_url().to_string(),
    )
    .await?;
    println!("{}", binary.display());
    Ok(())
}
