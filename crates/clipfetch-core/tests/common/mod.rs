//! Shared helpers for clipfetch-core integration tests.

#![allow(dead_code)]

pub mod file_server;
pub mod stub;

use clipfetch_core::config::{ClipfetchConfig, FetchPaths};
use clipfetch_core::downloader::ExternalDownloader;
use clipfetch_core::Fetcher;
use std::path::Path;
use std::sync::Arc;

/// Fetcher rooted at `base` with default config, around `downloader`.
pub fn fetcher_in(base: &Path, downloader: Arc<dyn ExternalDownloader>) -> Fetcher {
    fetcher_with(base, ClipfetchConfig::default(), downloader)
}

pub fn fetcher_with(
    base: &Path,
    cfg: ClipfetchConfig,
    downloader: Arc<dyn ExternalDownloader>,
) -> Fetcher {
    let paths = FetchPaths::new(base, &cfg);
    std::fs::create_dir_all(&paths.folder).unwrap();
    Fetcher::with_downloader(&cfg, paths, downloader).unwrap()
}
