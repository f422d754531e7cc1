//! Stub downloaders that observe how the fetcher drives them.

use async_trait::async_trait;
use clipfetch_core::downloader::{DownloaderError, ExternalDownloader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Sleeps for `delay`, writes the file named after `-o`, and records
/// concurrency and whether a file was already at the output path.
#[derive(Default)]
pub struct StubDownloader {
    pub delay: Duration,
    pub fail_with: Option<String>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
    pub urls: Mutex<Vec<String>>,
    pub saw_existing_output: Mutex<Vec<bool>>,
}

impl StubDownloader {
    pub fn succeeding(delay: Duration) -> Self {
        Self {
            delay,
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

fn output_path(args: &[String]) -> Option<PathBuf> {
    args.iter()
        .position(|a| a == "-o")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
}

#[async_trait]
impl ExternalDownloader for StubDownloader {
    async fn run(&self, args: &[String]) -> Result<(), DownloaderError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(args[0].clone());

        let out = output_path(args);
        let existed = out.as_ref().map(|p| p.exists()).unwrap_or(false);
        self.saw_existing_output.lock().unwrap().push(existed);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.fail_with {
            Some(msg) => Err(DownloaderError::Other(msg.clone())),
            None => match out {
                Some(p) => std::fs::write(p, b"video").map_err(|e| DownloaderError::Other(e.to_string())),
                None => Ok(()),
            },
        };
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
