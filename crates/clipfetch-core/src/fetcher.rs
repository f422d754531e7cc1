//! Single-flight downloads into one temporary output file.
//!
//! Every request writes to the same path, so requests are serialized through a
//! [`DownloadSlot`]. While holding the slot a request removes the previous
//! temporary file, then runs the external downloader. Downloader failures come
//! back as [`DownloadOutcome::Failed`]; only a failure to clear the old file is
//! returned as `Err`. The slot is released on every path.

use anyhow::Context;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ClipfetchConfig, FetchPaths};
use crate::downloader::{download_args, DownloaderError, ExternalDownloader, YtDlp};
use crate::matcher::{MatcherError, UrlMatcher};
use crate::provision;
use crate::slot::{AcquireError, AcquireOptions, DownloadSlot};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Downloader(#[from] DownloaderError),
    #[error("timed out after {0:?} waiting for the download slot")]
    SlotTimeout(Duration),
    #[error("cancelled while waiting for the download slot")]
    Cancelled,
    #[error("clear temporary file {path}: {source}")]
    ClearTemp {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<AcquireError> for FetchError {
    fn from(e: AcquireError) -> Self {
        match e {
            AcquireError::TimedOut(d) => FetchError::SlotTimeout(d),
            AcquireError::Cancelled => FetchError::Cancelled,
        }
    }
}

/// Result of one download request.
#[derive(Debug)]
pub enum DownloadOutcome {
    /// The downloader finished; the video is at `path`.
    Completed { path: PathBuf, elapsed: Duration },
    /// The downloader failed, or the slot was never obtained.
    Failed(FetchError),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }
}

pub struct Fetcher {
    paths: FetchPaths,
    output_format: String,
    default_deadline: Option<Duration>,
    matcher: UrlMatcher,
    slot: DownloadSlot,
    downloader: Arc<dyn ExternalDownloader>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("paths", &self.paths)
            .field("output_format", &self.output_format)
            .field("default_deadline", &self.default_deadline)
            .field("busy", &self.slot.is_busy())
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Resolve paths, build the matcher and provision yt-dlp.
    /// A bad rule set fails before anything touches the network; a binary
    /// that cannot be provisioned is fatal: no fetcher is returned.
    pub async fn open(cfg: &ClipfetchConfig) -> anyhow::Result<Self> {
        let paths = cfg.resolve_paths()?;
        let matcher = UrlMatcher::from_config(cfg.matcher.rules.as_deref())?;
        let binary = provision::ensure_binary_async(
            paths.folder.clone(),
            paths.binary.clone(),
            cfg.binary_url().to_string(),
        )
        .await
        .with_context(|| format!("provision {}", paths.binary.display()))?;
        let downloader = Arc::new(YtDlp::new(binary));
        Ok(Self::assemble(cfg, paths, matcher, downloader))
    }

    /// Build a fetcher around any downloader, without provisioning.
    pub fn with_downloader(
        cfg: &ClipfetchConfig,
        paths: FetchPaths,
        downloader: Arc<dyn ExternalDownloader>,
    ) -> Result<Self, MatcherError> {
        let matcher = UrlMatcher::from_config(cfg.matcher.rules.as_deref())?;
        Ok(Self::assemble(cfg, paths, matcher, downloader))
    }

    fn assemble(
        cfg: &ClipfetchConfig,
        paths: FetchPaths,
        matcher: UrlMatcher,
        downloader: Arc<dyn ExternalDownloader>,
    ) -> Self {
        Self {
            paths,
            output_format: cfg.output_format.clone(),
            default_deadline: cfg.acquire_timeout(),
            matcher,
            slot: DownloadSlot::new(),
            downloader,
        }
    }

    pub fn paths(&self) -> &FetchPaths {
        &self.paths
    }

    /// True while a download holds the slot.
    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// True iff `url` matches a supported-platform rule.
    pub fn is_possible_url(&self, url: &str) -> bool {
        self.matcher.is_possible_url(url)
    }

    /// Download `url` into the temporary file, waiting for the slot first.
    /// Uses the configured slot deadline, if any.
    pub async fn request_download(&self, url: &str) -> Result<DownloadOutcome, FetchError> {
        let opts = AcquireOptions {
            deadline: self.default_deadline,
            cancel: None,
        };
        self.request_download_with(url, &opts).await
    }

    /// Like [`Fetcher::request_download`] with explicit wait bounds.
    pub async fn request_download_with(
        &self,
        url: &str,
        opts: &AcquireOptions,
    ) -> Result<DownloadOutcome, FetchError> {
        let permit = match self.slot.acquire_with(opts).await {
            Ok(p) => p,
            Err(e) => return Ok(DownloadOutcome::Failed(e.into())),
        };

        clear_temp_file(&self.paths.temp_file).await?;

        let args = download_args(url, &self.output_format, &self.paths.temp_file);
        tracing::info!("downloading {} to {}", url, self.paths.temp_file.display());
        let result = self.downloader.run(&args).await;
        let elapsed = permit.acquired_at().elapsed();
        drop(permit);

        match result {
            Ok(()) => {
                tracing::info!("downloaded {} in {:?}", url, elapsed);
                Ok(DownloadOutcome::Completed {
                    path: self.paths.temp_file.clone(),
                    elapsed,
                })
            }
            Err(e) => {
                tracing::warn!("download of {} failed: {}", url, e);
                Ok(DownloadOutcome::Failed(e.into()))
            }
        }
    }
}

/// Remove the previous temporary file; a missing file is fine.
async fn clear_temp_file(path: &Path) -> Result<(), FetchError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            tracing::debug!("removed previous {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FetchError::ClearTemp {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the args it was called with and returns a fixed result.
    struct Recording {
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl ExternalDownloader for Recording {
        async fn run(&self, args: &[String]) -> Result<(), DownloaderError> {
            self.calls.lock().unwrap().push(args.to_vec());
            if self.fail {
                Err(DownloaderError::Other("boom".into()))
            } else {
                Ok(())
            }
        }
    }

    fn fetcher(dir: &Path, fail: bool) -> (Fetcher, Arc<Recording>) {
        let cfg = ClipfetchConfig::default();
        let paths = FetchPaths::new(dir, &cfg);
        std::fs::create_dir_all(&paths.folder).unwrap();
        let stub = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
            fail,
        });
        let f = Fetcher::with_downloader(&cfg, paths, stub.clone()).unwrap();
        (f, stub)
    }

    #[tokio::test]
    async fn success_reports_temp_path() {
        let dir = tempfile::tempdir().unwrap();
        let (f, stub) = fetcher(dir.path(), false);
        let outcome = f.request_download("https://vm.tiktok.com/ZMxyz/").await.unwrap();
        match outcome {
            DownloadOutcome::Completed { path, .. } => {
                assert_eq!(path, dir.path().join(".ytdlp").join("TempYTDLP.mp4"))
            }
            other => panic!("expected Completed, got {other:?}"),
        }
        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0][0], "https://vm.tiktok.com/ZMxyz/");
        assert_eq!(calls[0][1..3], ["-f".to_string(), "mp4".to_string()]);
        assert!(!f.is_busy());
    }

    #[tokio::test]
    async fn failure_is_an_outcome_and_frees_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let (f, _stub) = fetcher(dir.path(), true);
        let outcome = f.request_download("https://example.com/video").await.unwrap();
        assert!(matches!(
            outcome,
            DownloadOutcome::Failed(FetchError::Downloader(DownloaderError::Other(_)))
        ));
        assert!(!f.is_busy());
    }

    #[tokio::test]
    async fn clear_temp_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        clear_temp_file(&dir.path().join("nope.mp4")).await.unwrap();
    }

    #[tokio::test]
    async fn clear_temp_error_is_returned_and_slot_released() {
        let dir = tempfile::tempdir().unwrap();
        let (f, stub) = fetcher(dir.path(), false);
        // A directory where the temp file should be: remove_file fails with something other than NotFound.
        std::fs::create_dir_all(&f.paths().temp_file).unwrap();
        let err = f.request_download("https://x.com/a/status/1").await.unwrap_err();
        assert!(matches!(err, FetchError::ClearTemp { .. }));
        assert!(stub.calls.lock().unwrap().is_empty());
        assert!(!f.is_busy());
    }

    #[tokio::test]
    async fn pre_acquired_slot_with_deadline_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let (f, stub) = fetcher(dir.path(), false);
        let _held = f.slot.try_acquire().unwrap();
        let opts = AcquireOptions::default().with_deadline(Duration::from_millis(20));
        let outcome = f
            .request_download_with("https://x.com/a/status/1", &opts)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            DownloadOutcome::Failed(FetchError::SlotTimeout(_))
        ));
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn acquire_errors_map_to_fetch_errors() {
        assert!(matches!(
            FetchError::from(AcquireError::Cancelled),
            FetchError::Cancelled
        ));
        assert!(matches!(
            FetchError::from(AcquireError::TimedOut(Duration::from_secs(1))),
            FetchError::SlotTimeout(d) if d == Duration::from_secs(1)
        ));
    }
}
