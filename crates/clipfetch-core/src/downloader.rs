//! External downloader collaborator.
//!
//! The fetcher never talks to the network itself; it hands an argument list
//! to an [`ExternalDownloader`]. [`YtDlp`] runs the real executable; tests
//! plug in stubs.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Keep at most this much stderr in an error message.
const STDERR_TAIL: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DownloaderError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("downloader exited with {status}: {stderr}")]
    Exit { status: String, stderr: String },
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ExternalDownloader: Send + Sync {
    /// Run one download with the given arguments; resolves when it has finished.
    async fn run(&self, args: &[String]) -> Result<(), DownloaderError>;
}

/// Arguments for one download: URL, forced container format, output path.
pub fn download_args(url: &str, format: &str, output: &Path) -> Vec<String> {
    vec![
        url.to_string(),
        "-f".to_string(),
        format.to_string(),
        "-o".to_string(),
        output.to_string_lossy().into_owned(),
    ]
}

/// yt-dlp executable at a fixed path.
#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
}

impl YtDlp {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

fn tail(s: &str, max: usize) -> &str {
    let s = s.trim_end();
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

#[async_trait]
impl ExternalDownloader for YtDlp {
    async fn run(&self, args: &[String]) -> Result<(), DownloaderError> {
        tracing::debug!("running {} {:?}", self.binary.display(), args);
        let output = tokio::process::Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DownloaderError::Spawn {
                program: self.binary.display().to_string(),
                message: e.to_string(),
            })?;

        if output.status.success() {
            return Ok(());
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let err = DownloaderError::Exit {
            status: output.status.to_string(),
            stderr: tail(&stderr, STDERR_TAIL).to_string(),
        };
        tracing::warn!("{}", err);
        Err(err)
    }
}
