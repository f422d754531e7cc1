//! User-visible result shape: `{status, data, time}`.

use serde::Serialize;

use crate::fetcher::DownloadOutcome;

/// `status` tells callers which branch they are on; `data` is the output path
/// on success and the error message on failure; `time` (milliseconds) is only
/// present on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadReport {
    pub status: bool,
    pub data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<u64>,
}

impl From<&DownloadOutcome> for DownloadReport {
    fn from(outcome: &DownloadOutcome) -> Self {
        match outcome {
            DownloadOutcome::Completed { path, elapsed } => Self {
                status: true,
                data: path.display().to_string(),
                time: Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
            },
            DownloadOutcome::Failed(err) => Self {
                status: false,
                data: err.to_string(),
                time: None,
            },
        }
    }
}

impl DownloadReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
