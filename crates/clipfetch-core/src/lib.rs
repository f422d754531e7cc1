pub mod config;
pub mod logging;

pub mod downloader;
pub mod fetcher;
pub mod matcher;
pub mod provision;
pub mod report;
pub mod slot;

pub use fetcher::{DownloadOutcome, FetchError, Fetcher};
pub use matcher::UrlMatcher;
pub use report::DownloadReport;
