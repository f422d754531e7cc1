use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::matcher::MatchRule;

/// Temporary file every download writes to (and overwrites).
pub const DEFAULT_TEMP_FILE: &str = "TempYTDLP.mp4";
/// Folder, under the base dir, holding the binary and the temporary file.
pub const DEFAULT_BINARY_FOLDER: &str = ".ytdlp";
/// Container format forced on the downloader.
pub const DEFAULT_OUTPUT_FORMAT: &str = "mp4";

/// Platform-dependent executable name for yt-dlp.
pub fn default_binary_name() -> String {
    if cfg!(target_os = "windows") {
        "yt-dlp.exe".to_string()
    } else {
        "yt-dlp".to_string()
    }
}

/// Release asset the binary is fetched from when missing.
pub fn default_binary_url() -> &'static str {
    if cfg!(target_os = "windows") {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp.exe"
    } else {
        "https://github.com/yt-dlp/yt-dlp/releases/latest/download/yt-dlp"
    }
}

/// Optional `[matcher]` section. When `rules` is set it replaces the built-in set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatcherConfig {
    #[serde(default)]
    pub rules: Option<Vec<MatchRule>>,
}

/// Global configuration loaded from `~/.config/clipfetch/config.toml`.
/// Keys missing from the file take their default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipfetchConfig {
    /// Name of the temporary output file inside `binary_folder`.
    pub temp_file: String,
    /// Executable name of the downloader binary.
    pub binary_name: String,
    /// Folder (relative to `base_dir`) for the binary and the temporary file.
    pub binary_folder: String,
    /// Value passed to the downloader's `-f` flag.
    pub output_format: String,
    /// Base directory; if missing, `$XDG_DATA_HOME/clipfetch` is used.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    /// Where to fetch the binary from when it is missing; if missing, the
    /// yt-dlp latest release asset for this platform.
    #[serde(default)]
    pub binary_url: Option<String>,
    /// Give up waiting for the download slot after this many seconds (None = wait forever).
    #[serde(default)]
    pub acquire_timeout_secs: Option<u64>,
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl Default for ClipfetchConfig {
    fn default() -> Self {
        Self {
            temp_file: DEFAULT_TEMP_FILE.to_string(),
            binary_name: default_binary_name(),
            binary_folder: DEFAULT_BINARY_FOLDER.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            base_dir: None,
            binary_url: None,
            acquire_timeout_secs: None,
            matcher: MatcherConfig::default(),
        }
    }
}

/// Paths derived from the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPaths {
    /// `base_dir / binary_folder`
    pub folder: PathBuf,
    /// `folder / binary_name`
    pub binary: PathBuf,
    /// `folder / temp_file`
    pub temp_file: PathBuf,
}

impl FetchPaths {
    pub fn new(base_dir: impl Into<PathBuf>, cfg: &ClipfetchConfig) -> Self {
        let folder = base_dir.into().join(&cfg.binary_folder);
        Self {
            binary: folder.join(&cfg.binary_name),
            temp_file: folder.join(&cfg.temp_file),
            folder,
        }
    }
}

impl ClipfetchConfig {
    /// Resolve derived paths, falling back to the XDG data dir when `base_dir` is unset.
    pub fn resolve_paths(&self) -> Result<FetchPaths> {
        let base = match &self.base_dir {
            Some(dir) => dir.clone(),
            None => default_base_dir()?,
        };
        Ok(FetchPaths::new(base, self))
    }

    pub fn binary_url(&self) -> &str {
        self.binary_url.as_deref().unwrap_or(default_binary_url())
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_secs.map(Duration::from_secs)
    }
}

pub fn default_base_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("clipfetch")?;
    Ok(xdg_dirs.get_data_home())
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("clipfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClipfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ClipfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ClipfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
