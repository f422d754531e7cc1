//! Make sure the downloader binary exists, fetching it over HTTP when missing.
//!
//! The binary is written to `<name>.part` next to the target, marked
//! executable on Unix and renamed into place, so a half-written file is never
//! mistaken for an installed one.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("create binary folder {path}: {source}")]
    CreateFolder {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: curl::Error,
    },
    #[error("GET {url} returned HTTP {code}")]
    Http { url: String, code: u32 },
    #[error("GET {url} returned an empty body")]
    Empty { url: String },
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("provisioning task failed: {0}")]
    Join(String),
}

fn part_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

/// Ensure `binary` exists inside `folder`, downloading it from `url` if absent.
/// Returns the binary path. Blocking; see [`ensure_binary_async`].
pub fn ensure_binary(folder: &Path, binary: &Path, url: &str) -> Result<PathBuf, ProvisionError> {
    fs::create_dir_all(folder).map_err(|source| ProvisionError::CreateFolder {
        path: folder.to_path_buf(),
        source,
    })?;

    if binary.is_file() {
        tracing::debug!("binary already present at {}", binary.display());
        return Ok(binary.to_path_buf());
    }

    tracing::info!("fetching {} to {}", url, binary.display());
    let part = part_path(binary);
    let written = match fetch_to(url, &part) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(&part);
            return Err(e);
        }
    };

    if let Err(e) = install_part(&part, binary) {
        let _ = fs::remove_file(&part);
        return Err(e);
    }
    tracing::info!("installed {} ({} bytes)", binary.display(), written);
    Ok(binary.to_path_buf())
}

/// Mark the fetched file executable and move it over `binary`.
fn install_part(part: &Path, binary: &Path) -> Result<(), ProvisionError> {
    make_executable(part)?;
    fs::rename(part, binary).map_err(|source| ProvisionError::Write {
        path: binary.to_path_buf(),
        source,
    })
}

/// Runs [`ensure_binary`] on the blocking pool.
pub async fn ensure_binary_async(
    folder: PathBuf,
    binary: PathBuf,
    url: String,
) -> Result<PathBuf, ProvisionError> {
    tokio::task::spawn_blocking(move || ensure_binary(&folder, &binary, &url))
        .await
        .map_err(|e| ProvisionError::Join(e.to_string()))?
}

/// Single GET written sequentially to `dest`. Returns bytes written.
fn fetch_to(url: &str, dest: &Path) -> Result<u64, ProvisionError> {
    let curl_err = |source| ProvisionError::Fetch {
        url: url.to_string(),
        source,
    };
    let mut file = File::create(dest).map_err(|source| ProvisionError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    let mut written: u64 = 0;
    let mut write_err: Option<io::Error> = None;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(curl_err)?;
    easy.follow_location(true).map_err(curl_err)?;
    easy.max_redirections(10).map_err(curl_err)?;
    easy.connect_timeout(Duration::from_secs(30)).map_err(curl_err)?;
    easy.low_speed_limit(1024).map_err(curl_err)?;
    easy.low_speed_time(Duration::from_secs(60)).map_err(curl_err)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(curl_err)?;
        let performed = transfer.perform();
        drop(transfer);
        if let Some(source) = write_err.take() {
            return Err(ProvisionError::Write {
                path: dest.to_path_buf(),
                source,
            });
        }
        performed.map_err(curl_err)?;
    }

    let code = easy.response_code().map_err(curl_err)?;
    if !(200..300).contains(&code) {
        return Err(ProvisionError::Http {
            url: url.to_string(),
            code,
        });
    }
    if written == 0 {
        return Err(ProvisionError::Empty {
            url: url.to_string(),
        });
    }
    file.flush().map_err(|source| ProvisionError::Write {
        path: dest.to_path_buf(),
        source,
    })?;
    Ok(written)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), ProvisionError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(|source| {
        ProvisionError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), ProvisionError> {
    Ok(())
}
