// ─── Downloads ───
// Every artifact lands in `downloads/` through a `.part` file that is only
// renamed once the transfer finished and the checksum matched.

use std::path::{Path, PathBuf};
use std::time::Instant;

use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::source::{ArtifactSource, RemoteArtifact};

/// A verified file in the download cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub sha256: String,
}

/// Download `artifact` into `downloads_dir`, reusing a cached copy whose
/// checksum matches the published one.
pub async fn fetch_to_cache(
    source: &dyn ArtifactSource,
    artifact: &RemoteArtifact,
    downloads_dir: &Path,
) -> LauncherResult<DownloadedFile> {
    crate::core::paths::create_dir(downloads_dir)?;
    let dest = downloads_dir.join(&artifact.file_name);

    if let Some(expected) = artifact.sha256.as_deref() {
        if dest.is_file() {
            let actual = sha256_file(&dest)?;
            if actual.eq_ignore_ascii_case(expected) {
                debug!("Reusing cached download {:?}", dest);
                return Ok(DownloadedFile { path: dest, sha256: actual });
            }
            debug!("Cached {:?} is stale, downloading again", dest);
        }
    }

    let part = part_path(&dest);
    if part.exists() {
        remove_quietly(&part).await;
    }

    let started = Instant::now();
    info!("Downloading {} from {}", artifact.file_name, artifact.url);
    let bytes = match source.download(&artifact.url, &part).await {
        Ok(bytes) => bytes,
        Err(err) => {
            remove_quietly(&part).await;
            return Err(err);
        }
    };

    let actual = sha256_file(&part)?;
    if let Some(expected) = artifact.sha256.as_deref() {
        if !actual.eq_ignore_ascii_case(expected) {
            remove_quietly(&part).await;
            return Err(LauncherError::Sha256Mismatch {
                path: dest,
                expected: expected.to_string(),
                actual,
            });
        }
    }

    tokio::fs::rename(&part, &dest)
        .await
        .map_err(|source| LauncherError::Io {
            path: dest.clone(),
            source,
        })?;
    info!(
        "Downloaded {} ({} bytes) in {:?}",
        artifact.file_name,
        bytes,
        started.elapsed()
    );

    Ok(DownloadedFile { path: dest, sha256: actual })
}

/// Streamed SHA-256 of a file, lowercase hex.
pub fn sha256_file(path: &Path) -> LauncherResult<String> {
    let mut file = std::fs::File::open(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(hex::encode(hasher.finalize()))
}

/// Refuse to start a download when the volume holding `path` is nearly full.
pub fn ensure_min_disk_space(path: &Path, minimum_bytes: u64) -> LauncherResult<()> {
    if minimum_bytes == 0 {
        return Ok(());
    }
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut best_len = 0usize;
    let mut available = None;
    for disk in disks.list() {
        let mount = disk.mount_point();
        if canonical.starts_with(mount) {
            let len = mount.as_os_str().len();
            if len >= best_len {
                best_len = len;
                available = Some(disk.available_space());
            }
        }
    }
    match available {
        Some(bytes) if bytes < minimum_bytes => Err(LauncherError::Other(format!(
            "Not enough free space in {:?}: available={} required={}",
            path, bytes, minimum_bytes
        ))),
        _ => Ok(()),
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove {:?}: {}", path, e);
        }
    }
}
