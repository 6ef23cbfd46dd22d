// ─── Archive staging ───
// Archives are unpacked into `work/<stem>`, flattened when they wrap a single
// top-level directory, then renamed into `runtime/<stem>`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn detect(path: &Path) -> LauncherResult<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.ends_with(".zip") {
            Ok(ArchiveFormat::Zip)
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Ok(ArchiveFormat::TarGz)
        } else {
            Err(LauncherError::UnsupportedArchive(name))
        }
    }
}

/// Archive file name without its archive extension.
pub fn archive_stem(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    for ext in [".tar.gz", ".tgz", ".zip"] {
        if lower.ends_with(ext) && lower.len() > ext.len() {
            return file_name[..file_name.len() - ext.len()].to_string();
        }
    }
    file_name.to_string()
}

/// Unpack `archive` and move the result to `runtime_dir/<stem>`.
/// Returns the staged directory.
pub async fn stage_archive(
    archive: &Path,
    work_dir: &Path,
    runtime_dir: &Path,
) -> LauncherResult<PathBuf> {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| LauncherError::UnsupportedArchive(archive.display().to_string()))?;
    let stem = archive_stem(&file_name);
    let scratch = work_dir.join(&stem);
    let target = runtime_dir.join(&stem);

    let started = Instant::now();
    let archive_path = archive.to_path_buf();
    let extract_into = scratch.clone();
    let root = tokio::task::spawn_blocking(move || -> LauncherResult<PathBuf> {
        extract_archive(&archive_path, &extract_into)?;
        single_root(&extract_into)
    })
    .await
    .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))??;
    debug!("Extracted {} in {:?}", file_name, started.elapsed());

    crate::core::paths::create_dir(runtime_dir)?;
    replace_dir(&root, &target).await?;

    if scratch.exists() {
        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            warn!("Failed to clean {:?}: {}", scratch, e);
        }
    }

    info!("Staged {} at {:?}", file_name, target);
    Ok(target)
}

/// Extract `archive` into a fresh `dest` directory.
pub fn extract_archive(archive: &Path, dest: &Path) -> LauncherResult<()> {
    let format = ArchiveFormat::detect(archive)?;

    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    }
    crate::core::paths::create_dir(dest)?;

    let file = fs::File::open(archive).map_err(|source| LauncherError::Io {
        path: archive.to_path_buf(),
        source,
    })?;

    match format {
        ArchiveFormat::Zip => extract_zip(file, dest),
        ArchiveFormat::TarGz => {
            let mut tar = tar::Archive::new(GzDecoder::new(file));
            tar.set_preserve_permissions(true);
            tar.unpack(dest).map_err(|source| LauncherError::Io {
                path: archive.to_path_buf(),
                source,
            })
        }
    }
}

fn extract_zip(file: fs::File, dest: &Path) -> LauncherResult<()> {
    let mut archive = zip::ZipArchive::new(file)?;

    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;
        let Some(rel_path) = zipped.enclosed_name() else {
            warn!("Skipping unsafe zip entry {}", zipped.name());
            continue;
        };
        let out_path = dest.join(rel_path);

        if zipped.is_dir() {
            crate::core::paths::create_dir(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            crate::core::paths::create_dir(parent)?;
        }
        let mut out = fs::File::create(&out_path).map_err(|source| LauncherError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| LauncherError::Io {
            path: out_path.clone(),
            source,
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = zipped.unix_mode() {
                fs::set_permissions(&out_path, fs::Permissions::from_mode(mode & 0o7777))
                    .map_err(|source| LauncherError::Io {
                        path: out_path.clone(),
                        source,
                    })?;
            }
        }
    }

    Ok(())
}

/// The directory an archive actually wraps: its only top-level directory, or
/// the extraction directory itself.
fn single_root(dir: &Path) -> LauncherResult<PathBuf> {
    let entries = fs::read_dir(dir)
        .map_err(|source| LauncherError::Io {
            path: dir.to_path_buf(),
            source,
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LauncherError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

    if let [only] = entries.as_slice() {
        let path = only.path();
        if path.is_dir() {
            return Ok(path);
        }
    }
    Ok(dir.to_path_buf())
}

/// Rename `source` to `target`, keeping the previous `target` as a backup
/// until the swap succeeded.
async fn replace_dir(source: &Path, target: &Path) -> LauncherResult<()> {
    let mut backup_name = target.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    backup_name.push(".backup");
    let backup = target.with_file_name(backup_name);
    if backup.exists() {
        let _ = tokio::fs::remove_dir_all(&backup).await;
    }
    if target.exists() {
        tokio::fs::rename(target, &backup)
            .await
            .map_err(|source| LauncherError::Io {
                path: backup.clone(),
                source,
            })?;
    }

    if let Err(err) = tokio::fs::rename(source, target).await {
        if backup.exists() {
            let _ = tokio::fs::rename(&backup, target).await;
        }
        return Err(LauncherError::Io {
            path: target.to_path_buf(),
            source: err,
        });
    }

    if backup.exists() {
        let _ = tokio::fs::remove_dir_all(&backup).await;
    }
    Ok(())
}

/// Depth-first search for a file called `name` below `root`.
pub fn find_file(root: &Path, name: &str) -> Option<PathBuf> {
    let direct = root.join(name);
    if direct.is_file() {
        return Some(direct);
    }
    let entries = fs::read_dir(root).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file(&path, name) {
                return Some(found);
            }
        }
    }
    None
}

/// chmod 755 on unix; no-op elsewhere.
pub fn make_executable(path: &Path) -> LauncherResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)
            .map_err(|source| LauncherError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}
