// ─── Installation State ───
// `state.json` records what the bootstrapper staged and where. It is only
// written after a complete bootstrap, through a temp file and a rename.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::downloader::sha256_file;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::process;

pub const STATE_SCHEMA_VERSION: u32 = 1;
const STATE_LOCK_STALE_SECS: i64 = 10 * 60;
/// How long an unreadable lock is left alone before it counts as abandoned.
const HALF_WRITTEN_LOCK_GRACE: Duration = Duration::from_secs(5);

/// One artifact staged on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StagedArtifact {
    pub version: String,
    pub path: PathBuf,
    pub source_url: String,
    #[serde(default)]
    pub sha256: Option<String>,
    pub installed_at: DateTime<Utc>,
}

impl StagedArtifact {
    pub fn new(
        version: impl Into<String>,
        path: impl Into<PathBuf>,
        source_url: impl Into<String>,
        sha256: Option<String>,
    ) -> Self {
        Self {
            version: version.into(),
            path: path.into(),
            source_url: source_url.into(),
            sha256,
            installed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallationState {
    pub schema_version: u32,
    #[serde(default)]
    pub runtime: Option<StagedArtifact>,
    #[serde(default)]
    pub javafx: Option<StagedArtifact>,
    #[serde(default)]
    pub jcef: Option<StagedArtifact>,
    /// Keyed by client variant name.
    #[serde(default)]
    pub clients: BTreeMap<String, StagedArtifact>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for InstallationState {
    fn default() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION,
            runtime: None,
            javafx: None,
            jcef: None,
            clients: BTreeMap::new(),
            updated_at: None,
        }
    }
}

#[derive(Deserialize)]
struct SchemaProbe {
    schema_version: Option<u32>,
}

impl InstallationState {
    /// Read the state file. A missing, unreadable or foreign-schema file
    /// yields an empty state; staged files on disk are never touched.
    pub fn load(path: &Path) -> LauncherResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No installation state at {:?}", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(LauncherError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let version = match serde_json::from_str::<SchemaProbe>(&raw) {
            Ok(probe) => probe.schema_version,
            Err(e) => {
                warn!("Installation state {:?} is unreadable, starting over: {}", path, e);
                return Ok(Self::default());
            }
        };
        if version != Some(STATE_SCHEMA_VERSION) {
            warn!(
                "Installation state {:?} has schema {:?}, expected {}; starting over",
                path, version, STATE_SCHEMA_VERSION
            );
            return Ok(Self::default());
        }

        let mut state = match serde_json::from_str::<InstallationState>(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!("Installation state {:?} is malformed, starting over: {}", path, e);
                return Ok(Self::default());
            }
        };
        state.drop_missing();
        Ok(state)
    }

    /// Forget entries whose files vanished and client jars that no longer
    /// match their recorded checksum.
    pub fn drop_missing(&mut self) {
        for (label, slot) in [
            ("runtime", &mut self.runtime),
            ("javafx", &mut self.javafx),
            ("jcef", &mut self.jcef),
        ] {
            if let Some(entry) = slot.as_ref() {
                if !entry.path.exists() {
                    warn!("Staged {} at {:?} is gone; it will be fetched again", label, entry.path);
                    *slot = None;
                }
            }
        }

        self.clients.retain(|name, entry| {
            if !entry.path.is_file() {
                warn!("Client {} at {:?} is gone; it will be fetched again", name, entry.path);
                return false;
            }
            if let Some(expected) = entry.sha256.as_deref() {
                match sha256_file(&entry.path) {
                    Ok(actual) if actual.eq_ignore_ascii_case(expected) => {}
                    _ => {
                        warn!("Client {} at {:?} is corrupt; it will be fetched again", name, entry.path);
                        return false;
                    }
                }
            }
            true
        });
    }

    pub fn is_empty(&self) -> bool {
        self.runtime.is_none()
            && self.javafx.is_none()
            && self.jcef.is_none()
            && self.clients.is_empty()
    }

    /// Write the state atomically: temp file in the same directory, then rename.
    pub async fn save(&self, path: &Path) -> LauncherResult<()> {
        let parent = path
            .parent()
            .ok_or_else(|| LauncherError::Other(format!("{:?} has no parent directory", path)))?;
        crate::core::paths::create_dir(parent)?;

        let mut record = self.clone();
        record.schema_version = STATE_SCHEMA_VERSION;
        let json = serde_json::to_vec_pretty(&record)?;

        let temp = parent.join(format!(".state-{}.tmp", Uuid::new_v4()));
        tokio::fs::write(&temp, json)
            .await
            .map_err(|source| LauncherError::Io {
                path: temp.clone(),
                source,
            })?;
        if let Err(source) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(LauncherError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
        debug!("Saved installation state to {:?}", path);
        Ok(())
    }
}

/// Contents of `state.lock`.
#[derive(Debug, Serialize, Deserialize)]
struct LockOwner {
    pid: u32,
    timestamp: i64,
}

/// Exclusive hold on `state.lock`, released on drop.
#[derive(Debug)]
pub struct StateLock {
    path: PathBuf,
}

impl StateLock {
    /// Take the lock, waiting up to `timeout` for another launcher to let go.
    pub async fn acquire(lock_path: &Path, timeout: Duration) -> LauncherResult<Self> {
        let started = Instant::now();
        let mut attempts = 0_u32;
        loop {
            attempts += 1;
            match tokio::fs::OpenOptions::new()
                .create_new(true)
                .write(true)
                .open(lock_path)
                .await
            {
                Ok(mut file) => {
                    let owner = LockOwner {
                        pid: std::process::id(),
                        timestamp: Utc::now().timestamp(),
                    };
                    file.write_all(serde_json::to_string(&owner)?.as_bytes())
                        .await
                        .map_err(|source| LauncherError::Io {
                            path: lock_path.to_path_buf(),
                            source,
                        })?;
                    return Ok(StateLock {
                        path: lock_path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if remove_stale_lock(lock_path).await {
                        continue;
                    }
                    if started.elapsed() >= timeout {
                        return Err(LauncherError::StateLocked(lock_path.to_path_buf()));
                    }
                    if attempts % 20 == 0 {
                        info!("Waiting for another launcher to release {:?}", lock_path);
                    }
                    tokio::time::sleep(Duration::from_millis(250)).await;
                }
                Err(source) => {
                    return Err(LauncherError::Io {
                        path: lock_path.to_path_buf(),
                        source,
                    })
                }
            }
        }
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(source) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove lock {:?}: {}", self.path, source);
        }
    }
}

/// Remove the lock if its owner is gone or it is older than ten minutes. A
/// lock without a readable owner is abandoned once it is a few seconds old.
async fn remove_stale_lock(lock_path: &Path) -> bool {
    let Ok(content) = tokio::fs::read_to_string(lock_path).await else {
        return false;
    };

    let stale = match serde_json::from_str::<LockOwner>(&content) {
        Ok(owner) => {
            let age = Utc::now().timestamp().saturating_sub(owner.timestamp);
            age > STATE_LOCK_STALE_SECS || !process::is_running(owner.pid)
        }
        Err(_) => lock_age(lock_path)
            .await
            .is_some_and(|age| age > HALF_WRITTEN_LOCK_GRACE),
    };

    if stale {
        warn!("Removing stale lock {:?}", lock_path);
        return tokio::fs::remove_file(lock_path).await.is_ok();
    }
    false
}

async fn lock_age(lock_path: &Path) -> Option<Duration> {
    let modified = tokio::fs::metadata(lock_path).await.ok()?.modified().ok()?;
    modified.elapsed().ok()
}
