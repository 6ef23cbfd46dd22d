use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

pub const APP_DIR_NAME: &str = "wurm-launcher";

const STATE_FILE: &str = "state.json";
const STATE_LOCK_FILE: &str = "state.lock";
const SETTINGS_FILE: &str = "config.json";

/// On-disk layout of the launcher. Resolved once at startup and passed
/// explicitly to every component.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    data_dir: PathBuf,
    config_dir: PathBuf,
}

impl LauncherPaths {
    /// Build a layout rooted at explicit directories (tests, `--data-dir`).
    pub fn new(data_dir: PathBuf, config_dir: PathBuf) -> Self {
        Self {
            data_dir,
            config_dir,
        }
    }

    /// XDG (or platform equivalent) data and config directories.
    pub fn resolve(data_dir_override: Option<PathBuf>) -> LauncherResult<Self> {
        let data_dir = match data_dir_override {
            Some(dir) => dir,
            None => dirs::data_dir()
                .ok_or_else(|| {
                    LauncherError::Other("Could not determine the user data directory".into())
                })?
                .join(APP_DIR_NAME),
        };
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| data_dir.clone())
            .join(APP_DIR_NAME);

        Ok(Self::new(data_dir, config_dir))
    }

    /// Create every directory of the layout.
    pub fn ensure_layout(&self) -> LauncherResult<()> {
        for dir in [
            self.data_dir.clone(),
            self.config_dir.clone(),
            self.downloads_dir(),
            self.work_dir(),
            self.runtime_dir(),
            self.clients_dir(),
        ] {
            if !dir.exists() {
                tracing::debug!("Creating {:?}", dir);
            }
            create_dir(&dir)?;
        }
        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.data_dir.join("downloads")
    }

    /// Scratch space for archive extraction.
    pub fn work_dir(&self) -> PathBuf {
        self.data_dir.join("work")
    }

    /// Extracted runtimes: JDK, JavaFX SDK, JCEF natives.
    pub fn runtime_dir(&self) -> PathBuf {
        self.data_dir.join("runtime")
    }

    pub fn clients_dir(&self) -> PathBuf {
        self.data_dir.join("clients")
    }

    /// Directory holding one client variant. Every variant gets its own.
    pub fn client_variant_dir(&self, variant: &str) -> PathBuf {
        self.clients_dir().join(variant_slug(variant))
    }

    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    pub fn state_lock_file(&self) -> PathBuf {
        self.data_dir.join(STATE_LOCK_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join(SETTINGS_FILE)
    }
}

/// Filesystem-safe directory name for a client variant ("Live", "Test Client").
///
/// Anything outside `[A-Za-z0-9._-]` is percent-encoded byte by byte, so two
/// different names never share a directory.
pub fn variant_slug(variant: &str) -> String {
    if variant.is_empty() {
        return "%".to_string();
    }

    let dots_only = variant.chars().all(|ch| ch == '.');
    let mut slug = String::with_capacity(variant.len());
    for byte in variant.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_')
            || (byte == b'.' && !dots_only);
        if keep {
            slug.push(byte as char);
        } else {
            slug.push_str(&format!("%{:02X}", byte));
        }
    }
    slug
}

pub(crate) fn create_dir(path: &Path) -> LauncherResult<()> {
    std::fs::create_dir_all(path).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}
