use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Artifacts staged by the bootstrapper. Used to name the failing piece in
/// fetch errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Runtime,
    JavaFx,
    Jcef,
    Client,
    Manifest,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Runtime => write!(f, "Java runtime"),
            ArtifactKind::JavaFx => write!(f, "JavaFX SDK"),
            ArtifactKind::Jcef => write!(f, "JCEF natives"),
            ArtifactKind::Client => write!(f, "client"),
            ArtifactKind::Manifest => write!(f, "client manifest"),
        }
    }
}

/// Rejected launch options. Raised before anything is spawned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("\"{value}\" is not a valid {key}. Possible values: {}", known.join(", "))]
    UnknownOption {
        key: String,
        value: String,
        known: Vec<String>,
    },

    #[error("unknown option preset \"{name}\". Possible values: {}", known.join(", "))]
    UnknownPreset { name: String, known: Vec<String> },

    #[error("could not find a client named \"{name}\". Possible values: {}", known.join(", "))]
    UnknownClient { name: String, known: Vec<String> },

    #[error("invalid heap size \"{0}\" (expected e.g. 512M or 4G)")]
    InvalidHeapSize(String),

    #[error("conflicting options: {0}")]
    Conflict(String),
}

/// Central error type for the launcher.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Integrity ───────────────────────────────────────
    #[error("SHA-256 mismatch for {path:?}: expected {expected}, got {actual}")]
    Sha256Mismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Unsupported archive format: {0}")]
    UnsupportedArchive(String),

    // ── Bootstrap ───────────────────────────────────────
    #[error("Failed to fetch {artifact}: {source}")]
    Fetch {
        artifact: ArtifactKind,
        source: Box<LauncherError>,
    },

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Installation state is locked by another launcher at {0:?}")]
    StateLocked(PathBuf),

    // ── Launch ──────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to start {program:?}: {source}")]
    Launch {
        program: PathBuf,
        source: std::io::Error,
    },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Wrap any error raised while staging `artifact`.
    pub fn fetch(artifact: ArtifactKind, source: LauncherError) -> Self {
        match source {
            // Validation problems surface as-is even when found mid-bootstrap.
            LauncherError::Validation(_) | LauncherError::Fetch { .. } => source,
            other => LauncherError::Fetch {
                artifact,
                source: Box::new(other),
            },
        }
    }

    /// Process exit code reported by the CLI for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            LauncherError::Validation(_) => 3,
            LauncherError::Fetch { .. } | LauncherError::StateLocked(_) => 4,
            LauncherError::Launch { .. } => 5,
            _ => 1,
        }
    }
}
