// ─── Artifact Source ───
// Where the bootstrapper resolves and downloads its artifacts from.
// `HttpSource` talks to the Wurm manifest, Adoptium and Gluon; tests plug in
// their own implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::manifest::ClientManifest;
use crate::core::platform::Platform;

const REQUEST_RETRIES: u32 = 3;

/// A resolved, downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
    pub url: String,
    pub file_name: String,
    /// Release name or version used for logging and the installation state.
    pub version: String,
    /// Published SHA-256 of the file, when the upstream provides one.
    pub sha256: Option<String>,
}

impl RemoteArtifact {
    /// Artifact whose name is taken from the last URL segment.
    pub fn from_url(url: &str, fallback_name: &str) -> Self {
        let file_name = file_name_from_url(url).unwrap_or_else(|| fallback_name.to_string());
        Self {
            url: url.to_string(),
            version: file_name.clone(),
            file_name,
            sha256: None,
        }
    }
}

#[async_trait]
pub trait ArtifactSource: Send + Sync {
    /// Fetch the Wurm client manifest.
    async fn client_manifest(&self) -> LauncherResult<ClientManifest>;

    /// Newest GA JDK build for `major` on `platform`.
    async fn runtime_release(&self, major: u32, platform: &Platform)
        -> LauncherResult<RemoteArtifact>;

    /// Stream `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64>;
}

/// OpenJFX SDK archive for `version`; the Gluon download path is predictable.
pub fn javafx_artifact(base_url: &str, version: &str, platform: &Platform) -> RemoteArtifact {
    let file_name = format!("openjfx-{}_{}_bin-sdk.zip", version, platform.javafx_id());
    RemoteArtifact {
        url: format!("{}/{}/{}", base_url.trim_end_matches('/'), version, file_name),
        file_name,
        version: version.to_string(),
        sha256: None,
    }
}

pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let name = parsed.path_segments()?.filter(|s| !s.is_empty()).last()?;
    if name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

// ── Adoptium API payload ────────────────────────────────

#[derive(Debug, Deserialize)]
struct AdoptiumRelease {
    release_name: String,
    binaries: Vec<AdoptiumBinary>,
}

#[derive(Debug, Deserialize)]
struct AdoptiumBinary {
    package: Option<AdoptiumPackage>,
}

#[derive(Debug, Deserialize)]
struct AdoptiumPackage {
    checksum: String,
    link: String,
    name: String,
}

fn pick_runtime(releases: Vec<AdoptiumRelease>) -> Option<RemoteArtifact> {
    releases.into_iter().find_map(|release| {
        let package = release.binaries.into_iter().find_map(|b| b.package)?;
        Some(RemoteArtifact {
            url: package.link,
            file_name: package.name,
            version: release.release_name,
            sha256: Some(package.checksum.to_ascii_lowercase()),
        })
    })
}

/// Production source backed by HTTPS.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    manifest_url: String,
    adoptium_api: String,
}

impl HttpSource {
    pub fn new(client: Client, manifest_url: &str, adoptium_api: &str) -> Self {
        Self {
            client,
            manifest_url: manifest_url.to_string(),
            adoptium_api: adoptium_api.trim_end_matches('/').to_string(),
        }
    }

    async fn get_with_retry(&self, url: &str) -> LauncherResult<reqwest::Response> {
        let mut last_error: Option<LauncherError> = None;
        for attempt in 0..=REQUEST_RETRIES {
            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(LauncherError::DownloadFailed {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!("Request to {} failed (attempt {}): {}", url, attempt + 1, err);
                    last_error = Some(err.into());
                    if attempt < REQUEST_RETRIES {
                        let backoff_ms = 2_u64.pow(attempt + 1) * 250;
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    }
                }
            }
        }
        Err(last_error.unwrap_or_else(|| LauncherError::Other(format!("failed request to {url}"))))
    }
}

#[async_trait]
impl ArtifactSource for HttpSource {
    #[instrument(skip(self))]
    async fn client_manifest(&self) -> LauncherResult<ClientManifest> {
        debug!("Requesting manifest from {}", self.manifest_url);
        let manifest: ClientManifest = self.get_with_retry(&self.manifest_url).await?.json().await?;
        debug!(
            "Manifest lists {} clients and {} dependencies",
            manifest.clients.len(),
            manifest.dependencies.len()
        );
        Ok(manifest)
    }

    #[instrument(skip(self))]
    async fn runtime_release(
        &self,
        major: u32,
        platform: &Platform,
    ) -> LauncherResult<RemoteArtifact> {
        let api_url = format!(
            "{}/{}/ga?architecture={}&os={}&project=jdk&image_type=jdk&heap_size=normal&sort_method=DATE",
            self.adoptium_api,
            major,
            platform.adoptium_arch(),
            platform.adoptium_os()
        );

        let releases: Vec<AdoptiumRelease> = self.get_with_retry(&api_url).await?.json().await?;
        let artifact = pick_runtime(releases).ok_or_else(|| {
            LauncherError::Other(format!(
                "No runtime release found for Java {} ({}-{})",
                major,
                platform.adoptium_os(),
                platform.adoptium_arch()
            ))
        })?;

        info!("Newest available runtime is {}", artifact.file_name);
        Ok(artifact)
    }

    async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        let response = self.get_with_retry(url).await?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| LauncherError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        let mut stream = response.bytes_stream();
        let mut written = 0_u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|source| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source,
                })?;
            written = written.saturating_add(chunk.len() as u64);
        }
        file.flush().await.map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        Ok(written)
    }
}
