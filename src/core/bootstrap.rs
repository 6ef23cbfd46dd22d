// ─── Environment Bootstrapper ───
// Makes sure the JCEF natives, the Java runtime, the JavaFX SDK and the
// requested client variant are staged under the data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::core::archive::{archive_stem, find_file, make_executable, stage_archive};
use crate::core::downloader::{ensure_min_disk_space, fetch_to_cache};
use crate::core::error::{ArtifactKind, LauncherError, LauncherResult};
use crate::core::manifest::{ClientManifest, JCEF_DEPENDENCY_NAME};
use crate::core::paths::{create_dir, LauncherPaths};
use crate::core::platform::Platform;
use crate::core::settings::LauncherSettings;
use crate::core::source::{javafx_artifact, ArtifactSource, RemoteArtifact};
use crate::core::state::{InstallationState, StagedArtifact, StateLock};

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_FREE_DISK_BYTES: u64 = 512 * 1024 * 1024;
const JCEF_HELPER: &str = "jcef_helper";

/// What the caller wants staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapRequest {
    pub client: String,
    /// Resolve runtime, JavaFX and JCEF again even when they are staged.
    pub update_deps: bool,
}

/// Everything the launch composer needs, all paths verified to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyEnvironment {
    pub root: PathBuf,
    pub java_home: PathBuf,
    pub java_bin: PathBuf,
    pub javafx_lib: PathBuf,
    pub jcef_dir: PathBuf,
    pub client_jar: PathBuf,
    pub client: String,
}

pub struct Bootstrapper {
    paths: LauncherPaths,
    settings: LauncherSettings,
    platform: Platform,
    source: Arc<dyn ArtifactSource>,
    lock_timeout: Duration,
    min_free_bytes: u64,
}

impl Bootstrapper {
    pub fn new(
        paths: LauncherPaths,
        settings: LauncherSettings,
        platform: Platform,
        source: Arc<dyn ArtifactSource>,
    ) -> Self {
        Self {
            paths,
            settings,
            platform,
            source,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            min_free_bytes: MIN_FREE_DISK_BYTES,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Minimum free space required before a download starts (0 disables the check).
    pub fn with_min_free_space(mut self, bytes: u64) -> Self {
        self.min_free_bytes = bytes;
        self
    }

    /// Stage every missing artifact, then record them in `state.json`.
    /// Nothing is recorded unless all of them succeed.
    #[instrument(skip(self, request), fields(client = %request.client, update_deps = request.update_deps))]
    pub async fn ensure_ready(&self, request: &BootstrapRequest) -> LauncherResult<ReadyEnvironment> {
        self.paths.ensure_layout()?;
        let _lock = StateLock::acquire(&self.paths.state_lock_file(), self.lock_timeout).await?;
        let mut state = InstallationState::load(&self.paths.state_file())?;
        let mut manifest = None;

        let jcef = self
            .ensure_jcef(&state, request, &mut manifest)
            .await
            .map_err(|e| LauncherError::fetch(ArtifactKind::Jcef, e))?;
        let runtime = self
            .ensure_runtime(&state, request)
            .await
            .map_err(|e| LauncherError::fetch(ArtifactKind::Runtime, e))?;
        let javafx = self
            .ensure_javafx(&state, request)
            .await
            .map_err(|e| LauncherError::fetch(ArtifactKind::JavaFx, e))?;
        let client = self
            .ensure_client(&state, request, &mut manifest)
            .await
            .map_err(|e| LauncherError::fetch(ArtifactKind::Client, e))?;

        let environment = ReadyEnvironment {
            root: self.paths.data_dir().to_path_buf(),
            java_bin: java_bin_in(&runtime.path, &self.platform),
            java_home: runtime.path.clone(),
            javafx_lib: javafx.path.join("lib"),
            jcef_dir: jcef.path.clone(),
            client_jar: client.path.clone(),
            client: request.client.clone(),
        };

        state.jcef = Some(jcef);
        state.runtime = Some(runtime);
        state.javafx = Some(javafx);
        state.clients.insert(request.client.clone(), client);
        state.updated_at = Some(Utc::now());
        state.save(&self.paths.state_file()).await?;

        info!("Environment ready for client {}", request.client);
        Ok(environment)
    }

    async fn manifest<'a>(
        &self,
        cache: &'a mut Option<ClientManifest>,
    ) -> LauncherResult<&'a ClientManifest> {
        if cache.is_none() {
            let fetched = self
                .source
                .client_manifest()
                .await
                .map_err(|e| LauncherError::fetch(ArtifactKind::Manifest, e))?;
            *cache = Some(fetched);
        }
        cache
            .as_ref()
            .ok_or_else(|| LauncherError::Other("client manifest unavailable".into()))
    }

    async fn ensure_jcef(
        &self,
        state: &InstallationState,
        request: &BootstrapRequest,
        manifest: &mut Option<ClientManifest>,
    ) -> LauncherResult<StagedArtifact> {
        if let Some(staged) = state.jcef.as_ref() {
            if !request.update_deps && staged.path.is_dir() {
                debug!("JCEF natives already staged at {:?}", staged.path);
                return Ok(staged.clone());
            }
        }

        let platform_id = self.platform.wurm_id()?;
        let manifest = self.manifest(manifest).await?;
        let dependency = manifest.jcef_for(&platform_id).ok_or_else(|| {
            LauncherError::Other(format!(
                "the manifest lists no {} for {}",
                JCEF_DEPENDENCY_NAME, platform_id
            ))
        })?;

        let artifact = RemoteArtifact::from_url(&dependency.url, "jcef-natives.zip");
        let dir = self
            .stage_archive_artifact(&artifact, |dir| dir.is_dir())
            .await?;
        if let Some(helper) = find_file(&dir, JCEF_HELPER) {
            make_executable(&helper)?;
        }

        Ok(StagedArtifact::new(
            artifact.version,
            dir,
            artifact.url,
            artifact.sha256,
        ))
    }

    async fn ensure_runtime(
        &self,
        state: &InstallationState,
        request: &BootstrapRequest,
    ) -> LauncherResult<StagedArtifact> {
        let major = self.settings.jdk_major;
        if let Some(staged) = state.runtime.as_ref() {
            if !request.update_deps
                && runtime_matches_major(&staged.version, major)
                && java_bin_in(&staged.path, &self.platform).is_file()
            {
                debug!("Java runtime {} already staged", staged.version);
                return Ok(staged.clone());
            }
        }

        let artifact = self.source.runtime_release(major, &self.platform).await?;
        let platform = self.platform;
        let dir = self
            .stage_archive_artifact(&artifact, move |dir| java_bin_in(dir, &platform).is_file())
            .await?;
        make_executable(&java_bin_in(&dir, &self.platform))?;

        Ok(StagedArtifact::new(
            artifact.version,
            dir,
            artifact.url,
            artifact.sha256,
        ))
    }

    async fn ensure_javafx(
        &self,
        state: &InstallationState,
        request: &BootstrapRequest,
    ) -> LauncherResult<StagedArtifact> {
        let version = &self.settings.javafx_version;
        if let Some(staged) = state.javafx.as_ref() {
            if !request.update_deps
                && &staged.version == version
                && staged.path.join("lib").is_dir()
            {
                debug!("JavaFX {} already staged", staged.version);
                return Ok(staged.clone());
            }
        }

        let artifact = javafx_artifact(&self.settings.javafx_base_url, version, &self.platform);
        let dir = self
            .stage_archive_artifact(&artifact, |dir| dir.join("lib").is_dir())
            .await?;

        Ok(StagedArtifact::new(
            artifact.version,
            dir,
            artifact.url,
            artifact.sha256,
        ))
    }

    async fn ensure_client(
        &self,
        state: &InstallationState,
        request: &BootstrapRequest,
        manifest: &mut Option<ClientManifest>,
    ) -> LauncherResult<StagedArtifact> {
        let staged = state.clients.get(&request.client);

        let manifest = match self.manifest(manifest).await {
            Ok(manifest) => manifest,
            Err(err) => match staged {
                Some(staged) => {
                    warn!(
                        "Could not check for client updates ({}); using staged {:?}",
                        err, staged.path
                    );
                    return Ok(staged.clone());
                }
                None => return Err(err),
            },
        };
        let entry = manifest.find_client(&request.client)?;

        if let Some(staged) = staged {
            if staged.source_url == entry.url && staged.path.is_file() {
                debug!("Client {} is up to date", request.client);
                return Ok(staged.clone());
            }
            info!("Client {} has an update", request.client);
        }

        let artifact = RemoteArtifact::from_url(&entry.url, "client.jar");
        let variant_dir = self.paths.client_variant_dir(&request.client);
        create_dir(&variant_dir)?;
        ensure_min_disk_space(self.paths.data_dir(), self.min_free_bytes)?;
        let downloaded = fetch_to_cache(self.source.as_ref(), &artifact, &variant_dir).await?;

        Ok(StagedArtifact::new(
            artifact.version,
            downloaded.path,
            artifact.url,
            Some(downloaded.sha256),
        ))
    }

    /// Download and unpack an archive into `runtime/<stem>`. A target that
    /// already exists and passes `validate` is adopted as-is.
    async fn stage_archive_artifact<F>(
        &self,
        artifact: &RemoteArtifact,
        validate: F,
    ) -> LauncherResult<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        let target = self.paths.runtime_dir().join(archive_stem(&artifact.file_name));
        if validate(&target) {
            info!("Adopting {:?} already present on disk", target);
            return Ok(target);
        }

        ensure_min_disk_space(self.paths.data_dir(), self.min_free_bytes)?;
        let downloaded =
            fetch_to_cache(self.source.as_ref(), artifact, &self.paths.downloads_dir()).await?;
        let dir = stage_archive(
            &downloaded.path,
            &self.paths.work_dir(),
            &self.paths.runtime_dir(),
        )
        .await?;

        if !validate(&dir) {
            return Err(LauncherError::Other(format!(
                "{} unpacked to {:?} but its contents are not usable",
                artifact.file_name, dir
            )));
        }
        Ok(dir)
    }
}

fn java_bin_in(java_home: &Path, platform: &Platform) -> PathBuf {
    java_home.join("bin").join(platform.java_exe())
}

/// Adoptium release names look like `jdk-17.0.13+11` or `jdk8u432-b06`.
fn runtime_matches_major(release: &str, major: u32) -> bool {
    let rest = release.strip_prefix("jdk").unwrap_or(release);
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().map(|found| found == major).unwrap_or(false)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::archive::tests::zip_bytes;
    use crate::core::manifest::{ClientEntry, DependencyEntry};
    use crate::core::platform::{Arch, Os};
    use async_trait::async_trait;
    use sha2::{Digest, Sha256};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) const JCEF_URL: &str = "https://cdn.example.com/deps/jcef-linux64.zip";
    pub(crate) const LIVE_URL: &str = "https://cdn.example.com/live/client.jar";
    pub(crate) const TEST_URL: &str = "https://cdn.example.com/test/client.jar";
    const RUNTIME_URL: &str = "https://api.example.com/jdk/OpenJDK17U-jdk_x64_linux.zip";
    const FX_BASE: &str = "https://fx.example.com/openjfx";

    /// Serves in-memory archives and counts every download.
    pub(crate) struct StubSource {
        files: Mutex<HashMap<String, Vec<u8>>>,
        clients: Mutex<Vec<ClientEntry>>,
        runtime_sha256: Mutex<Option<String>>,
        pub(crate) downloads: AtomicUsize,
        pub(crate) offline: AtomicBool,
        failing_url: Mutex<Option<String>>,
    }

    impl StubSource {
        pub(crate) fn new() -> Self {
            let runtime = zip_bytes(&[
                ("jdk-17.0.13+11/bin/java", b"#!/bin/sh\n"),
                ("jdk-17.0.13+11/lib/modules", b"modules"),
            ]);
            let runtime_sha = hex::encode(Sha256::digest(&runtime));

            let mut files = HashMap::new();
            files.insert(RUNTIME_URL.to_string(), runtime);
            files.insert(
                javafx_artifact(FX_BASE, "17.0.13", &platform()).url,
                zip_bytes(&[("javafx-sdk-17.0.13/lib/javafx.web.jar", b"web")]),
            );
            files.insert(
                JCEF_URL.to_string(),
                zip_bytes(&[("jcef_helper", b"#!"), ("libcef.so", b"cef")]),
            );
            files.insert(LIVE_URL.to_string(), b"live client v1".to_vec());
            files.insert(TEST_URL.to_string(), b"test client v1".to_vec());

            Self {
                files: Mutex::new(files),
                clients: Mutex::new(vec![
                    ClientEntry {
                        name: "Live".into(),
                        url: LIVE_URL.into(),
                    },
                    ClientEntry {
                        name: "Test".into(),
                        url: TEST_URL.into(),
                    },
                ]),
                runtime_sha256: Mutex::new(Some(runtime_sha)),
                downloads: AtomicUsize::new(0),
                offline: AtomicBool::new(false),
                failing_url: Mutex::new(None),
            }
        }

        pub(crate) fn fail_on(&self, url: &str) {
            *self.failing_url.lock().unwrap() = Some(url.to_string());
        }

        fn publish_client(&self, name: &str, url: &str, body: &[u8]) {
            self.files
                .lock()
                .unwrap()
                .insert(url.to_string(), body.to_vec());
            let mut clients = self.clients.lock().unwrap();
            clients.retain(|c| c.name != name);
            clients.push(ClientEntry {
                name: name.into(),
                url: url.into(),
            });
        }

        pub(crate) fn download_count(&self) -> usize {
            self.downloads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArtifactSource for StubSource {
        async fn client_manifest(&self) -> LauncherResult<ClientManifest> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(LauncherError::Other("network unreachable".into()));
            }
            Ok(ClientManifest {
                clients: self.clients.lock().unwrap().clone(),
                dependencies: vec![DependencyEntry {
                    name: JCEF_DEPENDENCY_NAME.into(),
                    platform: "linux64".into(),
                    url: JCEF_URL.into(),
                }],
            })
        }

        async fn runtime_release(
            &self,
            major: u32,
            _platform: &Platform,
        ) -> LauncherResult<RemoteArtifact> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(LauncherError::Other("network unreachable".into()));
            }
            assert_eq!(major, 17);
            Ok(RemoteArtifact {
                url: RUNTIME_URL.into(),
                file_name: "OpenJDK17U-jdk_x64_linux.zip".into(),
                version: "jdk-17.0.13+11".into(),
                sha256: self.runtime_sha256.lock().unwrap().clone(),
            })
        }

        async fn download(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(LauncherError::Other("network unreachable".into()));
            }
            if self.failing_url.lock().unwrap().as_deref() == Some(url) {
                return Err(LauncherError::DownloadFailed {
                    url: url.to_string(),
                    status: 500,
                });
            }
            self.downloads.fetch_add(1, Ordering::SeqCst);
            let body = self
                .files
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| LauncherError::DownloadFailed {
                    url: url.to_string(),
                    status: 404,
                })?;
            std::fs::write(dest, &body)?;
            Ok(body.len() as u64)
        }
    }

    pub(crate) fn platform() -> Platform {
        Platform::new(Os::Linux, Arch::X64)
    }

    pub(crate) fn test_paths() -> LauncherPaths {
        let root = std::env::temp_dir().join(format!("wurm-bootstrap-{}", uuid::Uuid::new_v4()));
        LauncherPaths::new(root.join("data"), root.join("config"))
    }

    pub(crate) fn test_settings() -> LauncherSettings {
        LauncherSettings {
            javafx_base_url: FX_BASE.into(),
            ..LauncherSettings::default()
        }
    }

    pub(crate) fn bootstrapper(paths: &LauncherPaths, source: Arc<StubSource>) -> Bootstrapper {
        Bootstrapper::new(paths.clone(), test_settings(), platform(), source)
            .with_lock_timeout(Duration::from_secs(2))
            .with_min_free_space(0)
    }

    pub(crate) fn request(client: &str) -> BootstrapRequest {
        BootstrapRequest {
            client: client.into(),
            update_deps: false,
        }
    }

    fn cleanup(paths: &LauncherPaths) {
        if let Some(root) = paths.data_dir().parent() {
            let _ = std::fs::remove_dir_all(root);
        }
    }

    #[tokio::test]
    async fn fresh_bootstrap_stages_everything() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let env = bootstrapper(&paths, source.clone())
            .ensure_ready(&request("Live"))
            .await
            .unwrap();

        assert_eq!(env.root, paths.data_dir());
        assert!(env.java_bin.is_file());
        assert_eq!(env.java_bin, env.java_home.join("bin").join("java"));
        assert!(env.javafx_lib.join("javafx.web.jar").is_file());
        assert!(env.jcef_dir.join("libcef.so").is_file());
        assert_eq!(std::fs::read(&env.client_jar).unwrap(), b"live client v1");
        assert!(env.client_jar.starts_with(paths.client_variant_dir("Live")));
        assert_eq!(source.download_count(), 4);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o111;
            assert_eq!(mode(&env.java_bin), 0o111);
            assert_eq!(mode(&env.jcef_dir.join(JCEF_HELPER)), 0o111);
        }

        let state = InstallationState::load(&paths.state_file()).unwrap();
        assert_eq!(state.runtime.as_ref().unwrap().path, env.java_home);
        assert_eq!(state.runtime.as_ref().unwrap().version, "jdk-17.0.13+11");
        assert_eq!(state.javafx.as_ref().unwrap().version, "17.0.13");
        assert_eq!(state.jcef.as_ref().unwrap().path, env.jcef_dir);
        assert_eq!(state.clients["Live"].path, env.client_jar);
        assert!(state.clients["Live"].sha256.is_some());
        assert!(state.updated_at.is_some());
        assert!(!paths.state_lock_file().exists());

        cleanup(&paths);
    }

    #[tokio::test]
    async fn second_run_downloads_nothing() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let bootstrapper = bootstrapper(&paths, source.clone());

        let first = bootstrapper.ensure_ready(&request("Live")).await.unwrap();
        assert_eq!(source.download_count(), 4);
        let second = bootstrapper.ensure_ready(&request("Live")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.download_count(), 4);

        cleanup(&paths);
    }

    #[tokio::test]
    async fn switching_variants_leaves_the_other_untouched() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let bootstrapper = bootstrapper(&paths, source.clone());

        let live = bootstrapper.ensure_ready(&request("Live")).await.unwrap();
        let live_entry = InstallationState::load(&paths.state_file()).unwrap().clients["Live"].clone();
        let live_bytes = std::fs::read(&live.client_jar).unwrap();

        let test = bootstrapper.ensure_ready(&request("Test")).await.unwrap();
        assert_ne!(live.client_jar, test.client_jar);
        assert_eq!(std::fs::read(&test.client_jar).unwrap(), b"test client v1");
        // Only the Test jar was fetched; shared dependencies were reused.
        assert_eq!(source.download_count(), 5);

        let state = InstallationState::load(&paths.state_file()).unwrap();
        assert_eq!(state.clients["Live"], live_entry);
        assert_eq!(std::fs::read(&live.client_jar).unwrap(), live_bytes);
        assert!(state.clients.contains_key("Test"));

        cleanup(&paths);
    }

    #[tokio::test]
    async fn failed_fetch_records_nothing() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        source.fail_on(LIVE_URL);

        let err = bootstrapper(&paths, source.clone())
            .ensure_ready(&request("Live"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LauncherError::Fetch {
                artifact: ArtifactKind::Client,
                ..
            }
        ));
        assert_eq!(err.exit_code(), 4);
        assert!(!paths.state_file().exists());
        assert!(!paths.client_variant_dir("Live").join("client.jar").exists());
        assert!(!paths.client_variant_dir("Live").join("client.jar.part").exists());

        cleanup(&paths);
    }

    #[tokio::test]
    async fn failed_update_keeps_previous_state() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let bootstrapper = bootstrapper(&paths, source.clone());
        bootstrapper.ensure_ready(&request("Live")).await.unwrap();
        let before = std::fs::read(paths.state_file()).unwrap();

        *source.runtime_sha256.lock().unwrap() = Some("00".repeat(32));
        // Force a fresh download of the runtime by removing the staged copies.
        let state = InstallationState::load(&paths.state_file()).unwrap();
        std::fs::remove_dir_all(&state.runtime.as_ref().unwrap().path).unwrap();

        let err = bootstrapper
            .ensure_ready(&BootstrapRequest {
                client: "Live".into(),
                update_deps: true,
            })
            .await
            .unwrap_err();
        match err {
            LauncherError::Fetch { artifact, source } => {
                assert_eq!(artifact, ArtifactKind::Runtime);
                assert!(matches!(*source, LauncherError::Sha256Mismatch { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read(paths.state_file()).unwrap(), before);

        cleanup(&paths);
    }

    #[tokio::test]
    async fn unknown_variant_is_a_validation_error() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let err = bootstrapper(&paths, source)
            .ensure_ready(&request("Beta"))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("Live, Test"));
        assert!(!paths.state_file().exists());

        cleanup(&paths);
    }

    #[tokio::test]
    async fn offline_run_uses_staged_client() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let bootstrapper = bootstrapper(&paths, source.clone());
        let online = bootstrapper.ensure_ready(&request("Live")).await.unwrap();

        source.offline.store(true, Ordering::SeqCst);
        let offline = bootstrapper.ensure_ready(&request("Live")).await.unwrap();
        assert_eq!(online, offline);

        let err = bootstrapper.ensure_ready(&request("Test")).await.unwrap_err();
        assert!(matches!(
            err,
            LauncherError::Fetch {
                artifact: ArtifactKind::Manifest,
                ..
            }
        ));

        cleanup(&paths);
    }

    #[tokio::test]
    async fn look_alike_variant_names_keep_separate_jars() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        source.publish_client("Test Client", "https://cdn.example.com/a/client.jar", b"AAAA");
        source.publish_client("Test_Client", "https://cdn.example.com/b/client.jar", b"BBBB");
        let bootstrapper = bootstrapper(&paths, source.clone());

        let spaced = bootstrapper.ensure_ready(&request("Test Client")).await.unwrap();
        let underscored = bootstrapper.ensure_ready(&request("Test_Client")).await.unwrap();

        assert_ne!(spaced.client_jar, underscored.client_jar);
        assert_eq!(std::fs::read(&spaced.client_jar).unwrap(), b"AAAA");
        assert_eq!(std::fs::read(&underscored.client_jar).unwrap(), b"BBBB");

        let state = InstallationState::load(&paths.state_file()).unwrap();
        assert_eq!(state.clients["Test Client"].path, spaced.client_jar);
        assert_eq!(state.clients["Test_Client"].path, underscored.client_jar);

        cleanup(&paths);
    }

    #[tokio::test]
    async fn client_update_replaces_only_that_variant() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let bootstrapper = bootstrapper(&paths, source.clone());
        bootstrapper.ensure_ready(&request("Live")).await.unwrap();

        let v2 = "https://cdn.example.com/live/v2/client.jar";
        source.publish_client("Live", v2, b"live client v2");
        let env = bootstrapper.ensure_ready(&request("Live")).await.unwrap();

        assert_eq!(std::fs::read(&env.client_jar).unwrap(), b"live client v2");
        let state = InstallationState::load(&paths.state_file()).unwrap();
        assert_eq!(state.clients["Live"].source_url, v2);
        assert_eq!(source.download_count(), 5);

        cleanup(&paths);
    }

    #[tokio::test]
    async fn lost_state_re_adopts_staged_archives() {
        let paths = test_paths();
        let source = Arc::new(StubSource::new());
        let bootstrapper = bootstrapper(&paths, source.clone());
        let first = bootstrapper.ensure_ready(&request("Live")).await.unwrap();

        std::fs::write(paths.state_file(), r#"{ "schema_version": 0 }"#).unwrap();
        let second = bootstrapper.ensure_ready(&request("Live")).await.unwrap();

        assert_eq!(first, second);
        // Runtime, JavaFX and JCEF were adopted; only the jar came down again.
        assert_eq!(source.download_count(), 5);
        let state = InstallationState::load(&paths.state_file()).unwrap();
        assert!(state.runtime.is_some() && state.javafx.is_some() && state.jcef.is_some());

        cleanup(&paths);
    }

    #[test]
    fn runtime_release_names_carry_their_major() {
        assert!(runtime_matches_major("jdk-17.0.13+11", 17));
        assert!(runtime_matches_major("jdk8u432-b06", 8));
        assert!(!runtime_matches_major("jdk-21.0.5+11", 17));
        assert!(!runtime_matches_major("custom", 17));
    }
}
