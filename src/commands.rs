// ─── Command handlers ───
// One entry point per CLI mode: list, bootstrap only, bootstrap and launch.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::Cli;
use crate::core::bootstrap::{BootstrapRequest, Bootstrapper};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_http_client;
use crate::core::launch::{compose_and_launch, exit_code};
use crate::core::paths::LauncherPaths;
use crate::core::platform::Platform;
use crate::core::profile::{values_for, GC_KEY};
use crate::core::settings::LauncherSettings;
use crate::core::source::{ArtifactSource, HttpSource};
use crate::core::steam::ProcessSteamProbe;

/// Resolved once at startup and passed to both the bootstrapper and the
/// launch composer.
pub struct LauncherContext {
    pub paths: LauncherPaths,
    pub settings: LauncherSettings,
    pub platform: Platform,
    pub source: Arc<dyn ArtifactSource>,
}

impl LauncherContext {
    pub fn resolve(data_dir: Option<PathBuf>) -> LauncherResult<Self> {
        let paths = LauncherPaths::resolve(data_dir)?;
        paths.ensure_layout()?;
        let settings = LauncherSettings::load_or_init(&paths.settings_file())?;
        let platform = Platform::current()?;
        let client = build_http_client()?;
        let source = Arc::new(HttpSource::new(
            client,
            &settings.manifest_url,
            &settings.adoptium_api,
        ));

        info!("Data directory: {:?}", paths.data_dir());
        Ok(Self {
            paths,
            settings,
            platform,
            source,
        })
    }

    fn bootstrapper(&self) -> Bootstrapper {
        Bootstrapper::new(
            self.paths.clone(),
            self.settings.clone(),
            self.platform,
            self.source.clone(),
        )
    }
}

/// Run the mode selected on the command line and return the process exit code.
pub async fn execute(cli: Cli) -> LauncherResult<u8> {
    let context = LauncherContext::resolve(cli.data_dir.clone())?;

    if cli.list {
        list(&context).await?;
        return Ok(0);
    }

    let profile = cli.profile(&context.settings);
    // Reject bad options before anything is downloaded.
    profile.resolve(&context.settings)?;

    let request = BootstrapRequest {
        client: profile.client.clone(),
        update_deps: cli.update_deps,
    };
    let environment = context.bootstrapper().ensure_ready(&request).await?;

    if cli.no_launch {
        info!("Client {} is ready; not launching", environment.client);
        return Ok(0);
    }

    let handle = compose_and_launch(
        &profile,
        &environment,
        &context.settings,
        &ProcessSteamProbe,
        &context.platform,
    )?;
    let status = handle.wait().await?;
    Ok(exit_code(&status))
}

async fn list(context: &LauncherContext) -> LauncherResult<()> {
    let clients = match context.source.client_manifest().await {
        Ok(manifest) => Some(manifest.client_names()),
        Err(e) => {
            warn!("Could not fetch the client manifest: {}", e);
            None
        }
    };

    let mut stdout = std::io::stdout().lock();
    write_catalog(&mut stdout, clients.as_deref(), &context.settings).map_err(|source| {
        LauncherError::Io {
            path: PathBuf::from("<stdout>"),
            source,
        }
    })
}

fn write_catalog(
    out: &mut impl Write,
    clients: Option<&[String]>,
    settings: &LauncherSettings,
) -> std::io::Result<()> {
    writeln!(out, "Clients:")?;
    match clients {
        Some(names) => {
            for name in names {
                let marker = if *name == settings.default_client { " (default)" } else { "" };
                writeln!(out, "  {}{}", name, marker)?;
            }
        }
        None => writeln!(out, "  (manifest unavailable)")?,
    }

    writeln!(out, "Option presets:")?;
    for preset in &settings.presets {
        let marker = if preset.name == settings.default_preset { " (default)" } else { "" };
        writeln!(out, "  {}{}: {}", preset.name, marker, preset.options.join(" "))?;
    }

    writeln!(out, "Garbage collectors:")?;
    for gc in values_for(GC_KEY) {
        writeln!(out, "  {}", gc)?;
    }
    Ok(())
}
