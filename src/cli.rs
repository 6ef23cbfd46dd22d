use std::path::PathBuf;

use clap::Parser;

use crate::core::profile::LaunchProfile;
use crate::core::settings::LauncherSettings;

/// Bootstrap and launch the Wurm Online client.
#[derive(Debug, Parser)]
#[command(name = "wurm-launcher", version, about)]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// List client variants, option presets and garbage collectors, then exit
    #[arg(short, long)]
    pub list: bool,

    /// Client variant to launch [default: Live]
    #[arg(short, long, value_name = "NAME")]
    pub client: Option<String>,

    /// Option preset to launch with [default: Default]
    #[arg(short = 'o', long = "options", value_name = "PRESET")]
    pub preset: Option<String>,

    /// Garbage collector: g1, shenandoah, zgc, parallel or serial
    #[arg(short, long, value_name = "GC")]
    pub gc: Option<String>,

    /// Maximum heap size, e.g. 4G
    #[arg(long, value_name = "SIZE")]
    pub max_heap: Option<String>,

    /// Initial heap size, e.g. 512M
    #[arg(long, value_name = "SIZE")]
    pub min_heap: Option<String>,

    /// Enable Steam integration
    #[arg(short, long)]
    pub steam: bool,

    /// Check for newer Java, JavaFX and JCEF builds even if they are installed
    #[arg(short, long)]
    pub update_deps: bool,

    /// Prepare everything but do not start the client
    #[arg(short, long)]
    pub no_launch: bool,

    /// Use this directory instead of the default data directory
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Extra arguments passed to the Java runtime
    #[arg(last = true, value_name = "JAVA_ARGS")]
    pub java_args: Vec<String>,
}

impl Cli {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }

    /// Launch profile from the flags, with defaults taken from the settings.
    pub fn profile(&self, settings: &LauncherSettings) -> LaunchProfile {
        LaunchProfile {
            client: self
                .client
                .clone()
                .unwrap_or_else(|| settings.default_client.clone()),
            preset: self
                .preset
                .clone()
                .unwrap_or_else(|| settings.default_preset.clone()),
            gc: self.gc.clone(),
            max_heap: self.max_heap.clone(),
            min_heap: self.min_heap.clone(),
            steam: self.steam,
            java_args: self.java_args.clone(),
        }
    }
}
