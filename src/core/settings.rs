use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

pub const DEFAULT_MANIFEST_URL: &str = "http://client.wurmonline.com/manifest.php";
pub const DEFAULT_ADOPTIUM_API: &str = "https://api.adoptium.net/v3/assets/feature_releases";
pub const DEFAULT_JAVAFX_BASE_URL: &str = "https://download2.gluonhq.com/openjfx";

/// A named list of JVM options selectable with `--options`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptionPreset {
    pub name: String,
    pub options: Vec<String>,
}

impl OptionPreset {
    fn new(name: &str, options: &str) -> Self {
        Self {
            name: name.to_string(),
            options: options.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// User configuration persisted as `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherSettings {
    pub jdk_major: u32,
    pub javafx_version: String,
    pub default_client: String,
    pub default_preset: String,
    pub manifest_url: String,
    pub adoptium_api: String,
    pub javafx_base_url: String,
    pub presets: Vec<OptionPreset>,
}

impl Default for LauncherSettings {
    fn default() -> Self {
        Self {
            jdk_major: 17,
            javafx_version: "17.0.13".to_string(),
            default_client: "Live".to_string(),
            default_preset: "Default".to_string(),
            manifest_url: DEFAULT_MANIFEST_URL.to_string(),
            adoptium_api: DEFAULT_ADOPTIUM_API.to_string(),
            javafx_base_url: DEFAULT_JAVAFX_BASE_URL.to_string(),
            presets: default_presets(),
        }
    }
}

pub fn default_presets() -> Vec<OptionPreset> {
    vec![
        OptionPreset::new(
            "Default",
            "-XX:+UseG1GC -XX:MaxGCPauseMillis=8 -XX:MinHeapFreeRatio=11 -XX:MaxHeapFreeRatio=18",
        ),
        OptionPreset::new("Low Memory", "-Xmx1G -Xms128M"),
        OptionPreset::new("Low Latency", "-XX:+UseShenandoahGC -Xmx4G -Xms256M"),
    ]
}

impl LauncherSettings {
    /// Read `config.json`, writing the defaults on first run.
    pub fn load_or_init(path: &Path) -> LauncherResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<LauncherSettings>(&raw) {
                Ok(settings) => {
                    debug!("Reading configuration from {:?}", path);
                    Ok(settings)
                }
                Err(e) => {
                    warn!("Ignoring unreadable configuration {:?}: {}", path, e);
                    Ok(Self::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Writing default configuration to {:?}", path);
                let settings = Self::default();
                settings.save(path)?;
                Ok(settings)
            }
            Err(source) => Err(LauncherError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    pub fn save(&self, path: &Path) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            crate::core::paths::create_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn preset(&self, name: &str) -> Option<&OptionPreset> {
        self.presets.iter().find(|preset| preset.name == name)
    }

    pub fn preset_names(&self) -> Vec<String> {
        self.presets.iter().map(|preset| preset.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_three_stock_presets() {
        let settings = LauncherSettings::default();
        assert_eq!(
            settings.preset_names(),
            vec!["Default", "Low Memory", "Low Latency"]
        );
        assert_eq!(
            settings.preset("Low Latency").unwrap().options,
            vec!["-XX:+UseShenandoahGC", "-Xmx4G", "-Xms256M"]
        );
        assert!(settings.preset("low latency").is_none());
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let json = r#"{ "jdk_major": 21, "presets": [{ "name": "Tiny", "options": ["-Xmx512M"] }] }"#;
        let settings: LauncherSettings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.jdk_major, 21);
        assert_eq!(settings.javafx_version, "17.0.13");
        assert_eq!(settings.manifest_url, DEFAULT_MANIFEST_URL);
        assert_eq!(settings.preset_names(), vec!["Tiny"]);
    }

    #[test]
    fn load_or_init_writes_defaults_once() {
        let dir = std::env::temp_dir().join(format!("wurm-settings-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.json");

        let first = LauncherSettings::load_or_init(&path).unwrap();
        assert!(path.exists());
        assert_eq!(first.default_client, "Live");

        let mut edited = first.clone();
        edited.default_client = "Test".into();
        edited.save(&path).unwrap();

        let second = LauncherSettings::load_or_init(&path).unwrap();
        assert_eq!(second.default_client, "Test");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
