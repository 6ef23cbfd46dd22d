// ─── Launch profile ───
// User choices for one launch and the table that turns them into JVM flags,
// client arguments and environment variables.

use crate::core::error::ValidationError;
use crate::core::settings::LauncherSettings;

pub const STEAM_APP_ID: &str = "1179680";

/// Effect of selecting `key=value`.
#[derive(Debug, PartialEq, Eq)]
pub struct OptionRule {
    pub key: &'static str,
    pub value: &'static str,
    pub jvm_args: &'static [&'static str],
    pub client_args: &'static [&'static str],
    pub env: &'static [(&'static str, &'static str)],
}

pub const GC_KEY: &str = "gc";
pub const STEAM_KEY: &str = "steam";

pub static OPTION_TABLE: &[OptionRule] = &[
    OptionRule {
        key: GC_KEY,
        value: "g1",
        jvm_args: &["-XX:+UseG1GC"],
        client_args: &[],
        env: &[],
    },
    OptionRule {
        key: GC_KEY,
        value: "shenandoah",
        jvm_args: &["-XX:+UseShenandoahGC"],
        client_args: &[],
        env: &[],
    },
    OptionRule {
        key: GC_KEY,
        value: "zgc",
        jvm_args: &["-XX:+UseZGC"],
        client_args: &[],
        env: &[],
    },
    OptionRule {
        key: GC_KEY,
        value: "parallel",
        jvm_args: &["-XX:+UseParallelGC"],
        client_args: &[],
        env: &[],
    },
    OptionRule {
        key: GC_KEY,
        value: "serial",
        jvm_args: &["-XX:+UseSerialGC"],
        client_args: &[],
        env: &[],
    },
    OptionRule {
        key: STEAM_KEY,
        value: "on",
        jvm_args: &[],
        client_args: &["-steam"],
        env: &[("SteamAppId", STEAM_APP_ID)],
    },
];

pub fn lookup(key: &str, value: &str) -> Result<&'static OptionRule, ValidationError> {
    OPTION_TABLE
        .iter()
        .find(|rule| rule.key == key && rule.value == value)
        .ok_or_else(|| ValidationError::UnknownOption {
            key: key.to_string(),
            value: value.to_string(),
            known: values_for(key).into_iter().map(str::to_string).collect(),
        })
}

pub fn values_for(key: &str) -> Vec<&'static str> {
    OPTION_TABLE
        .iter()
        .filter(|rule| rule.key == key)
        .map(|rule| rule.value)
        .collect()
}

/// Resolved set of user choices for one launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchProfile {
    pub client: String,
    pub preset: String,
    pub gc: Option<String>,
    pub max_heap: Option<String>,
    pub min_heap: Option<String>,
    pub steam: bool,
    pub java_args: Vec<String>,
}

impl LaunchProfile {
    pub fn new(client: impl Into<String>, preset: impl Into<String>) -> Self {
        Self {
            client: client.into(),
            preset: preset.into(),
            gc: None,
            max_heap: None,
            min_heap: None,
            steam: false,
            java_args: Vec::new(),
        }
    }

    /// Check every choice and work out the JVM arguments they imply.
    pub fn resolve(&self, settings: &LauncherSettings) -> Result<ResolvedProfile, ValidationError> {
        let preset = settings
            .preset(&self.preset)
            .ok_or_else(|| ValidationError::UnknownPreset {
                name: self.preset.clone(),
                known: settings.preset_names(),
            })?;

        let mut rules = Vec::new();
        let gc_rule = match self.gc.as_deref() {
            Some(gc) => Some(lookup(GC_KEY, gc)?),
            None => None,
        };
        rules.extend(gc_rule);
        if self.steam {
            rules.push(lookup(STEAM_KEY, "on")?);
        }

        let max_heap = self.max_heap.as_deref().map(parse_heap).transpose()?;
        let min_heap = self.min_heap.as_deref().map(parse_heap).transpose()?;

        let passthrough_gc = passthrough_collector(&self.java_args)?;
        if let (Some(rule), Some(flag)) = (gc_rule, passthrough_gc) {
            if !rule.jvm_args.iter().any(|known| *known == flag) {
                return Err(ValidationError::Conflict(format!(
                    "--gc {} selects {} but the Java arguments select {}",
                    rule.value,
                    rule.jvm_args.join(" "),
                    flag
                )));
            }
        }
        let collector_overridden = gc_rule.is_some() || passthrough_gc.is_some();

        let mut preset_args = Vec::new();
        let mut preset_max = None;
        let mut preset_min = None;
        for arg in &preset.options {
            if collector_overridden && collector_flag(arg).is_some() {
                continue;
            }
            if let Some(size) = arg.strip_prefix("-Xmx") {
                if max_heap.is_some() {
                    continue;
                }
                preset_max = parse_heap(size).ok();
            }
            if let Some(size) = arg.strip_prefix("-Xms") {
                if min_heap.is_some() {
                    continue;
                }
                preset_min = parse_heap(size).ok();
            }
            preset_args.push(arg.clone());
        }

        let effective_max = max_heap.as_ref().or(preset_max.as_ref());
        let effective_min = min_heap.as_ref().or(preset_min.as_ref());
        if let (Some(min), Some(max)) = (effective_min, effective_max) {
            if min.bytes > max.bytes {
                return Err(ValidationError::Conflict(format!(
                    "minimum heap {} exceeds maximum heap {}",
                    min.text, max.text
                )));
            }
        }

        let mut heap_args = Vec::new();
        if let Some(min) = &min_heap {
            heap_args.push(format!("-Xms{}", min.text));
        }
        if let Some(max) = &max_heap {
            heap_args.push(format!("-Xmx{}", max.text));
        }

        Ok(ResolvedProfile {
            preset_args,
            rules,
            heap_args,
            java_args: self.java_args.clone(),
        })
    }
}

/// Output of [`LaunchProfile::resolve`], in argument order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    /// Preset flags minus those replaced by an explicit choice.
    pub preset_args: Vec<String>,
    pub rules: Vec<&'static OptionRule>,
    pub heap_args: Vec<String>,
    pub java_args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeapSize {
    text: String,
    bytes: u128,
}

/// `<digits>[KkMmGg]`, as accepted by `-Xmx`/`-Xms`.
fn parse_heap(raw: &str) -> Result<HeapSize, ValidationError> {
    let invalid = || ValidationError::InvalidHeapSize(raw.to_string());
    let (digits, multiplier) = match raw.chars().last() {
        Some('k' | 'K') => (&raw[..raw.len() - 1], 1u128 << 10),
        Some('m' | 'M') => (&raw[..raw.len() - 1], 1u128 << 20),
        Some('g' | 'G') => (&raw[..raw.len() - 1], 1u128 << 30),
        Some(_) => (raw, 1u128),
        None => return Err(invalid()),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let value: u128 = digits.parse().map_err(|_| invalid())?;
    let bytes = value.checked_mul(multiplier).ok_or_else(invalid)?;
    Ok(HeapSize {
        text: raw.to_string(),
        bytes,
    })
}

/// `-XX:+Use<Name>GC` flags.
fn collector_flag(arg: &str) -> Option<&str> {
    let name = arg.strip_prefix("-XX:+Use")?.strip_suffix("GC")?;
    if name.is_empty() {
        None
    } else {
        Some(arg)
    }
}

fn passthrough_collector(java_args: &[String]) -> Result<Option<&str>, ValidationError> {
    let mut found: Option<&str> = None;
    for flag in java_args.iter().filter_map(|arg| collector_flag(arg)) {
        match found {
            Some(previous) if previous != flag => {
                return Err(ValidationError::Conflict(format!(
                    "the Java arguments select two collectors: {} and {}",
                    previous, flag
                )))
            }
            _ => found = Some(flag),
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LauncherSettings {
        LauncherSettings::default()
    }

    fn profile() -> LaunchProfile {
        LaunchProfile::new("Live", "Default")
    }

    #[test]
    fn every_table_value_is_found() {
        for rule in OPTION_TABLE {
            assert_eq!(lookup(rule.key, rule.value).unwrap(), rule);
        }
        assert_eq!(
            values_for(GC_KEY),
            vec!["g1", "shenandoah", "zgc", "parallel", "serial"]
        );
    }

    #[test]
    fn unknown_gc_is_rejected() {
        let mut p = profile();
        p.gc = Some("cms".into());
        match p.resolve(&settings()).unwrap_err() {
            ValidationError::UnknownOption { key, value, known } => {
                assert_eq!(key, "gc");
                assert_eq!(value, "cms");
                assert!(known.contains(&"shenandoah".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let p = LaunchProfile::new("Live", "Turbo");
        assert!(matches!(
            p.resolve(&settings()),
            Err(ValidationError::UnknownPreset { .. })
        ));
    }

    #[test]
    fn default_preset_passes_through_unchanged() {
        let resolved = profile().resolve(&settings()).unwrap();
        assert_eq!(
            resolved.preset_args,
            vec![
                "-XX:+UseG1GC",
                "-XX:MaxGCPauseMillis=8",
                "-XX:MinHeapFreeRatio=11",
                "-XX:MaxHeapFreeRatio=18"
            ]
        );
        assert!(resolved.rules.is_empty());
        assert!(resolved.heap_args.is_empty());
    }

    #[test]
    fn explicit_gc_replaces_preset_collector() {
        let mut p = profile();
        p.gc = Some("zgc".into());
        let resolved = p.resolve(&settings()).unwrap();
        assert!(!resolved.preset_args.iter().any(|a| a == "-XX:+UseG1GC"));
        assert!(resolved.preset_args.iter().any(|a| a == "-XX:MaxGCPauseMillis=8"));
        assert_eq!(resolved.rules, vec![lookup("gc", "zgc").unwrap()]);
    }

    #[test]
    fn explicit_heap_replaces_preset_heap() {
        let mut p = LaunchProfile::new("Live", "Low Latency");
        p.max_heap = Some("6G".into());
        let resolved = p.resolve(&settings()).unwrap();
        assert_eq!(resolved.preset_args, vec!["-XX:+UseShenandoahGC", "-Xms256M"]);
        assert_eq!(resolved.heap_args, vec!["-Xmx6G"]);
    }

    #[test]
    fn heap_sizes_are_checked() {
        for bad in ["", "4GB", "G", "-1G", "1.5G", "4 G"] {
            let mut p = profile();
            p.max_heap = Some(bad.into());
            assert_eq!(
                p.resolve(&settings()).unwrap_err(),
                ValidationError::InvalidHeapSize(bad.into()),
                "{bad}"
            );
        }
        for good in ["512m", "4G", "1048576", "64k"] {
            let mut p = profile();
            p.max_heap = Some(good.into());
            assert!(p.resolve(&settings()).is_ok(), "{good}");
        }
    }

    #[test]
    fn min_heap_above_max_heap_conflicts() {
        let mut p = profile();
        p.min_heap = Some("4G".into());
        p.max_heap = Some("1024M".into());
        assert!(matches!(
            p.resolve(&settings()),
            Err(ValidationError::Conflict(_))
        ));

        // The preset's own limit counts too.
        let mut p = LaunchProfile::new("Live", "Low Memory");
        p.min_heap = Some("2G".into());
        assert!(matches!(
            p.resolve(&settings()),
            Err(ValidationError::Conflict(_))
        ));
    }

    #[test]
    fn passthrough_collector_must_agree_with_gc() {
        let mut p = profile();
        p.gc = Some("g1".into());
        p.java_args = vec!["-XX:+UseZGC".into()];
        assert!(matches!(
            p.resolve(&settings()),
            Err(ValidationError::Conflict(_))
        ));

        p.java_args = vec!["-XX:+UseG1GC".into(), "-Dfoo=bar".into()];
        assert!(p.resolve(&settings()).is_ok());
    }

    #[test]
    fn two_passthrough_collectors_conflict() {
        let mut p = profile();
        p.java_args = vec!["-XX:+UseSerialGC".into(), "-XX:+UseParallelGC".into()];
        assert!(matches!(
            p.resolve(&settings()),
            Err(ValidationError::Conflict(_))
        ));
    }

    #[test]
    fn passthrough_collector_replaces_preset_collector() {
        let mut p = profile();
        p.java_args = vec!["-XX:+UseShenandoahGC".into()];
        let resolved = p.resolve(&settings()).unwrap();
        assert!(!resolved.preset_args.iter().any(|a| a == "-XX:+UseG1GC"));
        assert_eq!(resolved.java_args, vec!["-XX:+UseShenandoahGC"]);
    }

    #[test]
    fn steam_selects_its_rule() {
        let mut p = profile();
        p.steam = true;
        let resolved = p.resolve(&settings()).unwrap();
        assert_eq!(resolved.rules.len(), 1);
        assert_eq!(resolved.rules[0].client_args, &["-steam"]);
        assert_eq!(resolved.rules[0].env, &[("SteamAppId", "1179680")]);
    }
}
