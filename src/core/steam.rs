// ─── Steam detection ───

use tracing::debug;

/// Answers whether the Steam client is up. Steam integration is only applied
/// when it is.
pub trait SteamProbe: Send + Sync {
    fn is_running(&self) -> bool;
}

/// Looks for a Steam process in the system process table.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSteamProbe;

impl SteamProbe for ProcessSteamProbe {
    fn is_running(&self) -> bool {
        let mut system = sysinfo::System::new_all();
        system.refresh_all();
        let found = system
            .processes()
            .values()
            .any(|process| is_steam_process(&process.name().to_string_lossy()));
        debug!("Steam process found: {}", found);
        found
    }
}

/// Fixed answer regardless of the process table.
#[derive(Debug, Clone, Copy)]
pub struct StaticSteamProbe(pub bool);

impl SteamProbe for StaticSteamProbe {
    fn is_running(&self) -> bool {
        self.0
    }
}

fn is_steam_process(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "steam" | "steam.exe" | "steam_osx" | "steam.sh"
    )
}
