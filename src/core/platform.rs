// ─── Platform identifiers ───
// Each upstream names operating systems and architectures differently.

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
    MacOs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X64,
    X86,
    Aarch64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// The platform this binary was built for.
    pub fn current() -> LauncherResult<Self> {
        Self::from_names(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn from_names(os: &str, arch: &str) -> LauncherResult<Self> {
        let os = match os {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            "macos" => Os::MacOs,
            other => return Err(LauncherError::UnsupportedPlatform(other.to_string())),
        };
        let arch = match arch {
            "x86_64" | "AMD64" => Arch::X64,
            "x86" | "i686" => Arch::X86,
            "aarch64" => Arch::Aarch64,
            other => return Err(LauncherError::UnsupportedPlatform(other.to_string())),
        };
        Ok(Self { os, arch })
    }

    /// `os` query parameter of the Adoptium API.
    pub fn adoptium_os(&self) -> &'static str {
        match self.os {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::MacOs => "mac",
        }
    }

    /// `architecture` query parameter of the Adoptium API.
    pub fn adoptium_arch(&self) -> &'static str {
        match self.arch {
            Arch::X64 => "x64",
            Arch::X86 => "x86",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// Platform segment of the OpenJFX SDK file name, e.g. `linux-x64`.
    pub fn javafx_id(&self) -> String {
        let os = match self.os {
            Os::Linux => "linux",
            Os::Windows => "windows",
            Os::MacOs => "osx",
        };
        format!("{}-{}", os, self.adoptium_arch())
    }

    /// Platform id used by the Wurm manifest (`linux64`, `win32`, ...).
    pub fn wurm_id(&self) -> LauncherResult<String> {
        let system = match self.os {
            Os::Linux => "linux",
            Os::Windows => "win",
            Os::MacOs => {
                return Err(LauncherError::UnsupportedPlatform(
                    "the Wurm client ships no macOS natives".into(),
                ))
            }
        };
        let bits = match self.arch {
            Arch::X64 => "64",
            Arch::X86 => "32",
            Arch::Aarch64 => {
                return Err(LauncherError::UnsupportedPlatform(
                    "the Wurm client ships no aarch64 natives".into(),
                ))
            }
        };
        Ok(format!("{system}{bits}"))
    }

    pub fn java_exe(&self) -> &'static str {
        match self.os {
            Os::Windows => "java.exe",
            _ => "java",
        }
    }

    /// Environment variable the dynamic loader searches for native libraries.
    pub fn library_path_var(&self) -> &'static str {
        match self.os {
            Os::Linux => "LD_LIBRARY_PATH",
            Os::Windows => "PATH",
            Os::MacOs => "DYLD_LIBRARY_PATH",
        }
    }

    pub fn path_list_separator(&self) -> &'static str {
        match self.os {
            Os::Windows => ";",
            _ => ":",
        }
    }
}
