//! The platform registry.
//!
//! Tokens form a closed set. The static [`REGISTRY`] table holds one
//! [`PlatformSpec`] per token, in the same order as [`PlatformToken::ALL`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TargetError};

/// Operating system axis of a platform token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Darwin,
    Windows,
}

impl Os {
    /// Token spelling (`linux`, `darwin`, `windows`).
    pub fn as_str(self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::Darwin => "darwin",
            Os::Windows => "windows",
        }
    }

    /// Suffix the toolchain appends to executables on this OS.
    pub fn exe_suffix(self) -> &'static str {
        match self {
            Os::Windows => ".exe",
            Os::Linux | Os::Darwin => "",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU architecture axis of a platform token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    Amd64,
    Arm64,
    Armv7,
}

impl Arch {
    /// Token spelling (`amd64`, `arm64`, `armv7`).
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
            Arch::Armv7 => "armv7",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buildable `os-arch` platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlatformToken {
    #[serde(rename = "linux-amd64")]
    LinuxAmd64,
    #[serde(rename = "linux-arm64")]
    LinuxArm64,
    #[serde(rename = "linux-armv7")]
    LinuxArmv7,
    #[serde(rename = "darwin-amd64")]
    DarwinAmd64,
    #[serde(rename = "darwin-arm64")]
    DarwinArm64,
    #[serde(rename = "windows-amd64")]
    WindowsAmd64,
    #[serde(rename = "windows-arm64")]
    WindowsArm64,
}

impl PlatformToken {
    /// Every registered token, in registry order.
    pub const ALL: [PlatformToken; 7] = [
        PlatformToken::LinuxAmd64,
        PlatformToken::LinuxArm64,
        PlatformToken::LinuxArmv7,
        PlatformToken::DarwinAmd64,
        PlatformToken::DarwinArm64,
        PlatformToken::WindowsAmd64,
        PlatformToken::WindowsArm64,
    ];

    /// Operating system axis.
    pub fn os(self) -> Os {
        match self {
            PlatformToken::LinuxAmd64 | PlatformToken::LinuxArm64 | PlatformToken::LinuxArmv7 => {
                Os::Linux
            }
            PlatformToken::DarwinAmd64 | PlatformToken::DarwinArm64 => Os::Darwin,
            PlatformToken::WindowsAmd64 | PlatformToken::WindowsArm64 => Os::Windows,
        }
    }

    /// Architecture axis.
    pub fn arch(self) -> Arch {
        match self {
            PlatformToken::LinuxAmd64 | PlatformToken::DarwinAmd64 | PlatformToken::WindowsAmd64 => {
                Arch::Amd64
            }
            PlatformToken::LinuxArm64 | PlatformToken::DarwinArm64 | PlatformToken::WindowsArm64 => {
                Arch::Arm64
            }
            PlatformToken::LinuxArmv7 => Arch::Armv7,
        }
    }

    /// Look up the token for an `(os, arch)` pair, if that pair is registered.
    pub fn from_parts(os: Os, arch: Arch) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.os() == os && t.arch() == arch)
    }

    /// Canonical spelling, e.g. `linux-amd64`.
    pub fn as_str(self) -> &'static str {
        self.spec().name
    }

    /// Registry entry for this token.
    pub fn spec(self) -> &'static PlatformSpec {
        &REGISTRY[self as usize]
    }
}

impl fmt::Display for PlatformToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformToken {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self> {
        resolve(s).map(|spec| spec.token)
    }
}

/// Registry entry for a platform token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSpec {
    /// The token this entry describes.
    pub token: PlatformToken,
    /// Canonical token spelling.
    pub name: &'static str,
    /// rustc target triple for `cargo` and `cross`.
    pub host_triple: &'static str,
    /// zig target for the alternate-linker backend, if zig can link this platform.
    pub alt_linker_triple: Option<&'static str>,
    /// Architecture label used in artifact file names.
    pub arch_label: &'static str,
}

/// The static platform table. Index `i` describes `PlatformToken::ALL[i]`.
static REGISTRY: [PlatformSpec; 7] = [
    PlatformSpec {
        token: PlatformToken::LinuxAmd64,
        name: "linux-amd64",
        host_triple: "x86_64-unknown-linux-gnu",
        alt_linker_triple: Some("x86_64-linux-gnu"),
        arch_label: "x86_64",
    },
    PlatformSpec {
        token: PlatformToken::LinuxArm64,
        name: "linux-arm64",
        host_triple: "aarch64-unknown-linux-gnu",
        alt_linker_triple: Some("aarch64-linux-gnu"),
        arch_label: "aarch64",
    },
    PlatformSpec {
        token: PlatformToken::LinuxArmv7,
        name: "linux-armv7",
        host_triple: "armv7-unknown-linux-gnueabihf",
        alt_linker_triple: Some("arm-linux-gnueabihf"),
        arch_label: "armv7",
    },
    PlatformSpec {
        token: PlatformToken::DarwinAmd64,
        name: "darwin-amd64",
        host_triple: "x86_64-apple-darwin",
        alt_linker_triple: Some("x86_64-macos"),
        arch_label: "x86_64",
    },
    PlatformSpec {
        token: PlatformToken::DarwinArm64,
        name: "darwin-arm64",
        host_triple: "aarch64-apple-darwin",
        alt_linker_triple: Some("aarch64-macos"),
        arch_label: "aarch64",
    },
    PlatformSpec {
        token: PlatformToken::WindowsAmd64,
        name: "windows-amd64",
        host_triple: "x86_64-pc-windows-gnu",
        alt_linker_triple: Some("x86_64-windows-gnu"),
        arch_label: "x86_64",
    },
    PlatformSpec {
        token: PlatformToken::WindowsArm64,
        name: "windows-arm64",
        host_triple: "aarch64-pc-windows-msvc",
        alt_linker_triple: None,
        arch_label: "aarch64",
    },
];

/// Resolve a token string to its registry entry.
pub fn resolve(token: &str) -> Result<&'static PlatformSpec> {
    REGISTRY
        .iter()
        .find(|spec| spec.name == token)
        .ok_or_else(|| TargetError::UnknownPlatform {
            token: token.to_string(),
        })
}

/// All registry entries, in registry order.
pub fn list_known() -> &'static [PlatformSpec] {
    &REGISTRY
}
