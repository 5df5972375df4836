//! Per-invocation build configuration.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cargo profile to build with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    #[default]
    Debug,
    Release,
}

impl BuildMode {
    /// Name of the profile directory under `target/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            BuildMode::Debug => "debug",
            BuildMode::Release => "release",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// How cross builds are carried out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// `cargo build --target`, installing the target through rustup.
    #[default]
    Direct,
    /// `cargo zigbuild`, linking with zig.
    AltLinker,
    /// `cross build`, compiling inside a container.
    Container,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Direct => "direct",
            Backend::AltLinker => "zig",
            Backend::Container => "container",
        })
    }
}

/// Parameters of one crosspack invocation. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory containing `Cargo.toml`.
    pub source_dir: PathBuf,
    /// Directory packaged artifacts are written to.
    pub output_dir: PathBuf,
    pub mode: BuildMode,
    /// Cargo features to enable. Empty means the crate's defaults.
    pub features: BTreeSet<String>,
    pub backend: Backend,
    /// Fail a target when its rustup target cannot be installed.
    pub force_install_targets: bool,
    pub compress: bool,
    /// Upper bound on each toolchain invocation.
    pub timeout: Option<Duration>,
}

impl BuildConfig {
    /// Default configuration for a project rooted at `source_dir`.
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            mode: BuildMode::default(),
            features: BTreeSet::new(),
            backend: Backend::default(),
            force_install_targets: false,
            compress: true,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Cargo's build output root for this project.
    pub fn target_root(&self) -> PathBuf {
        self.source_dir.join("target")
    }

    /// Path of the project manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.source_dir.join("Cargo.toml")
    }

    /// Arguments shared by every cargo-like build command: profile and features.
    pub fn profile_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.mode == BuildMode::Release {
            args.push("--release".to_string());
        }
        if !self.features.is_empty() {
            args.push("--features".to_string());
            args.push(self.features.iter().cloned().collect::<Vec<_>>().join(","));
        }
        args
    }
}

/// Default per-invocation timeout: one hour.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3600);
