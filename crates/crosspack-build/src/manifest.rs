//! `Cargo.toml` reading: project identity and crosspack defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{BuildError, Result};

/// The parts of a Cargo manifest crosspack cares about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CargoManifest {
    /// `[package]` section. Absent in virtual workspace manifests.
    #[serde(default)]
    pub package: Option<PackageSection>,
    /// `[[bin]]` targets.
    #[serde(default)]
    pub bin: Vec<BinTarget>,
}

/// `[package]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSection {
    pub name: String,
    #[serde(default)]
    pub metadata: Option<PackageMetadata>,
}

/// `[package.metadata]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub crosspack: Option<Settings>,
}

/// A `[[bin]]` entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BinTarget {
    #[serde(default)]
    pub name: Option<String>,
}

/// `[package.metadata.crosspack]` defaults. Command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    /// Artifact name prefix.
    #[serde(default)]
    pub name: Option<String>,
    /// Binary cargo builds.
    #[serde(default)]
    pub binary: Option<String>,
    /// Tokens built when none are named.
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub compress: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Names derived from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIdentity {
    /// Prefix of packaged artifact names.
    pub name: String,
    /// Binary cargo produces, without extension.
    pub binary: String,
}

impl CargoManifest {
    /// Load `<source_dir>/Cargo.toml`.
    pub fn load(source_dir: &Path) -> Result<Self> {
        let path = source_dir.join("Cargo.toml");
        if !path.is_file() {
            return Err(BuildError::ManifestNotFound { path });
        }
        let content = std::fs::read_to_string(&path)?;
        toml::from_str(&content).map_err(|e| BuildError::InvalidManifest {
            path,
            detail: e.message().to_string(),
        })
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// The crosspack settings table, or defaults when absent.
    pub fn settings(&self) -> Settings {
        self.package
            .as_ref()
            .and_then(|p| p.metadata.as_ref())
            .and_then(|m| m.crosspack.clone())
            .unwrap_or_default()
    }

    /// Resolve the artifact prefix and binary name.
    ///
    /// Explicit settings win, then the first `[[bin]]`, then the package name.
    pub fn identity(&self, path: &Path) -> Result<ProjectIdentity> {
        let settings = self.settings();
        let package_name = self.package.as_ref().map(|p| p.name.clone());
        let first_bin = self.bin.iter().find_map(|b| b.name.clone());

        let binary = settings
            .binary
            .or(first_bin)
            .or_else(|| package_name.clone())
            .ok_or_else(|| BuildError::InvalidManifest {
                path: path.to_path_buf(),
                detail: "no [package] section or [[bin]] target to build".into(),
            })?;
        let name = settings
            .name
            .or(package_name)
            .unwrap_or_else(|| binary.clone());

        Ok(ProjectIdentity { name, binary })
    }
}
