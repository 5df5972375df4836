//! Copying built binaries into the output directory under their canonical names.

use std::fs;
use std::path::{Path, PathBuf};

use crosspack_targets::PlatformSpec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compress::Compressor;
use crate::error::Result;
use crate::integrity::ContentHash;

/// Where and how to package.
#[derive(Debug, Clone, Copy)]
pub struct PackageOptions<'a> {
    pub output_dir: &'a Path,
    /// Project name used as the artifact file name prefix.
    pub project_name: &'a str,
    pub compress: bool,
}

/// A file written to the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagedArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// SHA-256 of the final file, compressed or not.
    pub checksum: ContentHash,
    pub compressed: bool,
}

/// `<project>.<os>.<arch_label>`, without extension.
pub fn canonical_name(project_name: &str, spec: &PlatformSpec) -> String {
    format!(
        "{project_name}.{}.{}",
        spec.token.os(),
        spec.arch_label
    )
}

/// Copy `artifact` into the output directory, mark it executable and
/// optionally compress it in place.
///
/// Compression goes through a temporary file that is renamed only on
/// success, so a failure never leaves a truncated compressed file behind.
pub fn package(
    artifact: &Path,
    spec: &PlatformSpec,
    options: &PackageOptions<'_>,
    compressor: &dyn Compressor,
) -> Result<PackagedArtifact> {
    fs::create_dir_all(options.output_dir)?;

    let name = canonical_name(options.project_name, spec);
    let copied = options.output_dir.join(&name);
    fs::copy(artifact, &copied)?;
    set_executable(&copied)?;
    debug!(from = %artifact.display(), to = %copied.display(), "copied artifact");

    let path = if options.compress {
        compress_in_place(&copied, &name, options.output_dir, compressor)?
    } else {
        copied
    };

    let size_bytes = fs::metadata(&path)?.len();
    let checksum = ContentHash::of_file(&path)?;
    info!(path = %path.display(), size_bytes, %checksum, "packaged");

    Ok(PackagedArtifact {
        path,
        size_bytes,
        checksum,
        compressed: options.compress,
    })
}

fn compress_in_place(
    copied: &Path,
    name: &str,
    output_dir: &Path,
    compressor: &dyn Compressor,
) -> Result<PathBuf> {
    let suffix = compressor.suffix();
    let compressed = output_dir.join(format!("{name}.{suffix}"));
    let staging = output_dir.join(format!("{name}.{suffix}.tmp"));

    if let Err(e) = compressor.compress(copied, &staging) {
        let _ = fs::remove_file(&staging);
        // A compressed file from an earlier run would otherwise pass for this one.
        let _ = fs::remove_file(&compressed);
        return Err(e);
    }

    fs::rename(&staging, &compressed)?;
    fs::remove_file(copied)?;
    Ok(compressed)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
