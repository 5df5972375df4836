//! Artifact compression.

use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{PackageError, Result};

/// Compresses a file into a new file.
pub trait Compressor {
    /// Extension appended to the compressed file, without the dot.
    fn suffix(&self) -> &str;

    /// Write the compressed form of `src` to `dst`.
    ///
    /// On error `dst` may be partially written; the caller discards it.
    fn compress(&self, src: &Path, dst: &Path) -> Result<()>;
}

/// `gzip -9 -n`. The `-n` flag leaves name and timestamp out of the header,
/// so identical inputs compress to identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipCompressor;

impl Compressor for GzipCompressor {
    fn suffix(&self) -> &str {
        "gz"
    }

    fn compress(&self, src: &Path, dst: &Path) -> Result<()> {
        let out = File::create(dst)?;
        let failed = |detail: String| PackageError::CompressionFailed {
            path: src.to_path_buf(),
            detail,
        };

        let output = Command::new("gzip")
            .args(["-9", "-n", "-c"])
            .arg(src)
            .stdin(Stdio::null())
            .stdout(out)
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| failed(format!("could not run gzip: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(
                stderr
                    .lines()
                    .next()
                    .unwrap_or("gzip exited unsuccessfully")
                    .to_string(),
            ));
        }
        Ok(())
    }
}
