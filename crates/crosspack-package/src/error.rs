//! Packaging error types.

use std::path::PathBuf;

/// Errors that can occur while packaging an artifact.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// The compressor failed; no compressed file was left behind.
    #[error("compression of {} failed: {detail}", path.display())]
    CompressionFailed { path: PathBuf, detail: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for packaging operations.
pub type Result<T> = std::result::Result<T, PackageError>;
