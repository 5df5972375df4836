//! Errors that end a run before or instead of building targets.

use std::path::PathBuf;

use crosspack_targets::TargetError;

/// Fatal-to-run errors. Per-target failures are recorded in the report instead.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No `Cargo.toml` at the source root.
    #[error("manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// The manifest exists but cannot be used.
    #[error("invalid manifest {}: {detail}", path.display())]
    InvalidManifest { path: PathBuf, detail: String },

    /// Bad or conflicting command-line input.
    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },

    /// At least one required tool is missing or unusable.
    #[error("dependency check failed: {}", failed.join("; "))]
    DependencyUnsatisfied { failed: Vec<String> },

    /// Platform lookup error.
    #[error(transparent)]
    Platform(#[from] TargetError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for orchestration.
pub type Result<T> = std::result::Result<T, BuildError>;
