//! Artifact packaging for crosspack.
//!
//! Turns a binary produced by the toolchain into a release file:
//! canonical name, executable bit, optional gzip compression, size and
//! SHA-256 checksum.

pub mod compress;
pub mod error;
pub mod integrity;
pub mod package;

pub use compress::{Compressor, GzipCompressor};
pub use error::{PackageError, Result};
pub use integrity::ContentHash;
pub use package::{canonical_name, package, PackageOptions, PackagedArtifact};
