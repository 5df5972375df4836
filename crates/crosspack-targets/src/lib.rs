//! Platform registry and host detection for crosspack.
//!
//! A build target is named by a canonical `os-arch` token such as
//! `linux-amd64`. Each token maps to:
//! - **Host triple:** the rustc target triple passed to `cargo` / `cross`
//! - **Alternate-linker triple:** the zig target used by `cargo zigbuild`, when zig supports it
//! - **Arch label:** the architecture spelling used in output file names

pub mod error;
pub mod host;
pub mod platform;

pub use error::{Result, TargetError};
pub use host::{detect_host, detect_host_from, is_local_build};
pub use platform::{list_known, resolve, Arch, Os, PlatformSpec, PlatformToken};
