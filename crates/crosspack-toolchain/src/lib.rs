//! Toolchain invocation for crosspack.
//!
//! Wraps `cargo`, `rustup`, `cross`, `cargo zigbuild` and friends behind the
//! [`ToolRunner`] trait, and implements the steps that use them:
//! dependency checks, target installation, backend selection and cleaning.

pub mod backend;
pub mod clean;
pub mod config;
pub mod deps;
pub mod error;
pub mod install;
pub mod runner;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use backend::{artifact_path, build_target, select_route, BuildRequest, BuildRoute, BuiltArtifact};
pub use clean::{clean, CleanSummary};
pub use config::{Backend, BuildConfig, BuildMode, DEFAULT_TIMEOUT};
pub use deps::{alt_linker_versions, check_dependencies, CheckStatus, DependencyCheck, DependencyReport};
pub use error::{Result, ToolchainError};
pub use install::{ensure_target, ensure_tool, InstallOutcome, ToolInstall};
pub use runner::{
    CancelToken, Invocation, SystemRunner, Termination, ToolOutput, ToolRunner, QUERY_TIMEOUT,
};
