//! Multi-target build orchestration for crosspack.
//!
//! Reads the project manifest, resolves platform tokens, checks the
//! toolchain and then builds and packages each target in turn. Failures
//! inside one target are recorded in the [`BuildReport`] and never stop the
//! remaining targets.

pub mod error;
pub mod manifest;
pub mod orchestrator;
pub mod report;

pub use error::{BuildError, Result};
pub use manifest::{CargoManifest, ProjectIdentity, Settings};
pub use orchestrator::{resolve_tokens, BuildPlan, Orchestrator};
pub use report::{BuildReport, FailureKind, TargetFailure, TargetOutcome, TargetResult};
