//! Toolchain error types.

use std::path::PathBuf;

use crosspack_targets::PlatformToken;

use crate::backend::BuildRoute;

/// Errors that can occur while invoking the toolchain.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// A required executable is not on `PATH`.
    #[error("tool not found: {tool}")]
    ToolMissing { tool: String },

    /// The executable exists but could not be started.
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// `rustup target add` failed while installation was forced.
    #[error("failed to install target {triple}: {detail}")]
    TargetInstallFailed { triple: String, detail: String },

    /// A helper tool (e.g. `cross`) could not be installed.
    #[error("failed to install {tool}: {detail}")]
    ToolInstallFailed { tool: String, detail: String },

    /// The build command exited unsuccessfully. `route` is the branch that ran.
    #[error(
        "{route} build for {token} failed{}",
        describe_exit(.exit_code, .timed_out)
    )]
    BuildInvocationFailed {
        token: PlatformToken,
        route: BuildRoute,
        exit_code: Option<i32>,
        timed_out: bool,
    },

    /// The build reported success but the binary is not where expected.
    #[error("build succeeded but artifact not found at {}", expected.display())]
    ArtifactNotFound { expected: PathBuf },

    /// The alternate-linker backend was selected for a platform zig cannot link.
    #[error("platform {token} is not supported by the zig backend")]
    AltLinkerUnsupported { token: PlatformToken },

    /// Cleaning would delete the project it was asked to clean.
    #[error("refusing to clean {}: it contains the source directory", path.display())]
    UnsafeOutputDir { path: PathBuf },

    /// The run was cancelled while the invocation was in flight.
    #[error("{tool} was cancelled")]
    Cancelled { tool: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(exit_code: &Option<i32>, timed_out: &bool) -> String {
    match (*timed_out, *exit_code) {
        (true, _) => " (timed out)".to_string(),
        (false, Some(code)) => format!(" (exit code {code})"),
        (false, None) => " (terminated by signal)".to_string(),
    }
}

/// Result type for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_failure_messages() {
        let err = ToolchainError::BuildInvocationFailed {
            token: PlatformToken::LinuxArm64,
            route: BuildRoute::Container,
            exit_code: Some(101),
            timed_out: false,
        };
        assert_eq!(
            err.to_string(),
            "container build for linux-arm64 failed (exit code 101)"
        );

        let err = ToolchainError::BuildInvocationFailed {
            token: PlatformToken::LinuxArm64,
            route: BuildRoute::Local,
            exit_code: None,
            timed_out: true,
        };
        assert_eq!(err.to_string(), "local build for linux-arm64 failed (timed out)");
    }
}
