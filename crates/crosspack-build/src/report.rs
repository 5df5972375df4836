//! Per-target results and the aggregate run report.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crosspack_package::{PackageError, PackagedArtifact};
use crosspack_targets::PlatformToken;
use crosspack_toolchain::ToolchainError;
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Category of a per-target failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    TargetInstallFailed,
    ToolInstallFailed,
    BuildInvocationFailed,
    /// The build succeeded but the binary was not where expected.
    ArtifactNotFound,
    CompressionFailed,
    /// Backend cannot build this platform.
    Unsupported,
    Cancelled,
    Io,
}

/// Why a target did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl TargetFailure {
    pub fn cancelled() -> Self {
        Self {
            kind: FailureKind::Cancelled,
            message: "run cancelled before this target started".into(),
        }
    }
}

impl From<ToolchainError> for TargetFailure {
    fn from(err: ToolchainError) -> Self {
        let kind = match &err {
            ToolchainError::TargetInstallFailed { .. } => FailureKind::TargetInstallFailed,
            ToolchainError::ToolInstallFailed { .. } => FailureKind::ToolInstallFailed,
            ToolchainError::BuildInvocationFailed { .. }
            | ToolchainError::ToolMissing { .. }
            | ToolchainError::Spawn { .. } => FailureKind::BuildInvocationFailed,
            ToolchainError::ArtifactNotFound { .. } => FailureKind::ArtifactNotFound,
            ToolchainError::AltLinkerUnsupported { .. } => FailureKind::Unsupported,
            ToolchainError::Cancelled { .. } => FailureKind::Cancelled,
            ToolchainError::UnsafeOutputDir { .. } | ToolchainError::Io(_) => FailureKind::Io,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<PackageError> for TargetFailure {
    fn from(err: PackageError) -> Self {
        let kind = match &err {
            PackageError::CompressionFailed { .. } => FailureKind::CompressionFailed,
            PackageError::Io(_) => FailureKind::Io,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

/// Outcome of one target. The artifact exists iff the target succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TargetOutcome {
    Succeeded(PackagedArtifact),
    Failed(TargetFailure),
}

/// Result of building one platform token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetResult {
    pub token: PlatformToken,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
    #[serde(rename = "duration_secs", serialize_with = "serialize_secs")]
    pub duration: Duration,
}

impl TargetResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, TargetOutcome::Succeeded(_))
    }

    pub fn artifact(&self) -> Option<&PackagedArtifact> {
        match &self.outcome {
            TargetOutcome::Succeeded(artifact) => Some(artifact),
            TargetOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&TargetFailure> {
        match &self.outcome {
            TargetOutcome::Succeeded(_) => None,
            TargetOutcome::Failed(failure) => Some(failure),
        }
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Aggregate of one orchestration run, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    results: Vec<TargetResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_requested: usize,
    total_succeeded: usize,
}

impl BuildReport {
    /// Start a report for `total_requested` targets.
    pub fn begin(total_requested: usize) -> Self {
        let now = Utc::now();
        Self {
            results: Vec::with_capacity(total_requested),
            started_at: now,
            finished_at: now,
            total_requested,
            total_succeeded: 0,
        }
    }

    /// Append a completed target.
    pub fn push(&mut self, result: TargetResult) {
        if result.succeeded() {
            self.total_succeeded += 1;
        }
        self.results.push(result);
    }

    /// Stamp the finish time, never earlier than the start.
    pub fn finish(&mut self) {
        self.finished_at = Utc::now().max(self.started_at);
    }

    pub fn results(&self) -> &[TargetResult] {
        &self.results
    }

    /// Number of results that succeeded.
    pub fn total_succeeded(&self) -> usize {
        self.total_succeeded
    }

    pub fn all_succeeded(&self) -> bool {
        self.total_succeeded == self.total_requested
    }

    /// Process exit code: 0 iff every requested target succeeded.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    pub fn failed_tokens(&self) -> Vec<PlatformToken> {
        self.results
            .iter()
            .filter(|r| !r.succeeded())
            .map(|r| r.token)
            .collect()
    }

    /// Wall-clock duration of the run.
    pub fn elapsed(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Build Report ===")?;
        writeln!(f, "Started:  {}", self.started_at.to_rfc3339())?;
        writeln!(
            f,
            "Finished: {} ({:.1} s)",
            self.finished_at.to_rfc3339(),
            self.elapsed().as_secs_f64()
        )?;
        writeln!(f)?;

        for result in &self.results {
            let secs = result.duration.as_secs_f64();
            match &result.outcome {
                TargetOutcome::Succeeded(artifact) => writeln!(
                    f,
                    "  {:<14} ok      {secs:>6.1} s  {} ({} bytes, sha256 {})",
                    result.token.as_str(),
                    artifact.path.display(),
                    artifact.size_bytes,
                    artifact.checksum,
                )?,
                TargetOutcome::Failed(failure) => writeln!(
                    f,
                    "  {:<14} FAILED  {secs:>6.1} s  {}",
                    result.token.as_str(),
                    failure.message,
                )?,
            }
        }

        writeln!(f)?;
        writeln!(
            f,
            "Result: {}/{} targets succeeded",
            self.total_succeeded, self.total_requested
        )?;
        let failed = self.failed_tokens();
        if !failed.is_empty() {
            let names: Vec<&str> = failed.iter().map(|t| t.as_str()).collect();
            writeln!(f, "Failed: {}", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspack_package::ContentHash;
    use crosspack_toolchain::BuildRoute;
    use std::path::PathBuf;

    fn success(token: PlatformToken) -> TargetResult {
        TargetResult {
            token,
            outcome: TargetOutcome::Succeeded(PackagedArtifact {
                path: PathBuf::from("build/remote_server.linux.x86_64.gz"),
                size_bytes: 1234,
                checksum: ContentHash::compute(b"artifact"),
                compressed: true,
            }),
            duration: Duration::from_millis(1500),
        }
    }

    fn failure(token: PlatformToken) -> TargetResult {
        TargetResult {
            token,
            outcome: TargetOutcome::Failed(
                ToolchainError::BuildInvocationFailed {
                    token,
                    route: BuildRoute::AltLinker,
                    exit_code: Some(1),
                    timed_out: false,
                }
                .into(),
            ),
            duration: Duration::from_millis(200),
        }
    }

    #[test]
    fn totals_and_exit_code() {
        let mut report = BuildReport::begin(2);
        report.push(success(PlatformToken::LinuxAmd64));
        assert_eq!(report.exit_code(), 1);
        report.push(failure(PlatformToken::DarwinArm64));
        report.finish();

        assert_eq!(report.total_succeeded, 1);
        assert!(!report.all_succeeded());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failed_tokens(), vec![PlatformToken::DarwinArm64]);
        assert!(report.finished_at >= report.started_at);
        assert!(report.results[0].artifact().is_some());
        assert!(report.results[1].artifact().is_none());
        assert_eq!(
            report.results[1].failure().unwrap().kind,
            FailureKind::BuildInvocationFailed
        );
    }

    #[test]
    fn all_succeeded_exits_zero() {
        let mut report = BuildReport::begin(1);
        report.push(success(PlatformToken::LinuxAmd64));
        report.finish();
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn display_names_failed_targets() {
        let mut report = BuildReport::begin(2);
        report.push(success(PlatformToken::LinuxAmd64));
        report.push(failure(PlatformToken::DarwinArm64));
        report.finish();

        let output = format!("{report}");
        assert!(output.contains("=== Build Report ==="));
        assert!(output.contains("linux-amd64"));
        assert!(output.contains("remote_server.linux.x86_64.gz"));
        assert!(output.contains("zig build for darwin-arm64 failed (exit code 1)"));
        assert!(output.contains("Result: 1/2 targets succeeded"));
        assert!(output.contains("Failed: darwin-arm64"));
    }

    #[test]
    fn json_shape() {
        let mut report = BuildReport::begin(2);
        report.push(success(PlatformToken::LinuxAmd64));
        report.push(failure(PlatformToken::DarwinArm64));
        report.finish();

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["total_requested"], 2);
        assert_eq!(value["total_succeeded"], 1);
        let first = &value["results"][0];
        assert_eq!(first["token"], "linux-amd64");
        assert_eq!(first["status"], "succeeded");
        assert_eq!(first["size_bytes"], 1234);
        assert_eq!(first["duration_secs"], 1.5);
        let second = &value["results"][1];
        assert_eq!(second["status"], "failed");
        assert_eq!(second["kind"], "build-invocation-failed");
    }

    #[test]
    fn package_errors_classified() {
        let failure: TargetFailure = PackageError::CompressionFailed {
            path: PathBuf::from("x"),
            detail: "boom".into(),
        }
        .into();
        assert_eq!(failure.kind, FailureKind::CompressionFailed);
    }

    #[test]
    fn write_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut report = BuildReport::begin(0);
        report.finish();
        report.write_json(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"results\": []"));
    }
}
