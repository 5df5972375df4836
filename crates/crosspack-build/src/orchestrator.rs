//! Drives dependency checks, builds and packaging across targets.
//!
//! `Init -> DependencyCheck -> [per target: Install -> Build -> Package] -> Aggregate -> Done`
//!
//! Dependency failures end the run before any target starts. Anything that
//! goes wrong inside a target is recorded in that target's result and the
//! next target proceeds.

use std::time::{Duration, Instant};

use crosspack_package::{package, Compressor, PackageOptions, PackagedArtifact};
use crosspack_targets::{detect_host, PlatformToken};
use crosspack_toolchain::{
    build_target, check_dependencies, BuildConfig, BuildRequest, CancelToken, ToolRunner,
};
use tracing::{info, warn};

use crate::error::{BuildError, Result};
use crate::manifest::ProjectIdentity;
use crate::report::{BuildReport, TargetFailure, TargetOutcome, TargetResult};

/// Everything one run builds.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub config: BuildConfig,
    /// Targets in build order.
    pub tokens: Vec<PlatformToken>,
    pub project: ProjectIdentity,
}

/// Turn user-supplied names into tokens.
///
/// `all` selects the whole registry in registry order. Otherwise names keep
/// their order, duplicates are dropped, and one unknown name fails the whole
/// list before anything is built.
pub fn resolve_tokens(names: &[String], all: bool) -> Result<Vec<PlatformToken>> {
    if all {
        return Ok(PlatformToken::ALL.to_vec());
    }
    if names.is_empty() {
        return Err(BuildError::InvalidArgument {
            detail: "no platforms given; name one or more, use --all, or set targets in [package.metadata.crosspack]".into(),
        });
    }

    let mut tokens = Vec::with_capacity(names.len());
    for name in names {
        let token: PlatformToken = name.parse()?;
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    Ok(tokens)
}

/// Runs a [`BuildPlan`] against a toolchain.
pub struct Orchestrator<'a> {
    runner: &'a dyn ToolRunner,
    compressor: &'a dyn Compressor,
    host: Option<PlatformToken>,
    cancel: CancelToken,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator for the machine this process runs on.
    pub fn new(runner: &'a dyn ToolRunner, compressor: &'a dyn Compressor) -> Self {
        let host = match detect_host() {
            Ok(host) => Some(host),
            Err(e) => {
                warn!(error = %e, "host not recognized, every target will be cross-compiled");
                None
            }
        };
        Self {
            runner,
            compressor,
            host,
            cancel: CancelToken::default(),
        }
    }

    /// Override the detected host.
    pub fn with_host(mut self, host: Option<PlatformToken>) -> Self {
        self.host = host;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Check dependencies, then build every target in the plan.
    pub fn run(&self, plan: &BuildPlan) -> Result<BuildReport> {
        info!(
            targets = plan.tokens.len(),
            backend = %plan.config.backend,
            mode = %plan.config.mode,
            "starting build"
        );

        let deps = check_dependencies(&plan.config, self.runner);
        for check in deps.warnings() {
            warn!(dependency = %check.name, detail = %check.detail, "dependency warning");
        }
        if !deps.passed() {
            return Err(BuildError::DependencyUnsatisfied {
                failed: deps
                    .failures()
                    .map(|c| format!("{}: {}", c.name, c.detail))
                    .collect(),
            });
        }

        Ok(self.build_targets(plan))
    }

    /// Build every target in order, recording each outcome.
    pub fn build_targets(&self, plan: &BuildPlan) -> BuildReport {
        let mut report = BuildReport::begin(plan.tokens.len());

        for &token in &plan.tokens {
            if self.cancel.is_cancelled() {
                report.push(TargetResult {
                    token,
                    outcome: TargetOutcome::Failed(TargetFailure::cancelled()),
                    duration: Duration::ZERO,
                });
                continue;
            }

            let started = Instant::now();
            let outcome = match self.build_one(plan, token) {
                Ok(artifact) => TargetOutcome::Succeeded(artifact),
                Err(failure) => {
                    warn!(%token, kind = ?failure.kind, "{}", failure.message);
                    TargetOutcome::Failed(failure)
                }
            };
            report.push(TargetResult {
                token,
                outcome,
                duration: started.elapsed(),
            });
        }

        report.finish();
        info!(
            succeeded = report.total_succeeded(),
            requested = report.total_requested,
            "build finished"
        );
        report
    }

    fn build_one(
        &self,
        plan: &BuildPlan,
        token: PlatformToken,
    ) -> std::result::Result<PackagedArtifact, TargetFailure> {
        let request = BuildRequest {
            config: &plan.config,
            token,
            binary_name: &plan.project.binary,
            host: self.host,
        };
        let built = build_target(&request, self.runner)?;

        let options = PackageOptions {
            output_dir: &plan.config.output_dir,
            project_name: &plan.project.name,
            compress: plan.config.compress,
        };
        Ok(package(&built.path, token.spec(), &options, self.compressor)?)
    }
}
