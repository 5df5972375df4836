//! Dependency checks for a build configuration.

use std::fmt;

use semver::Version;

use crate::config::{Backend, BuildConfig};
use crate::install::{ensure_tool, ToolInstall};
use crate::runner::{Invocation, ToolRunner};

/// Oldest zig release known to link every registered platform.
pub const MIN_ZIG_VERSION: Version = Version::new(0, 11, 0);

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    /// Usable, but worth the user's attention. Never blocks a build.
    Warn,
    Fail,
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "FAIL",
        })
    }
}

/// One verified dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

impl DependencyCheck {
    fn new(name: &str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            detail: detail.into(),
        }
    }
}

/// All checks implied by a configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyReport {
    pub checks: Vec<DependencyCheck>,
}

impl DependencyReport {
    /// False iff any check failed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }

    pub fn failures(&self) -> impl Iterator<Item = &DependencyCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Fail)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DependencyCheck> {
        self.checks.iter().filter(|c| c.status == CheckStatus::Warn)
    }

    /// Look up a check by name.
    pub fn get(&self, name: &str) -> Option<&DependencyCheck> {
        self.checks.iter().find(|c| c.name == name)
    }
}

impl fmt::Display for DependencyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Dependencies ---")?;
        for check in &self.checks {
            writeln!(f, "  {:<16} [{:>4}] {}", check.name, check.status, check.detail)?;
        }
        writeln!(
            f,
            "Result: {}",
            if self.passed() { "PASSED" } else { "FAILED" }
        )
    }
}

/// Verify every tool the configuration needs.
///
/// Each check runs independently; a failure in one does not skip the others.
pub fn check_dependencies(config: &BuildConfig, runner: &dyn ToolRunner) -> DependencyReport {
    let mut checks = vec![check_tool(runner, "cargo", "cargo", &["--version"])];

    match config.backend {
        Backend::Direct => {
            let rustup = if runner.locate("rustup").is_some() {
                DependencyCheck::new("rustup", CheckStatus::Pass, "found")
            } else {
                DependencyCheck::new(
                    "rustup",
                    CheckStatus::Warn,
                    "not found; cross targets must already be installed",
                )
            };
            checks.push(rustup);
        }
        Backend::AltLinker => {
            checks.push(check_zig(runner));
            checks.push(check_tool(
                runner,
                "cargo-zigbuild",
                "cargo-zigbuild",
                &["zigbuild", "--version"],
            ));
        }
        Backend::Container => {
            checks.push(check_container_runtime(runner));
            checks.push(check_cross(config, runner));
        }
    }

    if config.compress {
        checks.push(check_tool(runner, "gzip", "gzip", &["--version"]));
    }

    DependencyReport { checks }
}

/// Version lines of the alternate-linker toolchain, `None` where a tool is missing.
pub fn alt_linker_versions(runner: &dyn ToolRunner) -> Vec<(&'static str, Option<String>)> {
    [
        ("zig", Invocation::query("zig", ["version"])),
        ("cargo-zigbuild", Invocation::query("cargo-zigbuild", ["zigbuild", "--version"])),
    ]
    .into_iter()
    .map(|(name, query)| {
        let version = runner
            .locate(&query.program)
            .and_then(|_| runner.run(&query).ok())
            .filter(|out| out.success())
            .and_then(|out| out.first_line().map(str::to_string));
        (name, version)
    })
    .collect()
}

fn check_tool(runner: &dyn ToolRunner, name: &str, program: &str, args: &[&str]) -> DependencyCheck {
    if runner.locate(program).is_none() {
        return DependencyCheck::new(name, CheckStatus::Fail, "not found");
    }
    match runner.run(&Invocation::query(program, args.iter().copied())) {
        Ok(out) if out.success() => DependencyCheck::new(
            name,
            CheckStatus::Pass,
            out.first_line().unwrap_or("found"),
        ),
        Ok(out) => DependencyCheck::new(
            name,
            CheckStatus::Fail,
            format!("exited with {:?}", out.exit_code),
        ),
        Err(e) => DependencyCheck::new(name, CheckStatus::Fail, e.to_string()),
    }
}

fn check_zig(runner: &dyn ToolRunner) -> DependencyCheck {
    let check = check_tool(runner, "zig", "zig", &["version"]);
    if check.status != CheckStatus::Pass {
        return check;
    }
    match Version::parse(check.detail.trim()) {
        Ok(version) if version < MIN_ZIG_VERSION => DependencyCheck::new(
            "zig",
            CheckStatus::Warn,
            format!("{version} is older than {MIN_ZIG_VERSION}"),
        ),
        Ok(version) => DependencyCheck::new("zig", CheckStatus::Pass, version.to_string()),
        Err(_) => DependencyCheck::new(
            "zig",
            CheckStatus::Warn,
            format!("unrecognized version '{}'", check.detail),
        ),
    }
}

fn check_container_runtime(runner: &dyn ToolRunner) -> DependencyCheck {
    for runtime in ["docker", "podman"] {
        if runner.locate(runtime).is_none() {
            continue;
        }
        if let Ok(out) = runner.run(&Invocation::query(runtime, ["info"])) {
            if out.success() {
                return DependencyCheck::new(
                    "container",
                    CheckStatus::Pass,
                    format!("{runtime} reachable"),
                );
            }
        }
    }
    DependencyCheck::new(
        "container",
        CheckStatus::Fail,
        "no reachable docker or podman daemon",
    )
}

fn check_cross(config: &BuildConfig, runner: &dyn ToolRunner) -> DependencyCheck {
    match ensure_tool("cross", "cross", config.timeout, runner) {
        Ok(ToolInstall::Present) => DependencyCheck::new("cross", CheckStatus::Pass, "found"),
        Ok(ToolInstall::Installed) => {
            DependencyCheck::new("cross", CheckStatus::Pass, "installed with cargo install")
        }
        Err(e) => DependencyCheck::new("cross", CheckStatus::Fail, e.to_string()),
    }
}
