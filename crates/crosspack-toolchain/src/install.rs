//! Installation of rustup targets and helper tools.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{Result, ToolchainError};
use crate::runner::{Invocation, ToolRunner};

/// What [`ensure_target`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// rustup is not available; nothing was attempted.
    Skipped,
    AlreadyInstalled,
    Installed,
    /// Installation failed but was not forced; the build goes ahead.
    FailedTolerated,
}

/// Make sure the standard library for `triple` is installed.
///
/// Any failure, including rustup itself failing to run, is an error only
/// when `force` is set.
pub fn ensure_target(
    triple: &str,
    force: bool,
    timeout: Option<Duration>,
    runner: &dyn ToolRunner,
) -> Result<InstallOutcome> {
    if runner.locate("rustup").is_none() {
        return Ok(InstallOutcome::Skipped);
    }

    let listed = match runner.run(&Invocation::query("rustup", ["target", "list", "--installed"])) {
        Ok(listed) => listed,
        Err(e) => return install_failed(triple, force, e.to_string()),
    };
    if listed.success() && listed.stdout.lines().any(|l| l.trim() == triple) {
        return Ok(InstallOutcome::AlreadyInstalled);
    }

    info!(triple, "installing rustup target");
    let added = match runner.run(
        &Invocation::query("rustup", ["target", "add", triple]).timeout(timeout),
    ) {
        Ok(added) => added,
        Err(e) => return install_failed(triple, force, e.to_string()),
    };
    if added.success() {
        return Ok(InstallOutcome::Installed);
    }

    let detail = match (added.timed_out(), added.first_line()) {
        (true, _) => "rustup target add timed out".to_string(),
        (false, Some(line)) => line.to_string(),
        (false, None) => "rustup target add failed".to_string(),
    };
    install_failed(triple, force, detail)
}

fn install_failed(triple: &str, force: bool, detail: String) -> Result<InstallOutcome> {
    if force {
        return Err(ToolchainError::TargetInstallFailed {
            triple: triple.to_string(),
            detail,
        });
    }
    warn!(triple, %detail, "target installation failed, continuing");
    Ok(InstallOutcome::FailedTolerated)
}

/// Whether [`ensure_tool`] had to install anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolInstall {
    Present,
    Installed,
}

/// Make sure `tool` is on `PATH`, installing `crate_name` with `cargo install` if not.
pub fn ensure_tool(
    tool: &str,
    crate_name: &str,
    timeout: Option<Duration>,
    runner: &dyn ToolRunner,
) -> Result<ToolInstall> {
    if runner.locate(tool).is_some() {
        return Ok(ToolInstall::Present);
    }

    info!(tool, "not found, running cargo install {crate_name}");
    let output = runner
        .run(&Invocation::new("cargo").args(["install", crate_name]).timeout(timeout))
        .map_err(|e| ToolchainError::ToolInstallFailed {
            tool: tool.to_string(),
            detail: e.to_string(),
        })?;
    if !output.success() {
        return Err(ToolchainError::ToolInstallFailed {
            tool: tool.to_string(),
            detail: match output.exit_code {
                Some(code) => format!("cargo install {crate_name} exited with {code}"),
                None => format!("cargo install {crate_name} did not finish"),
            },
        });
    }
    Ok(ToolInstall::Installed)
}
