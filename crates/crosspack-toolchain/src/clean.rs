//! Removal of build output and toolchain caches.

use std::fs;
use std::path::{Path, PathBuf};

use crosspack_targets::list_known;
use tracing::{info, warn};

use crate::error::{Result, ToolchainError};
use crate::runner::{Invocation, ToolRunner};

/// What [`clean`] removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub removed: Vec<PathBuf>,
    /// Set when the output directory still holds files crosspack did not write.
    pub kept: Option<PathBuf>,
    /// Whether `cargo clean` succeeded.
    pub cache_purged: bool,
}

/// Remove `<source_dir>/target` and the packaged artifacts in `output_dir`,
/// then run `cargo clean`.
///
/// `output_dir` itself is removed only once it is empty. An output directory
/// that contains `source_dir` is refused before anything is touched. A
/// failing `cargo clean` is logged and otherwise ignored.
pub fn clean(source_dir: &Path, output_dir: &Path, runner: &dyn ToolRunner) -> Result<CleanSummary> {
    check_output_dir(source_dir, output_dir)?;
    let mut summary = CleanSummary::default();

    let target = source_dir.join("target");
    if target.exists() {
        fs::remove_dir_all(&target)?;
        info!(path = %target.display(), "removed");
        summary.removed.push(target);
    }

    if output_dir.is_dir() {
        clean_output_dir(output_dir, &mut summary)?;
    }

    match runner.run(&Invocation::query("cargo", ["clean"]).current_dir(source_dir)) {
        Ok(out) if out.success() => summary.cache_purged = true,
        Ok(out) => warn!(exit_code = ?out.exit_code, "cargo clean failed"),
        Err(e) => warn!(error = %e, "cargo clean failed"),
    }

    Ok(summary)
}

fn check_output_dir(source_dir: &Path, output_dir: &Path) -> Result<()> {
    if !output_dir.exists() || !source_dir.exists() {
        return Ok(());
    }
    let source = fs::canonicalize(source_dir)?;
    let output = fs::canonicalize(output_dir)?;
    if source.starts_with(&output) {
        return Err(ToolchainError::UnsafeOutputDir {
            path: output_dir.to_path_buf(),
        });
    }
    Ok(())
}

fn clean_output_dir(output_dir: &Path, summary: &mut CleanSummary) -> Result<()> {
    let mut artifacts = Vec::new();
    let mut foreign = 0usize;
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        match name.to_str() {
            Some(name) if entry.file_type()?.is_file() && is_packaged_name(name) => {
                artifacts.push(entry.path())
            }
            _ => foreign += 1,
        }
    }

    for path in &artifacts {
        fs::remove_file(path)?;
    }

    if foreign == 0 {
        fs::remove_dir(output_dir)?;
        info!(path = %output_dir.display(), "removed");
        summary.removed.push(output_dir.to_path_buf());
    } else {
        warn!(
            path = %output_dir.display(),
            others = foreign,
            "output directory holds other files, leaving it in place"
        );
        for path in &artifacts {
            info!(path = %path.display(), "removed");
        }
        summary.removed.extend(artifacts);
        summary.kept = Some(output_dir.to_path_buf());
    }
    Ok(())
}

/// `<project>.<os>.<arch_label>`, optionally followed by `.gz` and a staging `.tmp`.
fn is_packaged_name(name: &str) -> bool {
    let name = name.strip_suffix(".tmp").unwrap_or(name);
    let name = name.strip_suffix(".gz").unwrap_or(name);
    list_known().iter().any(|spec| {
        let tail = format!(".{}.{}", spec.token.os(), spec.arch_label);
        name.strip_suffix(tail.as_str())
            .is_some_and(|project| !project.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeResponse, FakeRunner};

    #[test]
    fn removes_target_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("target/debug");
        let out = dir.path().join("build");
        fs::create_dir_all(&target).unwrap();
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("app.linux.x86_64"), b"data").unwrap();
        fs::write(out.join("app.windows.x86_64.gz"), b"data").unwrap();
        fs::write(out.join("app.darwin.aarch64.gz.tmp"), b"data").unwrap();

        let runner = FakeRunner::new();
        let summary = clean(dir.path(), &out, &runner).unwrap();
        assert!(!dir.path().join("target").exists());
        assert!(!out.exists());
        assert_eq!(summary.removed, vec![dir.path().join("target"), out]);
        assert_eq!(summary.kept, None);
        assert!(summary.cache_purged);
        assert_eq!(runner.calls_to("cargo")[0].args, vec!["clean"]);
    }

    #[test]
    fn already_clean() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::new();
        let summary = clean(dir.path(), &dir.path().join("build"), &runner).unwrap();
        assert!(summary.removed.is_empty());
    }

    #[test]
    fn cargo_clean_failure_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();

        let failing = FakeRunner::new().exit("cargo", Some("clean"), 101, "");
        let summary = clean(dir.path(), &dir.path().join("build"), &failing).unwrap();
        assert!(!summary.cache_purged);
        assert_eq!(summary.removed, vec![dir.path().join("target")]);

        let missing = FakeRunner::new().on("cargo", None, FakeResponse::Missing);
        assert!(clean(dir.path(), &dir.path().join("build"), &missing).is_ok());
    }

    #[test]
    fn output_dir_holding_the_project_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("project");
        fs::create_dir_all(source.join("target")).unwrap();
        fs::write(source.join("Cargo.toml"), b"[package]\n").unwrap();

        for output in [source.clone(), dir.path().to_path_buf(), source.join(".")] {
            let runner = FakeRunner::new();
            let err = clean(&source, &output, &runner).unwrap_err();
            assert!(matches!(err, ToolchainError::UnsafeOutputDir { .. }));
            assert!(runner.calls().is_empty());
        }
        assert!(source.join("Cargo.toml").is_file());
        assert!(source.join("target").is_dir());
    }

    #[test]
    fn foreign_files_survive() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("shared");
        fs::create_dir_all(out.join("cmake")).unwrap();
        fs::write(out.join("CMakeCache.txt"), b"cache").unwrap();
        fs::write(out.join("notes.gz"), b"keep").unwrap();
        fs::write(out.join("remote_server.linux.armv7.gz"), b"data").unwrap();

        let summary = clean(dir.path(), &out, &FakeRunner::new()).unwrap();
        assert!(out.join("CMakeCache.txt").is_file());
        assert!(out.join("notes.gz").is_file());
        assert!(out.join("cmake").is_dir());
        assert!(!out.join("remote_server.linux.armv7.gz").exists());
        assert_eq!(summary.removed, vec![out.join("remote_server.linux.armv7.gz")]);
        assert_eq!(summary.kept, Some(out));
    }

    #[test]
    fn packaged_names() {
        assert!(is_packaged_name("remote_server.linux.x86_64"));
        assert!(is_packaged_name("remote_server.windows.aarch64.gz"));
        assert!(is_packaged_name("a.darwin.x86_64.gz.tmp"));
        assert!(!is_packaged_name(".linux.x86_64"));
        assert!(!is_packaged_name("remote_server.linux.riscv64"));
        assert!(!is_packaged_name("Cargo.toml"));
    }
}
