//! `crosspack --clean`: remove build outputs.

use std::path::Path;

use anyhow::{Context, Result};
use crosspack_toolchain::{clean, ToolRunner};

/// Remove `target/`, packaged artifacts and cargo's cache for `source_dir`.
pub fn run(source_dir: &Path, output_dir: &Path, runner: &dyn ToolRunner) -> Result<()> {
    let summary = clean(source_dir, output_dir, runner)
        .with_context(|| format!("failed to clean {}", source_dir.display()))?;

    if summary.removed.is_empty() {
        println!("Already clean: nothing to remove");
    }
    for path in &summary.removed {
        println!("Removed {}", path.display());
    }
    if let Some(dir) = &summary.kept {
        println!("Kept {}: it holds files crosspack did not write", dir.display());
    }
    if !summary.cache_purged {
        println!("cargo clean failed; see log for details");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosspack_toolchain::testing::FakeRunner;
    use std::fs;

    #[test]
    fn clean_removes_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dist");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("remote_server.linux.x86_64.gz"), b"data").unwrap();

        run(dir.path(), &out, &FakeRunner::new()).unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn clean_refuses_the_project_as_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Cargo.toml"), b"[package]\n").unwrap();

        let err = run(dir.path(), dir.path(), &FakeRunner::new()).unwrap_err();
        assert!(format!("{err:#}").contains("refusing to clean"));
        assert!(dir.path().join("Cargo.toml").is_file());
    }

    #[test]
    fn clean_handles_already_clean() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &dir.path().join("build"), &FakeRunner::new()).unwrap();
    }
}
