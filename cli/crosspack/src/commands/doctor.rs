//! `crosspack --check-deps` and `--zig-version`: toolchain diagnostics.

use crosspack_toolchain::{alt_linker_versions, check_dependencies, BuildConfig, ToolRunner};

/// Check every tool `config` needs and print the table.
///
/// Returns the process exit code: 0 iff nothing failed.
pub fn check_deps(config: &BuildConfig, runner: &dyn ToolRunner) -> i32 {
    println!("=== crosspack dependency check ===");
    println!("Backend: {}", config.backend);
    println!();

    let report = check_dependencies(config, runner);
    print!("{report}");
    if report.passed() {
        0
    } else {
        1
    }
}

/// Print the versions of the alternate-linker toolchain.
pub fn zig_version(runner: &dyn ToolRunner) {
    for (name, version) in alt_linker_versions(runner) {
        match version {
            Some(v) => println!("{name}: {v}"),
            None => println!("{name}: not found"),
        }
    }
}
