//! Build backend selection and invocation.

use std::fmt;
use std::path::{Path, PathBuf};

use crosspack_targets::{PlatformSpec, PlatformToken};
use tracing::info;

use crate::config::{Backend, BuildConfig};
use crate::error::{Result, ToolchainError};
use crate::install::{ensure_target, ensure_tool};
use crate::runner::{Invocation, Termination, ToolRunner};

/// Which branch of the selector built a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildRoute {
    /// Host build without `--target`.
    Local,
    Container,
    AltLinker,
    /// Cross build through rustup-installed targets.
    Direct,
}

impl fmt::Display for BuildRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildRoute::Local => "local",
            BuildRoute::Container => "container",
            BuildRoute::AltLinker => "zig",
            BuildRoute::Direct => "direct",
        })
    }
}

/// Everything needed to build one target.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub config: &'a BuildConfig,
    pub token: PlatformToken,
    /// Name of the binary cargo produces, without extension.
    pub binary_name: &'a str,
    /// The detected host, `None` when detection failed.
    pub host: Option<PlatformToken>,
}

/// A binary produced by the toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArtifact {
    pub path: PathBuf,
    pub route: BuildRoute,
}

/// Pick the route for a request, rejecting unsupported combinations.
///
/// Runs no subprocess.
pub fn select_route(request: &BuildRequest<'_>) -> Result<BuildRoute> {
    let spec = request.token.spec();
    if request.config.backend == Backend::AltLinker && spec.alt_linker_triple.is_none() {
        return Err(ToolchainError::AltLinkerUnsupported {
            token: request.token,
        });
    }

    if request.host == Some(request.token) {
        return Ok(BuildRoute::Local);
    }
    Ok(match request.config.backend {
        Backend::Container => BuildRoute::Container,
        Backend::AltLinker => BuildRoute::AltLinker,
        Backend::Direct => BuildRoute::Direct,
    })
}

/// Where cargo leaves the binary for `route`.
pub fn artifact_path(request: &BuildRequest<'_>, route: BuildRoute) -> PathBuf {
    let spec = request.token.spec();
    let file_name = format!("{}{}", request.binary_name, request.token.os().exe_suffix());
    let root = request.config.target_root();
    let mode = request.config.mode.dir_name();
    match route {
        BuildRoute::Local => root.join(mode).join(file_name),
        BuildRoute::Container | BuildRoute::AltLinker | BuildRoute::Direct => {
            root.join(spec.host_triple).join(mode).join(file_name)
        }
    }
}

/// Build one target and return the path of the produced binary.
pub fn build_target(request: &BuildRequest<'_>, runner: &dyn ToolRunner) -> Result<BuiltArtifact> {
    let route = select_route(request)?;
    let spec = request.token.spec();
    let config = request.config;
    // Pinned so CARGO_TARGET_DIR or a configured build.target-dir cannot move
    // the artifact away from `artifact_path`.
    let target_dir = std::path::absolute(config.target_root())?;

    let invocation = match route {
        BuildRoute::Local => cargo_build(config, &target_dir, "cargo", &["build"], None),
        BuildRoute::Container => {
            ensure_tool("cross", "cross", config.timeout, runner)?;
            cargo_build(config, &target_dir, "cross", &["build"], Some(spec))
        }
        BuildRoute::AltLinker => {
            let mut invocation = cargo_build(config, &target_dir, "cargo", &["zigbuild"], Some(spec));
            if let Some(zig_target) = spec.alt_linker_triple {
                let suffix = spec.host_triple.replace('-', "_");
                invocation = invocation
                    .env(format!("CC_{suffix}"), format!("zig cc -target {zig_target}"))
                    .env(format!("CXX_{suffix}"), format!("zig c++ -target {zig_target}"));
            }
            invocation
        }
        BuildRoute::Direct => {
            ensure_target(
                spec.host_triple,
                config.force_install_targets,
                config.timeout,
                runner,
            )?;
            cargo_build(config, &target_dir, "cargo", &["build"], Some(spec))
        }
    };

    info!(token = %request.token, %route, "building");
    let output = runner.run(&invocation)?;
    match output.termination {
        Termination::Cancelled => {
            return Err(ToolchainError::Cancelled {
                tool: invocation.program,
            })
        }
        Termination::Exited | Termination::TimedOut if !output.success() => {
            return Err(ToolchainError::BuildInvocationFailed {
                token: request.token,
                route,
                exit_code: output.exit_code,
                timed_out: output.timed_out(),
            })
        }
        _ => {}
    }

    let path = artifact_path(request, route);
    if !path.is_file() {
        return Err(ToolchainError::ArtifactNotFound { expected: path });
    }
    Ok(BuiltArtifact { path, route })
}

fn cargo_build(
    config: &BuildConfig,
    target_dir: &Path,
    program: &str,
    subcommand: &[&str],
    target: Option<&PlatformSpec>,
) -> Invocation {
    let mut invocation = Invocation::new(program)
        .args(subcommand.iter().copied())
        .current_dir(&config.source_dir)
        .timeout(config.timeout)
        .arg("--target-dir")
        .arg(target_dir.display().to_string());
    if let Some(spec) = target {
        invocation = invocation.args(["--target", spec.host_triple]);
    }
    invocation.args(config.profile_args())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildMode;
    use crate::testing::{FakeResponse, FakeRunner};

    fn config(dir: &Path, backend: Backend) -> BuildConfig {
        let mut config = BuildConfig::new(dir, dir.join("out"));
        config.backend = backend;
        config
    }

    fn request(config: &BuildConfig, token: PlatformToken, host: Option<PlatformToken>) -> BuildRequest<'_> {
        BuildRequest {
            config,
            token,
            binary_name: "remote_server",
            host,
        }
    }

    fn target_dir(source: &Path) -> String {
        source.join("target").display().to_string()
    }

    fn writes(path: PathBuf) -> FakeResponse {
        FakeResponse::Write {
            path,
            contents: b"\x7fELF".to_vec(),
        }
    }

    #[test]
    fn local_build_uses_host_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Container);
        let req = request(&config, PlatformToken::LinuxAmd64, Some(PlatformToken::LinuxAmd64));
        let expected = dir.path().join("target/debug/remote_server");
        let runner = FakeRunner::new().on("cargo", Some("build"), writes(expected.clone()));

        let built = build_target(&req, &runner).unwrap();
        assert_eq!(built.route, BuildRoute::Local);
        assert_eq!(built.path, expected);

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].args,
            vec!["build".to_string(), "--target-dir".into(), target_dir(dir.path())]
        );
        assert_eq!(calls[0].cwd.as_deref(), Some(dir.path()));
    }

    #[test]
    fn direct_cross_build_installs_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), Backend::Direct);
        config.mode = BuildMode::Release;
        let req = request(&config, PlatformToken::WindowsAmd64, Some(PlatformToken::LinuxAmd64));
        let expected = dir
            .path()
            .join("target/x86_64-pc-windows-gnu/release/remote_server.exe");
        let runner = FakeRunner::new()
            .with_tools(["rustup"])
            .exit("rustup", Some("--installed"), 0, "")
            .on("cargo", Some("build"), writes(expected.clone()));

        let built = build_target(&req, &runner).unwrap();
        assert_eq!(built.route, BuildRoute::Direct);
        assert_eq!(built.path, expected);

        let rustup = runner.calls_to("rustup");
        assert_eq!(rustup[1].args, vec!["target", "add", "x86_64-pc-windows-gnu"]);
        let cargo = runner.calls_to("cargo");
        assert_eq!(
            cargo[0].args,
            vec![
                "build".to_string(),
                "--target-dir".into(),
                target_dir(dir.path()),
                "--target".into(),
                "x86_64-pc-windows-gnu".into(),
                "--release".into(),
            ]
        );
    }

    #[test]
    fn container_build_installs_cross_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Container);
        let req = request(&config, PlatformToken::LinuxArm64, None);
        let expected = dir
            .path()
            .join("target/aarch64-unknown-linux-gnu/debug/remote_server");
        let runner = FakeRunner::new().on("cross", Some("build"), writes(expected.clone()));

        let built = build_target(&req, &runner).unwrap();
        assert_eq!(built.route, BuildRoute::Container);
        let calls = runner.calls();
        assert_eq!(calls[0].program, "cargo");
        assert_eq!(calls[0].args, vec!["install", "cross"]);
        assert_eq!(calls[1].program, "cross");
        assert_eq!(
            calls[1].args,
            vec![
                "build".to_string(),
                "--target-dir".into(),
                target_dir(dir.path()),
                "--target".into(),
                "aarch64-unknown-linux-gnu".into(),
            ]
        );
    }

    #[test]
    fn container_build_fails_when_cross_install_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Container);
        let req = request(&config, PlatformToken::LinuxArm64, None);
        let runner = FakeRunner::new().exit("cargo", Some("install"), 1, "");

        assert!(matches!(
            build_target(&req, &runner),
            Err(ToolchainError::ToolInstallFailed { .. })
        ));
        assert!(runner.calls_to("cross").is_empty());
    }

    #[test]
    fn alt_linker_scopes_compiler_env_to_invocation() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path(), Backend::AltLinker);
        config.features = ["tls".to_string()].into_iter().collect();
        let req = request(&config, PlatformToken::DarwinArm64, Some(PlatformToken::LinuxAmd64));
        let expected = dir
            .path()
            .join("target/aarch64-apple-darwin/debug/remote_server");
        let runner = FakeRunner::new().on("cargo", Some("zigbuild"), writes(expected));

        let built = build_target(&req, &runner).unwrap();
        assert_eq!(built.route, BuildRoute::AltLinker);

        let call = &runner.calls()[0];
        assert_eq!(
            call.args,
            vec![
                "zigbuild".to_string(),
                "--target-dir".into(),
                target_dir(dir.path()),
                "--target".into(),
                "aarch64-apple-darwin".into(),
                "--features".into(),
                "tls".into(),
            ]
        );
        assert!(call.env.contains(&(
            "CC_aarch64_apple_darwin".to_string(),
            "zig cc -target aarch64-macos".to_string()
        )));
        assert!(std::env::var("CC_aarch64_apple_darwin").is_err());
    }

    #[test]
    fn alt_linker_rejects_unsupported_platform_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::AltLinker);
        let req = request(&config, PlatformToken::WindowsArm64, None);
        let runner = FakeRunner::new();

        assert!(matches!(
            build_target(&req, &runner),
            Err(ToolchainError::AltLinkerUnsupported {
                token: PlatformToken::WindowsArm64
            })
        ));
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn nonzero_exit_is_invocation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Direct);
        let req = request(&config, PlatformToken::LinuxAmd64, Some(PlatformToken::LinuxAmd64));
        let runner = FakeRunner::new().exit("cargo", Some("build"), 101, "");

        match build_target(&req, &runner).unwrap_err() {
            ToolchainError::BuildInvocationFailed {
                token,
                route,
                exit_code,
                timed_out,
            } => {
                assert_eq!(token, PlatformToken::LinuxAmd64);
                assert_eq!(route, BuildRoute::Local);
                assert_eq!(exit_code, Some(101));
                assert!(!timed_out);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn failure_names_the_route_that_ran() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Container);
        let req = request(&config, PlatformToken::LinuxAmd64, Some(PlatformToken::LinuxAmd64));
        let runner = FakeRunner::new().exit("cargo", Some("build"), 101, "");

        let err = build_target(&req, &runner).unwrap_err();
        assert_eq!(
            err.to_string(),
            "local build for linux-amd64 failed (exit code 101)"
        );
        assert!(runner.calls_to("cross").is_empty());
    }

    #[test]
    fn target_dir_is_pinned_for_every_route() {
        let dir = tempfile::tempdir().unwrap();
        let expected = target_dir(dir.path());
        for backend in [Backend::Direct, Backend::AltLinker, Backend::Container] {
            let config = config(dir.path(), backend);
            let runner = FakeRunner::new().with_tools(["cross"]);
            for host in [None, Some(PlatformToken::LinuxArm64)] {
                let req = request(&config, PlatformToken::LinuxArm64, host);
                let _ = build_target(&req, &runner);
            }
            let builds: Vec<_> = runner
                .calls()
                .into_iter()
                .filter(|c| c.has_arg("build") || c.has_arg("zigbuild"))
                .collect();
            assert_eq!(builds.len(), 2);
            for call in builds {
                let pos = call.args.iter().position(|a| a == "--target-dir").unwrap();
                assert_eq!(call.args[pos + 1], expected);
            }
        }
    }

    #[test]
    fn relative_source_gets_absolute_target_dir() {
        let config = config(Path::new("project"), Backend::Direct);
        let req = request(&config, PlatformToken::LinuxAmd64, Some(PlatformToken::LinuxAmd64));
        let runner = FakeRunner::new();

        let _ = build_target(&req, &runner);
        let call = &runner.calls_to("cargo")[0];
        let expected = std::env::current_dir().unwrap().join("project/target");
        assert_eq!(call.args[2], expected.display().to_string());
        assert_eq!(call.cwd.as_deref(), Some(Path::new("project")));
    }

    #[test]
    fn unrunnable_rustup_does_not_block_direct_build() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Direct);
        let req = request(&config, PlatformToken::LinuxArm64, None);
        let expected = dir
            .path()
            .join("target/aarch64-unknown-linux-gnu/debug/remote_server");
        let runner = FakeRunner::new()
            .with_tools(["rustup"])
            .on("rustup", None, FakeResponse::Missing)
            .on("cargo", Some("build"), writes(expected.clone()));

        assert_eq!(build_target(&req, &runner).unwrap().path, expected);
    }

    #[test]
    fn timeout_is_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Direct);
        let req = request(&config, PlatformToken::LinuxAmd64, Some(PlatformToken::LinuxAmd64));
        let runner = FakeRunner::new().on("cargo", Some("build"), FakeResponse::TimeOut);

        assert!(matches!(
            build_target(&req, &runner),
            Err(ToolchainError::BuildInvocationFailed { timed_out: true, .. })
        ));
    }

    #[test]
    fn success_without_binary_is_artifact_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Direct);
        let req = request(&config, PlatformToken::LinuxAmd64, Some(PlatformToken::LinuxAmd64));
        let runner = FakeRunner::new();

        match build_target(&req, &runner).unwrap_err() {
            ToolchainError::ArtifactNotFound { expected } => {
                assert_eq!(expected, dir.path().join("target/debug/remote_server"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unsupported_host_forces_cross_route() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path(), Backend::Direct);
        let req = request(&config, PlatformToken::LinuxAmd64, None);
        assert_eq!(select_route(&req).unwrap(), BuildRoute::Direct);
        assert_eq!(
            artifact_path(&req, BuildRoute::Direct),
            dir.path()
                .join("target/x86_64-unknown-linux-gnu/debug/remote_server")
        );
    }
}
