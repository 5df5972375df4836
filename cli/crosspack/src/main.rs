//! crosspack: build a Rust binary for many platforms and package the results.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use crosspack_package::GzipCompressor;
use crosspack_toolchain::{CancelToken, SystemRunner};
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::build::{settings_if_present, BuildArgs};

#[derive(Parser, Debug)]
#[command(
    name = "crosspack",
    version,
    about = "Build and package a Rust binary for many platforms"
)]
struct Cli {
    /// Platforms to build (e.g. linux-amd64 darwin-arm64)
    #[arg(value_name = "PLATFORM")]
    platforms: Vec<String>,
    /// Output directory (default: build)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
    /// Project directory containing Cargo.toml
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    source: PathBuf,
    /// Link with zig through cargo-zigbuild
    #[arg(short, long)]
    zig: bool,
    /// Build inside containers with cross
    #[arg(short, long)]
    cross: bool,
    /// Build in release mode
    #[arg(short, long)]
    release: bool,
    /// Comma-separated list of cargo features
    #[arg(long, value_name = "LIST")]
    features: Option<String>,
    /// Leave artifacts uncompressed
    #[arg(long)]
    no_compress: bool,
    /// Build every supported platform
    #[arg(short, long)]
    all: bool,
    /// List supported platforms and exit
    #[arg(short, long)]
    list: bool,
    /// Fail a target when its rustup target cannot be installed
    #[arg(short = 'f', long)]
    force_install: bool,
    /// Remove build outputs and exit
    #[arg(long)]
    clean: bool,
    /// Check required tools and exit
    #[arg(long)]
    check_deps: bool,
    /// Print zig and cargo-zigbuild versions and exit
    #[arg(long)]
    zig_version: bool,
    /// Per-command timeout in seconds, 0 to disable (default: 3600)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
    /// Write a JSON build report
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,
    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn build_args(&self) -> BuildArgs {
        BuildArgs {
            platforms: self.platforms.clone(),
            all: self.all,
            source: self.source.clone(),
            output: self.output.clone(),
            zig: self.zig,
            cross: self.cross,
            release: self.release,
            features: self.features.clone(),
            no_compress: self.no_compress,
            force_install: self.force_install,
            timeout_secs: self.timeout,
            report: self.report.clone(),
        }
    }
}

fn main() {
    // Usage errors exit 1; help and version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    init_logging(cli.verbose);

    match run_with(cli, cancel_on_interrupt()) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

/// Children run in their own process group, so Ctrl-C only reaches us.
/// Cancelling makes the runner kill the group in flight.
fn cancel_on_interrupt() -> CancelToken {
    let cancel = CancelToken::new();
    let flag = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nInterrupted, stopping builds...");
        flag.cancel();
    }) {
        warn!(error = %e, "could not install Ctrl-C handler");
    }
    cancel
}

fn run_with(cli: Cli, cancel: CancelToken) -> anyhow::Result<i32> {
    let runner = SystemRunner::new(cancel.clone());
    let args = cli.build_args();

    if cli.list {
        commands::target::list();
        return Ok(0);
    }

    if cli.zig_version {
        commands::doctor::zig_version(&runner);
        return Ok(0);
    }

    if cli.check_deps {
        let config = args.config(&settings_if_present(&args.source)?)?;
        return Ok(commands::doctor::check_deps(&config, &runner));
    }

    if cli.clean {
        let config = args.config(&settings_if_present(&args.source)?)?;
        commands::clean::run(&config.source_dir, &config.output_dir, &runner)?;
        return Ok(0);
    }

    let orchestrator =
        crosspack_build::Orchestrator::new(&runner, &GzipCompressor).with_cancel(cancel);
    commands::build::run(&args, &orchestrator)
}
