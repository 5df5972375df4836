//! `crosspack [PLATFORM]...`: build, package and report.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use crosspack_build::{
    resolve_tokens, BuildError, BuildPlan, CargoManifest, Orchestrator, Settings,
};
use crosspack_toolchain::{Backend, BuildConfig, BuildMode, DEFAULT_TIMEOUT};
use tracing::debug;

/// Output directory used when neither flags nor manifest name one.
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// Build-related command-line input, before manifest defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    pub platforms: Vec<String>,
    pub all: bool,
    pub source: PathBuf,
    pub output: Option<PathBuf>,
    pub zig: bool,
    pub cross: bool,
    pub release: bool,
    /// Comma-separated feature list.
    pub features: Option<String>,
    pub no_compress: bool,
    pub force_install: bool,
    /// Per-invocation timeout; `0` disables it.
    pub timeout_secs: Option<u64>,
    /// Where to write the JSON report.
    pub report: Option<PathBuf>,
}

impl BuildArgs {
    fn backend(&self) -> crosspack_build::Result<Backend> {
        match (self.zig, self.cross) {
            (true, true) => Err(BuildError::InvalidArgument {
                detail: "--zig and --cross are mutually exclusive".into(),
            }),
            (true, false) => Ok(Backend::AltLinker),
            (false, true) => Ok(Backend::Container),
            (false, false) => Ok(Backend::Direct),
        }
    }

    /// Merge flags over manifest settings. Flags win.
    pub fn config(&self, settings: &Settings) -> crosspack_build::Result<BuildConfig> {
        let output = match (&self.output, &settings.output) {
            (Some(dir), _) => dir.clone(),
            (None, Some(dir)) => self.source.join(dir),
            (None, None) => PathBuf::from(DEFAULT_OUTPUT_DIR),
        };

        let mut config = BuildConfig::new(&self.source, output);
        config.backend = self.backend()?;
        config.mode = if self.release {
            BuildMode::Release
        } else {
            BuildMode::Debug
        };
        config.features = match &self.features {
            Some(list) => parse_features(list),
            None => settings.features.iter().cloned().collect(),
        };
        config.force_install_targets = self.force_install;
        config.compress = !self.no_compress && settings.compress.unwrap_or(true);
        config.timeout = match self.timeout_secs.or(settings.timeout_secs) {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        };
        Ok(config)
    }

    /// Validate everything and produce the plan. Runs no subprocess.
    pub fn plan(&self) -> Result<BuildPlan> {
        self.backend()?;
        let explicit = if self.all || !self.platforms.is_empty() {
            Some(resolve_tokens(&self.platforms, self.all)?)
        } else {
            None
        };

        let manifest = CargoManifest::load(&self.source)?;
        let identity = manifest.identity(&self.source.join("Cargo.toml"))?;
        let settings = manifest.settings();
        let tokens = match explicit {
            Some(tokens) => tokens,
            None => resolve_tokens(&settings.targets, false)?,
        };

        let config = self.config(&settings)?;
        debug!(?config, ?tokens, "build plan");
        Ok(BuildPlan {
            config,
            tokens,
            project: identity,
        })
    }
}

/// Manifest settings for commands that work with or without a manifest.
pub fn settings_if_present(source: &Path) -> Result<Settings> {
    if !source.join("Cargo.toml").is_file() {
        return Ok(Settings::default());
    }
    Ok(CargoManifest::load(source)?.settings())
}

fn parse_features(list: &str) -> std::collections::BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Run the build and print the report. Returns the process exit code.
pub fn run(args: &BuildArgs, orchestrator: &Orchestrator<'_>) -> Result<i32> {
    let plan = args.plan()?;
    println!(
        "Building {} for {} target(s) ({}, {})",
        plan.project.binary,
        plan.tokens.len(),
        plan.config.backend,
        plan.config.mode,
    );

    let report = orchestrator.run(&plan)?;
    println!();
    print!("{report}");

    if let Some(path) = &args.report {
        report
            .write_json(path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        println!("Report written to {}", path.display());
    }
    Ok(report.exit_code())
}
