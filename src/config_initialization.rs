//! Configuration initialization and hierarchy management

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::adapters::toml_config::Settings;
use crate::adapters::tracing_log::{init_logging, LogOptions, DEFAULT_LOG_LEVEL};
use crate::cli::{Cli, Commands};
use crate::domain::model::CutStrategy;

pub const ENV_FFMPEG: &str = "VIDCUT_FFMPEG";
pub const ENV_FFPROBE: &str = "VIDCUT_FFPROBE";

/// Build the effective settings following precedence: CLI > Env > File > Defaults,
/// then install logging
pub fn initialize_configuration_hierarchy(cli: &Cli) -> Result<Settings> {
    let (mut settings, loaded_from) =
        Settings::discover(cli.config.as_deref()).context("failed to load configuration")?;

    apply_environment(&mut settings, |name| std::env::var_os(name));
    apply_cli_overrides(&mut settings, cli)?;
    settings.validate().context("invalid configuration")?;

    let options = log_options(cli, &settings, std::env::var("RUST_LOG").ok());
    init_logging(&options)?;

    match loaded_from {
        Some(path) => info!(path = %path.display(), "configuration loaded"),
        None => debug!("using built-in configuration defaults"),
    }
    debug!(?settings, "effective configuration");
    Ok(settings)
}

/// Override tool paths from the environment
pub fn apply_environment(settings: &mut Settings, lookup: impl Fn(&str) -> Option<OsString>) {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(ffmpeg) = non_empty(ENV_FFMPEG) {
        settings.tools.ffmpeg = Some(ffmpeg);
    }
    if let Some(ffprobe) = non_empty(ENV_FFPROBE) {
        settings.tools.ffprobe = Some(ffprobe);
    }
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Cut(args) => {
            if let Some(mode) = &args.mode {
                settings.cut.strategy = CutStrategy::parse(mode)?;
            }
        }
        Commands::Thumbnail(args) => {
            if let Some(width) = args.width {
                settings.preview.thumbnail_width = width;
            }
        }
        Commands::Probe(_) => {}
    }
    if cli.log_json {
        settings.log.json = true;
    }
    Ok(())
}

/// Level from `--log-level` / `VIDCUT_LOG`, then `RUST_LOG`, then the file, then `warn`
pub fn log_options(cli: &Cli, settings: &Settings, rust_log: Option<String>) -> LogOptions {
    let filter = cli
        .log_level
        .clone()
        .or(rust_log)
        .or_else(|| settings.log.level.clone())
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    LogOptions {
        filter,
        json: settings.log.json,
    }
}
