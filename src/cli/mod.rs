//! CLI module for vidcut
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::container::DefaultAppContainer;
use crate::config_initialization::initialize_configuration_hierarchy;

pub mod args;
pub mod commands;

pub use args::{CutArgs, ProbeArgs, ThumbnailArgs};

/// vidcut - cut a time range out of a video
///
/// Tries a lossless stream copy first and falls back to re-encoding when the
/// copy fails. Decoding and encoding are done by ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "vidcut")]
#[command(about = "Cut a time range out of a video file using ffmpeg")]
#[command(version)]
pub struct Cli {
    /// Log filter (error, warn, info, debug, trace or an EnvFilter directive)
    #[arg(long, global = true, env = "VIDCUT_LOG")]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file to use instead of the default locations
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut a segment out of a video file
    Cut(CutArgs),
    /// Print the duration of a media file
    Probe(ProbeArgs),
    /// Write a single frame as a JPEG image
    Thumbnail(ThumbnailArgs),
}

/// Load configuration, wire the adapters and run the selected command
pub async fn run(cli: Cli) -> Result<()> {
    let settings = initialize_configuration_hierarchy(&cli)?;
    let container = DefaultAppContainer::new(&settings);

    match cli.command {
        Commands::Cut(args) => commands::cut(&container, args).await,
        Commands::Probe(args) => commands::probe(&container, args).await,
        Commands::Thumbnail(args) => commands::thumbnail(&container, args).await,
    }
}
