//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Arguments for the cut command
#[derive(Args, Debug)]
pub struct CutArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Start time (seconds, MM:SS or HH:MM:SS, with optional .fff)
    #[arg(allow_hyphen_values = true)]
    pub start: String,

    /// End time, same formats as start
    #[arg(allow_hyphen_values = true)]
    pub end: String,

    /// Output file path (default: <input>_clip.<ext> next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Cutting strategy: auto, copy or reencode
    #[arg(long)]
    pub mode: Option<String>,

    /// Delete partial output when the cut fails
    #[arg(long)]
    pub cleanup: bool,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Input media file path
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the thumbnail command
#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Input video file path
    pub input: PathBuf,

    /// Frame time
    #[arg(allow_hyphen_values = true)]
    pub timestamp: String,

    /// Image file to write
    #[arg(short, long)]
    pub output: PathBuf,

    /// Image width in pixels; height follows the aspect ratio
    #[arg(long)]
    pub width: Option<u32>,
}
