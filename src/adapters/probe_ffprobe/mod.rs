//! FFprobe adapter for media file probing
//!
//! This module reads the container duration with
//! `ffprobe -print_format json -show_format`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use crate::adapters::exec_ffmpeg::locate;
use crate::domain::errors::{CutError, ExecutionError};
use crate::domain::model::TimeSpec;
use crate::ports::ProbePort;
use crate::utils::LineTail;

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    program: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: Option<FormatSection>,
}

#[derive(Debug, Deserialize)]
struct FormatSection {
    duration: Option<String>,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn locate(configured: Option<&Path>) -> Self {
        Self::new(locate::locate_tool("ffprobe", configured))
    }
}

/// Duration from ffprobe's JSON report
pub fn parse_probe_json(path: &Path, json: &[u8]) -> Result<TimeSpec, CutError> {
    let failed = |reason: String| -> CutError {
        ExecutionError::ProbeFailed {
            path: path.to_path_buf(),
            reason,
        }
        .into()
    };

    let output: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| failed(format!("unreadable ffprobe output: {}", e)))?;
    let duration = output
        .format
        .and_then(|f| f.duration)
        .ok_or_else(|| failed("container reports no duration".to_string()))?;

    TimeSpec::parse(&duration).map_err(|e| failed(e.to_string()))
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_duration(&self, source: &Path) -> Result<TimeSpec, CutError> {
        debug!(source = %source.display(), "probing media duration");

        let output = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_format"])
            .arg(source)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| -> CutError {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ExecutionError::ToolNotFound {
                        tool: self.program.display().to_string(),
                    }
                    .into()
                } else {
                    ExecutionError::io("failed to start ffprobe", &e).into()
                }
            })?;

        if !output.status.success() {
            let mut tail = LineTail::new(4);
            String::from_utf8_lossy(&output.stderr)
                .lines()
                .for_each(|line| tail.push(line));
            return Err(ExecutionError::ProbeFailed {
                path: source.to_path_buf(),
                reason: tail.joined(),
            }
            .into());
        }

        let duration = parse_probe_json(source, &output.stdout)?;
        debug!(source = %source.display(), %duration, "probed media duration");
        Ok(duration)
    }
}
