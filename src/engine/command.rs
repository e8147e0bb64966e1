//! Media tool argument construction

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::model::{CutMode, TimeSpec};

/// Encoder choices for the re-encode fallback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReencodeSettings {
    pub video_codec: String,
    pub preset: String,
    /// Constant Rate Factor (0-51)
    pub crf: u8,
    pub audio_codec: String,
}

impl Default for ReencodeSettings {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "veryfast".to_string(),
            crf: 18,
            audio_codec: "aac".to_string(),
        }
    }
}

/// One invocation of the media tool for a cut attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutCommand {
    pub mode: CutMode,
    pub start: TimeSpec,
    pub duration: TimeSpec,
    pub destination: PathBuf,
    pub args: Vec<OsString>,
}

impl CutCommand {
    /// Value following `flag`, if the flag is present
    pub fn arg_after(&self, flag: &str) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Space-separated rendering for logs
    pub fn display_args(&self) -> String {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Builds ffmpeg-compatible argument lists.
///
/// Every invocation runs with `-nostdin` so the tool never waits on a prompt,
/// and with `-n` unless the caller allowed overwriting, in which case `-y`.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    reencode: ReencodeSettings,
    allow_overwrite: bool,
}

impl CommandBuilder {
    pub fn new(reencode: ReencodeSettings) -> Self {
        Self {
            reencode,
            allow_overwrite: false,
        }
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    /// Arguments for cutting `[start, end)` of `source` into `destination`.
    ///
    /// `-ss` sits before `-i` for both modes. With stream copy the output
    /// therefore begins at the keyframe at or before `start`; re-encoding
    /// decodes from that keyframe and discards frames up to `start`.
    pub fn build(
        &self,
        mode: CutMode,
        source: &Path,
        start: TimeSpec,
        end: TimeSpec,
        destination: &Path,
    ) -> CutCommand {
        let duration = end.saturating_sub(start);

        let mut args: Vec<OsString> = self.preamble();
        args.extend(["-ss".into(), start.to_string().into()]);
        args.extend(["-i".into(), source.as_os_str().to_os_string()]);
        args.extend(["-t".into(), duration.to_string().into()]);

        match mode {
            CutMode::Copy => {
                args.extend(strings(&["-c", "copy", "-avoid_negative_ts", "make_zero"]));
            }
            CutMode::Reencode => {
                let settings = &self.reencode;
                args.extend(strings(&["-c:v", &settings.video_codec]));
                args.extend(strings(&["-preset", &settings.preset]));
                args.extend(strings(&["-crf", &settings.crf.to_string()]));
                args.extend(strings(&["-c:a", &settings.audio_codec]));
            }
        }

        args.extend(strings(&["-progress", "pipe:1", "-nostats"]));
        args.push(destination.as_os_str().to_os_string());

        CutCommand {
            mode,
            start,
            duration,
            destination: destination.to_path_buf(),
            args,
        }
    }

    /// Arguments for writing one JPEG frame at `timestamp` to stdout
    pub fn thumbnail(&self, source: &Path, timestamp: TimeSpec, width: u32) -> Vec<OsString> {
        let mut args = strings(&["-hide_banner", "-nostdin", "-loglevel", "error"]);
        args.extend(["-ss".into(), timestamp.to_string().into()]);
        args.extend(["-i".into(), source.as_os_str().to_os_string()]);
        args.extend(strings(&["-frames:v", "1", "-an"]));
        args.extend(strings(&["-vf", &format!("scale={}:-2", width)]));
        args.extend(strings(&["-f", "image2pipe", "-c:v", "mjpeg", "pipe:1"]));
        args
    }

    fn preamble(&self) -> Vec<OsString> {
        let overwrite = if self.allow_overwrite { "-y" } else { "-n" };
        strings(&["-hide_banner", "-nostdin", "-loglevel", "error", overwrite])
    }
}

fn strings(values: &[&str]) -> Vec<OsString> {
    values.iter().map(OsString::from).collect()
}
