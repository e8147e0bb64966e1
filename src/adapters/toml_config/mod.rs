// TOML config adapter - Settings file loading and validation

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::errors::CutError;
use crate::domain::model::TimeSpec;
use crate::engine::EngineConfig;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "vidcut.toml";

/// Every configurable value, one section per table
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tools: ToolSettings,
    pub cut: EngineConfig,
    pub preview: PreviewSettings,
    pub log: LogSettings,
}

/// Explicit media tool locations
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
}

/// Interactive selection and playback tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    /// Smallest allowed distance between the handles
    pub min_gap_ms: u64,
    /// Distance before the end handle at which playback wraps
    pub loop_margin_ms: u64,
    pub thumbnail_width: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            min_gap_ms: 100,
            loop_margin_ms: 120,
            thumbnail_width: 320,
        }
    }
}

impl PreviewSettings {
    pub fn min_gap(&self) -> TimeSpec {
        TimeSpec::from_millis(self.min_gap_ms)
    }

    pub fn loop_margin(&self) -> TimeSpec {
        TimeSpec::from_millis(self.loop_margin_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive, e.g. `info` or `vidcut=debug`
    pub level: Option<String>,
    pub json: bool,
}

impl Settings {
    pub fn from_toml_str(content: &str) -> Result<Self, CutError> {
        let settings: Settings = toml::from_str(content)
            .map_err(|e| CutError::Config(format!("failed to parse TOML config: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CutError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CutError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            CutError::Config(message) => CutError::Config(format!("{}: {}", path.display(), message)),
            other => other,
        })
    }

    /// Candidate config files, highest priority first
    pub fn default_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
            paths.push(PathBuf::from(xdg).join("vidcut").join("config.toml"));
        }
        if let Some(home) = std::env::var_os("HOME").filter(|v| !v.is_empty()) {
            paths.push(PathBuf::from(home).join(".config").join("vidcut").join("config.toml"));
        }
        paths
    }

    /// Load the explicit file, or the first default path that exists.
    ///
    /// A missing explicit file is an error; missing default files are not.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), CutError> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(CutError::Config(format!(
                    "config file does not exist: {}",
                    path.display()
                )));
            }
            return Ok((Self::load_from_file(path)?, Some(path.to_path_buf())));
        }

        match Self::default_paths().into_iter().find(|p| p.is_file()) {
            Some(path) => {
                info!(path = %path.display(), "loading configuration");
                Ok((Self::load_from_file(&path)?, Some(path)))
            }
            None => {
                debug!("no configuration file found, using defaults");
                Ok((Self::default(), None))
            }
        }
    }

    pub fn validate(&self) -> Result<(), CutError> {
        if self.cut.reencode.crf > 51 {
            return Err(CutError::Config(format!(
                "cut.reencode.crf must be between 0 and 51, got {}",
                self.cut.reencode.crf
            )));
        }
        if self.cut.clip_marker.trim().is_empty() {
            return Err(CutError::Config("cut.clip_marker must not be empty".to_string()));
        }
        if self.cut.clip_marker.contains(['/', '\\']) {
            return Err(CutError::Config(
                "cut.clip_marker must not contain path separators".to_string(),
            ));
        }
        if self.preview.min_gap_ms == 0 {
            return Err(CutError::Config("preview.min_gap_ms must be greater than 0".to_string()));
        }
        Ok(())
    }
}
