// Inspect interactor - Reports basic facts about a media file

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::errors::{CutError, PathError};
use crate::domain::model::TimeSpec;
use crate::ports::ProbePort;

/// What `vidcut probe` prints
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaSummary {
    pub path: PathBuf,
    pub duration: TimeSpec,
    pub duration_seconds: f64,
    pub size_bytes: u64,
}

/// Interactor for media file inspection use case
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
}

impl InspectInteractor {
    pub fn new(probe_port: Arc<dyn ProbePort>) -> Self {
        Self { probe_port }
    }

    pub async fn inspect(&self, path: &Path) -> Result<MediaSummary, CutError> {
        let metadata = std::fs::metadata(path)
            .ok()
            .filter(|m| m.is_file())
            .ok_or_else(|| PathError::SourceNotFound {
                path: path.to_path_buf(),
            })?;

        let duration = self.probe_port.probe_duration(path).await?;
        info!(path = %path.display(), %duration, "inspected media file");

        Ok(MediaSummary {
            path: path.to_path_buf(),
            duration,
            duration_seconds: duration.as_seconds(),
            size_bytes: metadata.len(),
        })
    }
}
