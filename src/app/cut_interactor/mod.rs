// Cut interactor - Orchestrates the command-line cut use case

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::{CutError, PathError};
use crate::domain::model::{CutOutcome, CutRequest, TimeSpec};
use crate::engine::cancel::CancelSignal;
use crate::engine::{CutEngine, CutJob};
use crate::ports::ProbePort;

/// Raw cut arguments as typed by the user
#[derive(Debug, Clone, Default)]
pub struct CutInput {
    pub input: PathBuf,
    pub start: String,
    pub end: String,
    pub output: Option<PathBuf>,
    pub overwrite: bool,
    pub cleanup: bool,
}

/// Finished cut together with what was learned about the source
#[derive(Debug, Clone, PartialEq)]
pub struct CutResponse {
    pub outcome: CutOutcome,
    /// `None` when the duration could not be probed
    pub media_duration: Option<TimeSpec>,
}

/// Interactor for the cut use case
pub struct CutInteractor {
    engine: CutEngine,
    probe_port: Arc<dyn ProbePort>,
}

impl CutInteractor {
    pub fn new(engine: CutEngine, probe_port: Arc<dyn ProbePort>) -> Self {
        Self { engine, probe_port }
    }

    /// Validate `input` into a request without running anything but the probe
    pub async fn prepare(&self, input: &CutInput) -> Result<(CutRequest, Option<TimeSpec>), CutError> {
        let start = TimeSpec::parse(&input.start)?;
        let end = TimeSpec::parse(&input.end)?;
        let request = CutRequest::new(input.input.clone(), start, end, input.output.clone())?
            .with_overwrite(input.overwrite)
            .with_cleanup_on_failure(input.cleanup);

        if !request.source().is_file() {
            return Err(PathError::SourceNotFound {
                path: request.source().to_path_buf(),
            }
            .into());
        }

        let media_duration = match self.probe_port.probe_duration(request.source()).await {
            Ok(duration) => Some(duration),
            Err(err) => {
                warn!("skipping duration check: {}", err);
                None
            }
        };
        if let Some(duration) = media_duration {
            request.validate_against_duration(duration)?;
        }

        Ok((request, media_duration))
    }

    /// Run the cut to completion
    pub async fn execute(&self, input: &CutInput, cancel: CancelSignal) -> Result<CutResponse, CutError> {
        let (request, media_duration) = self.prepare(input).await?;
        info!(
            source = %request.source().display(),
            start = %request.start(),
            end = %request.end(),
            "cut requested"
        );

        let outcome = self.engine.execute(&request, cancel).await?;
        Ok(CutResponse {
            outcome,
            media_duration,
        })
    }

    /// Start the cut in the background
    pub async fn submit(&self, input: &CutInput) -> Result<CutJob, CutError> {
        let (request, _) = self.prepare(input).await?;
        Ok(self.engine.submit(request))
    }
}
