//! Copy-first cut execution with a single re-encode fallback

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::domain::errors::{CutError, ExecutionError, PathError};
use crate::domain::model::{CutOutcome, CutRequest, CutStrategy, TimeSpec};
use crate::engine::cancel::CancelSignal;
use crate::engine::command::{CommandBuilder, CutCommand, ReencodeSettings};
use crate::engine::CutEvent;
use crate::ports::{ExecutePort, ProgressFn};
use crate::utils::path::OutputPathResolver;

/// Destinations currently being written by some executor
#[derive(Debug, Clone, Default)]
pub struct DestinationClaims {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl DestinationClaims {
    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_held(&self, path: &Path) -> bool {
        self.lock().contains(path)
    }

    /// Reserve `path` until the returned guard is dropped
    pub fn claim(&self, path: &Path) -> Result<ClaimGuard, PathError> {
        self.claim_first_free(|_| Ok(path.to_path_buf()))
    }

    /// Pick a destination with `resolve` and reserve it under the same lock.
    ///
    /// `resolve` is handed a predicate telling which paths are already held.
    pub fn claim_first_free<F>(&self, resolve: F) -> Result<ClaimGuard, PathError>
    where
        F: FnOnce(&dyn Fn(&Path) -> bool) -> Result<PathBuf, PathError>,
    {
        let mut held = self.lock();
        let path = resolve(&|candidate: &Path| held.contains(candidate))?;
        if !held.insert(path.clone()) {
            return Err(PathError::DestinationBusy { path });
        }
        Ok(ClaimGuard {
            claims: self.clone(),
            path,
        })
    }

    pub fn held(&self) -> usize {
        self.lock().len()
    }
}

/// Releases a destination claim on drop
#[derive(Debug)]
pub struct ClaimGuard {
    claims: DestinationClaims,
    path: PathBuf,
}

impl ClaimGuard {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        self.claims.lock().remove(&self.path);
    }
}

/// Runs cut requests against an [`ExecutePort`].
///
/// Copy mode runs first; when it fails the partial output it created is
/// removed and re-encode runs exactly once. A missing tool or a cancellation
/// ends the attempt sequence immediately.
pub struct CutExecutor {
    port: Arc<dyn ExecutePort>,
    reencode: ReencodeSettings,
    resolver: OutputPathResolver,
    strategy: CutStrategy,
    claims: DestinationClaims,
}

impl CutExecutor {
    pub fn new(
        port: Arc<dyn ExecutePort>,
        strategy: CutStrategy,
        resolver: OutputPathResolver,
        reencode: ReencodeSettings,
    ) -> Self {
        Self {
            port,
            reencode,
            resolver,
            strategy,
            claims: DestinationClaims::default(),
        }
    }

    pub fn strategy(&self) -> CutStrategy {
        self.strategy
    }

    pub fn claims(&self) -> &DestinationClaims {
        &self.claims
    }

    /// Execute `request`, emitting `Started` and `Progress` events on `events`
    pub async fn execute(
        &self,
        request: &CutRequest,
        events: Option<&UnboundedSender<CutEvent>>,
        cancel: CancelSignal,
    ) -> Result<CutOutcome, CutError> {
        let started = Instant::now();
        let source = request.source();

        if !source.is_file() {
            return Err(PathError::SourceNotFound {
                path: source.to_path_buf(),
            }
            .into());
        }

        let claim = self.claims.claim_first_free(|is_held| {
            self.resolver
                .resolve_excluding(source, request.destination(), request.allow_overwrite(), is_held)
        })?;
        let destination = claim.path().to_path_buf();
        let preexisting = destination.exists();

        info!(
            source = %source.display(),
            destination = %destination.display(),
            start = %request.start(),
            end = %request.end(),
            strategy = ?self.strategy,
            "starting cut"
        );

        let builder = CommandBuilder::new(self.reencode.clone()).allow_overwrite(request.allow_overwrite());
        let mut last_error = None;

        for (attempt, &mode) in self.strategy.modes().iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(self.cancelled(&destination));
            }
            if attempt > 0 && !preexisting {
                remove_partial(&destination);
            }

            let command = builder.build(mode, source, request.start(), request.end(), &destination);
            emit(events, CutEvent::Started { mode });

            match self.attempt(&command, events, cancel.clone()).await {
                Ok(()) => {
                    let outcome = CutOutcome {
                        destination,
                        mode_used: mode,
                        fell_back: attempt > 0,
                        elapsed: started.elapsed(),
                    };
                    info!(
                        destination = %outcome.destination.display(),
                        mode = %mode,
                        elapsed = %crate::utils::format_duration(outcome.elapsed),
                        "cut finished"
                    );
                    return Ok(outcome);
                }
                Err(CutError::Cancelled) => return Err(self.cancelled(&destination)),
                Err(err) if err.is_tool_failure() => {
                    warn!(mode = %mode, "cut attempt failed: {}", err);
                    last_error = Some(err);
                }
                Err(err) => {
                    self.fail_cleanup(request, &destination, preexisting);
                    return Err(err);
                }
            }
        }

        self.fail_cleanup(request, &destination, preexisting);
        Err(last_error.unwrap_or_else(|| CutError::Config("no cut mode to run".to_string())))
    }

    async fn attempt(
        &self,
        command: &CutCommand,
        events: Option<&UnboundedSender<CutEvent>>,
        cancel: CancelSignal,
    ) -> Result<(), CutError> {
        debug!(mode = %command.mode, args = %command.display_args(), "running cut command");

        let exit = self
            .port
            .run(&command.args, progress_reporter(command, events), cancel)
            .await?;

        let written = output_len(&command.destination);
        if exit.success && written > 0 {
            return Ok(());
        }

        let stderr_tail = if exit.success {
            format!("{} produced no output", self.port.tool_name())
        } else {
            exit.stderr_tail
        };
        Err(ExecutionError::ToolFailed {
            tool: self.port.tool_name().to_string(),
            mode: command.mode,
            code: exit.code,
            stderr_tail,
        }
        .into())
    }

    fn cancelled(&self, destination: &Path) -> CutError {
        info!(destination = %destination.display(), "cut cancelled");
        remove_partial(destination);
        CutError::Cancelled
    }

    fn fail_cleanup(&self, request: &CutRequest, destination: &Path, preexisting: bool) {
        if request.cleanup_on_failure() && !preexisting {
            remove_partial(destination);
        }
    }
}

/// Turns reported output positions into progress fractions
fn progress_reporter(command: &CutCommand, events: Option<&UnboundedSender<CutEvent>>) -> ProgressFn {
    let events = events.cloned();
    let mode = command.mode;
    let total = command.duration;
    Arc::new(move |position: TimeSpec| {
        if let Some(events) = &events {
            let _ = events.send(CutEvent::Progress {
                mode,
                fraction: progress_fraction(position, total),
            });
        }
    })
}

/// Share of `total` covered by `position`, within `[0, 1]`
pub fn progress_fraction(position: TimeSpec, total: TimeSpec) -> f32 {
    if total == TimeSpec::ZERO {
        return 1.0;
    }
    (position.as_millis() as f64 / total.as_millis() as f64).clamp(0.0, 1.0) as f32
}

fn emit(events: Option<&UnboundedSender<CutEvent>>, event: CutEvent) {
    if let Some(events) = events {
        let _ = events.send(event);
    }
}

fn output_len(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

fn remove_partial(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "could not remove partial output: {}", e),
    }
}
