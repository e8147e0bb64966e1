//! Core cut engine module

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::errors::CutError;
use crate::domain::model::{CutMode, CutOutcome, CutRequest, CutStrategy};
use crate::ports::ExecutePort;
use crate::utils::path::{OutputPathResolver, DEFAULT_CLIP_MARKER};

pub mod cancel;
pub mod command;
pub mod executor;
pub mod thumbnail;

use cancel::{CancelHandle, CancelSignal};
use command::ReencodeSettings;
use executor::CutExecutor;

/// Cut engine configuration, the `[cut]` table of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which modes to try
    pub strategy: CutStrategy,
    /// Marker in generated output names
    pub clip_marker: String,
    /// Encoder used by re-encode mode
    pub reencode: ReencodeSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: CutStrategy::Auto,
            clip_marker: DEFAULT_CLIP_MARKER.to_string(),
            reencode: ReencodeSettings::default(),
        }
    }
}

/// Notifications about a submitted cut
#[derive(Debug, Clone, PartialEq)]
pub enum CutEvent {
    /// A mode attempt began
    Started { mode: CutMode },
    /// Share of the requested duration written so far
    Progress { mode: CutMode, fraction: f32 },
    Succeeded(CutOutcome),
    Failed(CutError),
    Cancelled,
}

impl CutEvent {
    /// Whether no further events follow
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CutEvent::Succeeded(_) | CutEvent::Failed(_) | CutEvent::Cancelled
        )
    }
}

/// Entry point for running cuts, shared between callers
#[derive(Clone)]
pub struct CutEngine {
    executor: Arc<CutExecutor>,
}

impl CutEngine {
    pub fn new(port: Arc<dyn ExecutePort>, config: &EngineConfig) -> Self {
        let executor = CutExecutor::new(
            port,
            config.strategy,
            OutputPathResolver::new(config.clip_marker.clone()),
            config.reencode.clone(),
        );
        Self {
            executor: Arc::new(executor),
        }
    }

    pub fn strategy(&self) -> CutStrategy {
        self.executor.strategy()
    }

    /// Run a cut on the current task
    pub async fn execute(&self, request: &CutRequest, cancel: CancelSignal) -> Result<CutOutcome, CutError> {
        self.executor.execute(request, None, cancel).await
    }

    /// Run a cut on a background task; must be called within a tokio runtime
    pub fn submit(&self, request: CutRequest) -> CutJob {
        let (events_tx, events) = mpsc::unbounded_channel();
        let cancel = CancelHandle::new();
        let signal = cancel.signal();
        let executor = Arc::clone(&self.executor);

        let task = tokio::spawn(async move {
            let result = executor.execute(&request, Some(&events_tx), signal).await;
            let terminal = match &result {
                Ok(outcome) => CutEvent::Succeeded(outcome.clone()),
                Err(CutError::Cancelled) => CutEvent::Cancelled,
                Err(err) => CutEvent::Failed(err.clone()),
            };
            debug!(event = ?terminal, "cut job finished");
            let _ = events_tx.send(terminal);
            result
        });

        CutJob { events, cancel, task }
    }
}

/// Handle to a cut running in the background
pub struct CutJob {
    events: UnboundedReceiver<CutEvent>,
    cancel: CancelHandle,
    task: JoinHandle<Result<CutOutcome, CutError>>,
}

impl CutJob {
    /// Request cancellation; the job still ends with a `Cancelled` event
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Clonable handle for cancelling from elsewhere, e.g. a signal handler
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Next event; `None` once the terminal event has been consumed
    pub async fn next_event(&mut self) -> Option<CutEvent> {
        self.events.recv().await
    }

    /// Wait for the final result, discarding unread events
    pub async fn wait(self) -> Result<CutOutcome, CutError> {
        match self.task.await {
            Ok(result) => result,
            Err(join_error) if join_error.is_cancelled() => Err(CutError::Cancelled),
            Err(join_error) => Err(CutError::Config(format!("cut task panicked: {}", join_error))),
        }
    }
}
