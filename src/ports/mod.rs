// Ports - Interface definitions (contracts)

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::CutError;
use crate::domain::model::TimeSpec;
use crate::engine::cancel::CancelSignal;

/// Callback receiving the tool's reported output position
pub type ProgressFn = Arc<dyn Fn(TimeSpec) + Send + Sync>;

/// How a tool invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExit {
    pub success: bool,
    pub code: Option<i32>,
    /// Last lines the tool wrote to stderr
    pub stderr_tail: String,
}

/// Output of a tool invocation whose stdout is the payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr_tail: String,
}

/// Port for running the external media tool
#[async_trait]
pub trait ExecutePort: Send + Sync {
    /// Name used in diagnostics
    fn tool_name(&self) -> &str;

    /// Run to completion, reporting progress, or until `cancel` fires.
    ///
    /// Cancellation kills the process and returns [`CutError::Cancelled`].
    /// A missing executable is reported as `ExecutionError::ToolNotFound`.
    async fn run(
        &self,
        args: &[OsString],
        on_progress: ProgressFn,
        cancel: CancelSignal,
    ) -> Result<ToolExit, CutError>;

    /// Run to completion and collect stdout
    async fn capture(&self, args: &[OsString]) -> Result<CapturedOutput, CutError>;
}

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Container duration of `source`
    async fn probe_duration(&self, source: &Path) -> Result<TimeSpec, CutError>;
}
