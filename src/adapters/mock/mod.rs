//! Scripted adapters for exercising the engine without a media tool

use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{Notify, Semaphore};

use crate::domain::errors::{CutError, ExecutionError};
use crate::domain::model::TimeSpec;
use crate::engine::cancel::CancelSignal;
use crate::ports::{CapturedOutput, ExecutePort, ProbePort, ProgressFn, ToolExit};

/// Behaviour of one scripted `run` call
#[derive(Debug, Clone)]
pub enum MockRun {
    /// Write `bytes` to the destination (last argument) and exit 0
    Succeed { bytes: Vec<u8> },
    /// Exit non-zero with the given stderr
    Fail { code: i32, stderr: String },
    /// Exit 0 without producing any output
    SucceedWithoutOutput,
    /// Executable missing
    NotFound,
    /// Write partial output, then block until cancelled
    Hang,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock execution adapter driven by a queue of [`MockRun`]s
#[derive(Default)]
pub struct MockExecutionAdapter {
    script: Mutex<VecDeque<MockRun>>,
    runs: Mutex<Vec<Vec<OsString>>>,
    captures: Mutex<Vec<TimeSpec>>,
    capture_gate: Option<Arc<Semaphore>>,
    capture_started: Arc<Notify>,
    frame_bytes: Vec<u8>,
}

impl MockExecutionAdapter {
    pub fn new(script: impl IntoIterator<Item = MockRun>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            frame_bytes: b"\xff\xd8mock-jpeg\xff\xd9".to_vec(),
            ..Default::default()
        }
    }

    /// Make every `capture` wait for a permit from `gate`
    pub fn with_capture_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.capture_gate = Some(gate);
        self
    }

    /// Frames returned by `capture`; empty means "no frame"
    pub fn with_frame_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.frame_bytes = bytes;
        self
    }

    /// Notified each time a capture begins
    pub fn capture_started(&self) -> Arc<Notify> {
        Arc::clone(&self.capture_started)
    }

    /// Argument lists of every `run` call so far
    pub fn runs(&self) -> Vec<Vec<OsString>> {
        lock(&self.runs).clone()
    }

    /// Timestamps of every `capture` call so far
    pub fn captures(&self) -> Vec<TimeSpec> {
        lock(&self.captures).clone()
    }
}

fn destination_of(args: &[OsString]) -> Option<PathBuf> {
    args.last().map(PathBuf::from)
}

fn timestamp_of(args: &[OsString]) -> Option<TimeSpec> {
    let index = args.iter().position(|a| a == "-ss")?;
    let value = args.get(index + 1)?.to_str()?;
    TimeSpec::parse(value).ok()
}

fn write_output(args: &[OsString], bytes: &[u8]) -> Result<(), CutError> {
    if let Some(destination) = destination_of(args) {
        std::fs::write(&destination, bytes)
            .map_err(|e| ExecutionError::io("mock tool could not write output", &e))?;
    }
    Ok(())
}

#[async_trait]
impl ExecutePort for MockExecutionAdapter {
    fn tool_name(&self) -> &str {
        "mock-ffmpeg"
    }

    async fn run(
        &self,
        args: &[OsString],
        on_progress: ProgressFn,
        mut cancel: CancelSignal,
    ) -> Result<ToolExit, CutError> {
        lock(&self.runs).push(args.to_vec());
        let step = lock(&self.script)
            .pop_front()
            .unwrap_or(MockRun::Fail {
                code: 1,
                stderr: "mock script exhausted".to_string(),
            });

        match step {
            MockRun::Succeed { bytes } => {
                write_output(args, &bytes)?;
                on_progress(TimeSpec::from_millis(1_000));
                Ok(ToolExit {
                    success: true,
                    code: Some(0),
                    stderr_tail: String::new(),
                })
            }
            MockRun::SucceedWithoutOutput => Ok(ToolExit {
                success: true,
                code: Some(0),
                stderr_tail: String::new(),
            }),
            MockRun::Fail { code, stderr } => {
                write_output(args, b"partial")?;
                Ok(ToolExit {
                    success: false,
                    code: Some(code),
                    stderr_tail: stderr,
                })
            }
            MockRun::NotFound => Err(ExecutionError::ToolNotFound {
                tool: "mock-ffmpeg".to_string(),
            }
            .into()),
            MockRun::Hang => {
                write_output(args, b"partial")?;
                cancel.cancelled().await;
                Err(CutError::Cancelled)
            }
        }
    }

    async fn capture(&self, args: &[OsString]) -> Result<CapturedOutput, CutError> {
        let timestamp = timestamp_of(args).unwrap_or_default();
        lock(&self.captures).push(timestamp);
        self.capture_started.notify_one();

        if let Some(gate) = &self.capture_gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        Ok(CapturedOutput {
            success: !self.frame_bytes.is_empty(),
            code: Some(if self.frame_bytes.is_empty() { 1 } else { 0 }),
            stdout: self.frame_bytes.clone(),
            stderr_tail: String::new(),
        })
    }
}

/// Mock probe returning a fixed duration, or failing when `None`
pub struct MockProbeAdapter {
    duration: Option<TimeSpec>,
    calls: Mutex<usize>,
}

impl MockProbeAdapter {
    pub fn new(duration: Option<TimeSpec>) -> Self {
        Self {
            duration,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl ProbePort for MockProbeAdapter {
    async fn probe_duration(&self, source: &Path) -> Result<TimeSpec, CutError> {
        *lock(&self.calls) += 1;
        self.duration.ok_or_else(|| {
            ExecutionError::ProbeFailed {
                path: source.to_path_buf(),
                reason: "mock probe has no duration".to_string(),
            }
            .into()
        })
    }
}
