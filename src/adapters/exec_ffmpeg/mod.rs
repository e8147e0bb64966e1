//! FFmpeg execution adapter
//!
//! Runs the media tool as a child process through `tokio::process`, parses
//! `-progress pipe:1` output from stdout and keeps the tail of stderr for
//! error reports.

pub mod locate;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::domain::errors::{CutError, ExecutionError};
use crate::domain::model::TimeSpec;
use crate::engine::cancel::CancelSignal;
use crate::ports::{CapturedOutput, ExecutePort, ProgressFn, ToolExit};
use crate::utils::LineTail;

/// Lines of stderr kept for error messages
const STDERR_TAIL_LINES: usize = 12;

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    program: PathBuf,
    name: String,
}

impl FFmpegAdapter {
    /// Adapter invoking `program` directly
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ffmpeg".to_string());
        Self { program, name }
    }

    /// Adapter for the ffmpeg found by [`locate::locate_tool`]
    pub fn locate(configured: Option<&Path>) -> Self {
        Self::new(locate::locate_tool("ffmpeg", configured))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, args: &[OsString]) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, err: &io::Error) -> CutError {
        if err.kind() == io::ErrorKind::NotFound {
            ExecutionError::ToolNotFound {
                tool: self.program.display().to_string(),
            }
            .into()
        } else {
            ExecutionError::io(format!("failed to start {}", self.program.display()), err).into()
        }
    }
}

#[async_trait]
impl ExecutePort for FFmpegAdapter {
    fn tool_name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        args: &[OsString],
        on_progress: ProgressFn,
        mut cancel: CancelSignal,
    ) -> Result<ToolExit, CutError> {
        debug!(program = %self.program.display(), ?args, "spawning media tool");

        let mut child = self.command(args).spawn().map_err(|e| self.spawn_error(&e))?;
        let progress_task = tokio::spawn(read_progress(child.stdout.take(), on_progress));
        let stderr_task = tokio::spawn(read_tail(child.stderr.take()));

        let status = tokio::select! {
            status = child.wait() => {
                status.map_err(|e| ExecutionError::io("failed waiting for media tool", &e))?
            }
            _ = cancel.cancelled() => {
                warn!(program = %self.program.display(), "terminating media tool");
                if let Err(e) = child.kill().await {
                    warn!("failed to kill media tool: {}", e);
                }
                progress_task.abort();
                stderr_task.abort();
                return Err(CutError::Cancelled);
            }
        };

        if let Err(e) = progress_task.await {
            trace!("progress reader ended abnormally: {}", e);
        }
        let stderr_tail = stderr_task.await.unwrap_or_default();

        debug!(code = ?status.code(), "media tool exited");
        Ok(ToolExit {
            success: status.success(),
            code: status.code(),
            stderr_tail,
        })
    }

    async fn capture(&self, args: &[OsString]) -> Result<CapturedOutput, CutError> {
        debug!(program = %self.program.display(), ?args, "capturing media tool output");

        let output = self
            .command(args)
            .output()
            .await
            .map_err(|e| self.spawn_error(&e))?;

        let mut tail = LineTail::new(STDERR_TAIL_LINES);
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .for_each(|line| tail.push(line));

        Ok(CapturedOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr_tail: tail.joined(),
        })
    }
}

/// Forward `out_time=` reports from `-progress pipe:1`
async fn read_progress<R>(stdout: Option<R>, on_progress: ProgressFn)
where
    R: AsyncRead + Unpin,
{
    let Some(stdout) = stdout else { return };
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if let Some(position) = parse_progress_line(&line) {
            on_progress(position);
        }
    }
}

async fn read_tail<R>(stderr: Option<R>) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stderr) = stderr else {
        return String::new();
    };
    let mut tail = LineTail::new(STDERR_TAIL_LINES);
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        trace!(target: "vidcut::tool", "{}", line);
        tail.push(line);
    }
    tail.joined()
}

/// Output position from a progress line such as `out_time=00:00:01.500000`
pub fn parse_progress_line(line: &str) -> Option<TimeSpec> {
    let value = line.trim().strip_prefix("out_time=")?;
    TimeSpec::parse(value).ok()
}
