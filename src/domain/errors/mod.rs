// Domain errors - Error taxonomy for the cut engine

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::model::{CutMode, TimeSpec};

/// Failure to turn user input into a [`TimeSpec`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid time '{input}': {reason}")]
    InvalidFormat { input: String, reason: &'static str },
}

impl ParseError {
    pub(crate) fn invalid(input: &str, reason: &'static str) -> Self {
        ParseError::InvalidFormat {
            input: input.to_string(),
            reason,
        }
    }
}

/// Problems with the source or destination paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("output directory does not exist: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("output file already exists: {} (pass --overwrite to replace it)", path.display())]
    DestinationExists { path: PathBuf },

    #[error("another cut is already writing to {}", path.display())]
    DestinationBusy { path: PathBuf },

    #[error("input file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },
}

/// Invalid cut interval
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("selected range {start} - {end} is too short (minimum {minimum})")]
    ZeroLength {
        start: TimeSpec,
        end: TimeSpec,
        minimum: TimeSpec,
    },

    #[error("time {value} is past the end of the media ({duration})")]
    OutOfBounds { value: TimeSpec, duration: TimeSpec },
}

/// Failures while running the external media tool
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("{tool} failed in {mode} mode (exit code {}): {stderr_tail}", code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ToolFailed {
        tool: String,
        mode: CutMode,
        code: Option<i32>,
        stderr_tail: String,
    },

    #[error("{tool} was not found; install it or set its path in the configuration")]
    ToolNotFound { tool: String },

    #[error("{context}: {message}")]
    Io { context: String, message: String },

    #[error("could not read media information from {}: {reason}", path.display())]
    ProbeFailed { path: PathBuf, reason: String },

    #[error("no frame could be extracted at {timestamp}: {stderr_tail}")]
    NoFrame {
        timestamp: TimeSpec,
        stderr_tail: String,
    },
}

impl ExecutionError {
    pub(crate) fn io(context: impl Into<String>, err: &std::io::Error) -> Self {
        ExecutionError::Io {
            context: context.into(),
            message: err.to_string(),
        }
    }
}

/// Top-level error for every cut engine operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CutError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("cut was cancelled")]
    Cancelled,

    #[error("no media file is loaded")]
    NoMedia,

    #[error("configuration error: {0}")]
    Config(String),
}

impl CutError {
    /// Whether the failure came from the tool itself rather than from validation
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            CutError::Execution(ExecutionError::ToolFailed { .. })
                | CutError::Execution(ExecutionError::NoFrame { .. })
        )
    }

    /// Whether the external tool is missing entirely
    pub fn is_tool_missing(&self) -> bool {
        matches!(self, CutError::Execution(ExecutionError::ToolNotFound { .. }))
    }
}
