// Domain models - Core types and data structures

use std::fmt;
use std::ops::Add;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::{CutError, ParseError, RangeError};

/// Non-negative time value with millisecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSpec {
    millis: u64,
}

impl TimeSpec {
    pub const ZERO: TimeSpec = TimeSpec { millis: 0 };

    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    /// Rounds to the nearest millisecond; negative and non-finite input yields `None`
    pub fn from_seconds(seconds: f64) -> Option<Self> {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(Self {
            millis: (seconds * 1000.0).round() as u64,
        })
    }

    /// `None` when the total does not fit in a `u64` of milliseconds
    pub fn from_components(hours: u64, minutes: u64, seconds: u64, millis: u64) -> Option<Self> {
        hours
            .checked_mul(60)?
            .checked_add(minutes)?
            .checked_mul(60)?
            .checked_add(seconds)?
            .checked_mul(1000)?
            .checked_add(millis)
            .map(TimeSpec::from_millis)
    }

    pub fn checked_add(self, other: TimeSpec) -> Option<TimeSpec> {
        self.millis.checked_add(other.millis).map(TimeSpec::from_millis)
    }

    pub fn as_millis(&self) -> u64 {
        self.millis
    }

    pub fn as_seconds(&self) -> f64 {
        self.millis as f64 / 1000.0
    }

    pub fn to_duration(&self) -> Duration {
        Duration::from_millis(self.millis)
    }

    pub fn saturating_sub(self, other: TimeSpec) -> TimeSpec {
        TimeSpec::from_millis(self.millis.saturating_sub(other.millis))
    }

    pub fn checked_sub(self, other: TimeSpec) -> Option<TimeSpec> {
        self.millis.checked_sub(other.millis).map(TimeSpec::from_millis)
    }

    /// Parse `SS[.fff]`, `MM:SS[.fff]` or `HH:MM:SS[.fff]`
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ParseError::invalid(input, "empty time"));
        }
        if trimmed.starts_with('-') {
            return Err(ParseError::invalid(input, "time cannot be negative"));
        }

        let fields: Vec<&str> = trimmed.split(':').collect();
        match fields.as_slice() {
            [seconds] => parse_seconds_field(input, seconds),
            [minutes, seconds] => {
                let minutes = parse_integer_field(input, minutes)?;
                let seconds = parse_seconds_field(input, seconds)?;
                clock_time(input, 0, minutes, seconds)
            }
            [hours, minutes, seconds] => {
                let hours = parse_integer_field(input, hours)?;
                let minutes = parse_integer_field(input, minutes)?;
                let seconds = parse_seconds_field(input, seconds)?;
                clock_time(input, hours, minutes, seconds)
            }
            _ => Err(ParseError::invalid(
                input,
                "expected seconds (12.5), MM:SS or HH:MM:SS[.mmm]",
            )),
        }
    }
}

fn clock_time(input: &str, hours: u64, minutes: u64, seconds: TimeSpec) -> Result<TimeSpec, ParseError> {
    TimeSpec::from_components(hours, minutes, 0, 0)
        .and_then(|base| base.checked_add(seconds))
        .ok_or_else(|| ParseError::invalid(input, "clock field out of range"))
}

fn parse_integer_field(input: &str, field: &str) -> Result<u64, ParseError> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::invalid(input, "clock fields must be non-negative integers"));
    }
    field
        .parse::<u64>()
        .map_err(|_| ParseError::invalid(input, "clock field out of range"))
}

/// Whole seconds with an optional fraction, rounded to milliseconds
fn parse_seconds_field(input: &str, field: &str) -> Result<TimeSpec, ParseError> {
    let (whole, fraction) = match field.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (field, None),
    };

    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !fraction.map_or(true, digits_only) {
        return Err(ParseError::invalid(input, "seconds must be a non-negative decimal number"));
    }
    if whole.is_empty() && fraction.map_or(true, str::is_empty) {
        return Err(ParseError::invalid(input, "missing seconds value"));
    }

    let whole_secs = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<u64>()
            .map_err(|_| ParseError::invalid(input, "seconds value out of range"))?
    };

    let millis = match fraction {
        Some(frac) if !frac.is_empty() => {
            // Round on the fourth digit, ignore the rest.
            let mut padded: Vec<u64> = frac.bytes().take(4).map(|b| u64::from(b - b'0')).collect();
            padded.resize(4, 0);
            let ten_thousandths = padded.iter().fold(0, |acc, d| acc * 10 + d);
            (ten_thousandths + 5) / 10
        }
        _ => 0,
    };

    whole_secs
        .checked_mul(1000)
        .and_then(|ms| ms.checked_add(millis))
        .map(TimeSpec::from_millis)
        .ok_or_else(|| ParseError::invalid(input, "seconds value out of range"))
}

impl Add for TimeSpec {
    type Output = TimeSpec;

    fn add(self, rhs: TimeSpec) -> TimeSpec {
        TimeSpec::from_millis(self.millis.saturating_add(rhs.millis))
    }
}

impl fmt::Display for TimeSpec {
    /// `HH:MM:SS.mmm`, the form the media tool expects
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.millis / 3_600_000;
        let minutes = (self.millis % 3_600_000) / 60_000;
        let seconds = (self.millis % 60_000) / 1000;
        let millis = self.millis % 1000;
        write!(f, "{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

/// How a cut attempt invokes the media tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutMode {
    /// Re-mux packets without decoding; boundaries snap to keyframes
    Copy,
    /// Full decode and encode; frame-accurate boundaries
    Reencode,
}

impl fmt::Display for CutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutMode::Copy => write!(f, "copy"),
            CutMode::Reencode => write!(f, "reencode"),
        }
    }
}

/// Which modes the executor is allowed to try, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutStrategy {
    /// Stream copy first, re-encode once if that fails
    #[default]
    Auto,
    Copy,
    Reencode,
}

impl CutStrategy {
    pub fn parse(value: &str) -> Result<Self, CutError> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Ok(CutStrategy::Auto),
            "copy" => Ok(CutStrategy::Copy),
            "reencode" | "re-encode" => Ok(CutStrategy::Reencode),
            other => Err(CutError::Config(format!(
                "unknown cut mode '{}' (expected auto, copy or reencode)",
                other
            ))),
        }
    }

    pub fn modes(&self) -> &'static [CutMode] {
        match self {
            CutStrategy::Auto => &[CutMode::Copy, CutMode::Reencode],
            CutStrategy::Copy => &[CutMode::Copy],
            CutStrategy::Reencode => &[CutMode::Reencode],
        }
    }
}

/// A validated request to cut `[start, end)` out of `source`
#[derive(Debug, Clone, PartialEq)]
pub struct CutRequest {
    source: PathBuf,
    start: TimeSpec,
    end: TimeSpec,
    destination: Option<PathBuf>,
    allow_overwrite: bool,
    cleanup_on_failure: bool,
}

impl CutRequest {
    pub fn new(
        source: impl Into<PathBuf>,
        start: TimeSpec,
        end: TimeSpec,
        destination: Option<PathBuf>,
    ) -> Result<Self, RangeError> {
        if end <= start {
            return Err(RangeError::ZeroLength {
                start,
                end,
                minimum: TimeSpec::from_millis(1),
            });
        }
        Ok(Self {
            source: source.into(),
            start,
            end,
            destination,
            allow_overwrite: false,
            cleanup_on_failure: false,
        })
    }

    /// Let the tool replace an existing destination
    pub fn with_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    /// Delete partial output when every attempt fails
    pub fn with_cleanup_on_failure(mut self, cleanup: bool) -> Self {
        self.cleanup_on_failure = cleanup;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn start(&self) -> TimeSpec {
        self.start
    }

    pub fn end(&self) -> TimeSpec {
        self.end
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    pub fn allow_overwrite(&self) -> bool {
        self.allow_overwrite
    }

    pub fn cleanup_on_failure(&self) -> bool {
        self.cleanup_on_failure
    }

    pub fn duration(&self) -> TimeSpec {
        self.end.saturating_sub(self.start)
    }

    /// Check the interval against a known media duration
    pub fn validate_against_duration(&self, media_duration: TimeSpec) -> Result<(), RangeError> {
        if self.end > media_duration {
            return Err(RangeError::OutOfBounds {
                value: self.end,
                duration: media_duration,
            });
        }
        Ok(())
    }
}

/// A single still frame pulled from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailFrame {
    pub timestamp: TimeSpec,
    pub image_data: Vec<u8>,
}

/// Result of a finished cut
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutOutcome {
    pub destination: PathBuf,
    pub mode_used: CutMode,
    /// True when the copy attempt failed and re-encode produced the file
    pub fell_back: bool,
    pub elapsed: Duration,
}
