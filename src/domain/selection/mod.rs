// Range selector - Dual-handle interval selection over a media timeline

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::domain::errors::RangeError;
use crate::domain::model::{CutRequest, TimeSpec};

/// One of the two interval markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Handle {
    Start,
    End,
}

/// Snapshot of the selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub media_duration: TimeSpec,
    pub start: TimeSpec,
    pub end: TimeSpec,
    pub active_handle: Option<Handle>,
}

impl SelectionState {
    pub fn length(&self) -> TimeSpec {
        self.end.saturating_sub(self.start)
    }
}

/// What the UI should do once a drag gesture finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub handle: Handle,
    /// Timestamp for the final thumbnail refresh
    pub thumbnail_at: TimeSpec,
    /// Interval to hand to loop-preview playback
    pub preview_range: (TimeSpec, TimeSpec),
}

/// State machine behind the start/end handles.
///
/// Holds `0 <= start < end <= media_duration` and `end - start >= min_gap`
/// after every operation. A handle pushed against the other one stops at the
/// minimum gap instead of crossing it.
#[derive(Debug, Clone)]
pub struct RangeSelector {
    source: PathBuf,
    state: SelectionState,
    min_gap: TimeSpec,
}

impl RangeSelector {
    /// Select the whole media by default
    pub fn new(
        source: impl Into<PathBuf>,
        media_duration: TimeSpec,
        min_gap: TimeSpec,
    ) -> Result<Self, RangeError> {
        let min_gap = min_gap.max(TimeSpec::from_millis(1));
        if media_duration < min_gap {
            return Err(RangeError::ZeroLength {
                start: TimeSpec::ZERO,
                end: media_duration,
                minimum: min_gap,
            });
        }

        Ok(Self {
            source: source.into(),
            state: SelectionState {
                media_duration,
                start: TimeSpec::ZERO,
                end: media_duration,
                active_handle: None,
            },
            min_gap,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn min_gap(&self) -> TimeSpec {
        self.min_gap
    }

    pub fn begin_drag(&mut self, handle: Handle) {
        self.state.active_handle = Some(handle);
    }

    /// Move the handle being dragged; `None` when no drag is in progress
    pub fn move_active(&mut self, timestamp: TimeSpec) -> Option<TimeSpec> {
        let handle = self.state.active_handle?;
        Some(self.move_handle(handle, timestamp))
    }

    /// Finish the gesture; `None` when no drag was in progress
    pub fn end_drag(&mut self) -> Option<DragEnd> {
        let handle = self.state.active_handle.take()?;
        let thumbnail_at = match handle {
            Handle::Start => self.state.start,
            Handle::End => self.state.end,
        };
        Some(DragEnd {
            handle,
            thumbnail_at,
            preview_range: (self.state.start, self.state.end),
        })
    }

    /// Typed start time; out-of-media values are rejected rather than clamped
    pub fn set_start(&mut self, timestamp: TimeSpec) -> Result<TimeSpec, RangeError> {
        self.check_bounds(timestamp)?;
        Ok(self.move_handle(Handle::Start, timestamp))
    }

    /// Typed end time; out-of-media values are rejected rather than clamped
    pub fn set_end(&mut self, timestamp: TimeSpec) -> Result<TimeSpec, RangeError> {
        self.check_bounds(timestamp)?;
        Ok(self.move_handle(Handle::End, timestamp))
    }

    /// Snapshot the selection as a cut request
    pub fn commit(&self, destination: Option<PathBuf>) -> Result<CutRequest, RangeError> {
        let SelectionState { start, end, .. } = self.state;
        if end.saturating_sub(start) < self.min_gap {
            return Err(RangeError::ZeroLength {
                start,
                end,
                minimum: self.min_gap,
            });
        }
        CutRequest::new(self.source.clone(), start, end, destination)
    }

    fn check_bounds(&self, timestamp: TimeSpec) -> Result<(), RangeError> {
        if timestamp > self.state.media_duration {
            return Err(RangeError::OutOfBounds {
                value: timestamp,
                duration: self.state.media_duration,
            });
        }
        Ok(())
    }

    fn move_handle(&mut self, handle: Handle, timestamp: TimeSpec) -> TimeSpec {
        let clamped = timestamp.min(self.state.media_duration);
        match handle {
            Handle::Start => {
                let upper = self.state.end.saturating_sub(self.min_gap);
                self.state.start = clamped.min(upper);
                self.state.start
            }
            Handle::End => {
                let lower = self.state.start + self.min_gap;
                self.state.end = clamped.max(lower);
                self.state.end
            }
        }
    }
}

#[cfg(test)]
mod tests;
