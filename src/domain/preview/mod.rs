// Loop preview - Replays the selected interval while the user reviews it

use crate::domain::model::TimeSpec;

/// Default distance before the end handle at which playback wraps
pub const DEFAULT_LOOP_MARGIN: TimeSpec = TimeSpec::from_millis(120);

/// Instruction for the player after a position update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    Continue,
    SeekTo(TimeSpec),
}

/// Loop-playback controller over `[start, end]`.
///
/// The player itself belongs to the UI; this type only decides where it
/// should be. It ignores drag state entirely so the user can keep auditioning
/// while adjusting the handles.
#[derive(Debug, Clone)]
pub struct LoopPreview {
    start: TimeSpec,
    end: TimeSpec,
    margin: TimeSpec,
    paused: bool,
}

impl LoopPreview {
    pub fn new(start: TimeSpec, end: TimeSpec, margin: TimeSpec) -> Self {
        Self {
            start,
            end: end.max(start),
            margin,
            paused: false,
        }
    }

    pub fn range(&self) -> (TimeSpec, TimeSpec) {
        (self.start, self.end)
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Last position played before wrapping back to the start
    pub fn loop_end(&self) -> TimeSpec {
        self.end.saturating_sub(self.margin).max(self.start)
    }

    /// Replace the looped interval; returns where playback restarts
    pub fn set_range(&mut self, start: TimeSpec, end: TimeSpec) -> TimeSpec {
        self.start = start;
        self.end = end.max(start);
        self.start
    }

    /// React to a position report from the player
    pub fn on_position(&self, position: TimeSpec) -> PreviewAction {
        if self.paused {
            return PreviewAction::Continue;
        }
        if position >= self.loop_end() || position < self.start {
            PreviewAction::SeekTo(self.start)
        } else {
            PreviewAction::Continue
        }
    }

    /// Step forwards or backwards, staying inside the loop
    pub fn seek_by(&self, position: TimeSpec, delta_millis: i64) -> TimeSpec {
        let target = if delta_millis >= 0 {
            position + TimeSpec::from_millis(delta_millis.unsigned_abs())
        } else {
            position.saturating_sub(TimeSpec::from_millis(delta_millis.unsigned_abs()))
        };
        target.clamp(self.start, self.loop_end())
    }

    /// Position relative to the loop start, for a scrub slider
    pub fn relative_position(&self, position: TimeSpec) -> TimeSpec {
        position
            .clamp(self.start, self.end)
            .saturating_sub(self.start)
    }

    /// Returns the paused state after toggling
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Rewind to the loop start, optionally resuming playback
    pub fn restart(&mut self, auto_play: bool) -> TimeSpec {
        self.paused = !auto_play;
        self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> TimeSpec {
        TimeSpec::from_millis(value)
    }

    #[test]
    fn test_wraps_at_loop_margin() {
        let preview = LoopPreview::new(ms(5_000), ms(12_000), DEFAULT_LOOP_MARGIN);
        assert_eq!(preview.loop_end(), ms(11_880));
        assert_eq!(preview.on_position(ms(8_000)), PreviewAction::Continue);
        assert_eq!(preview.on_position(ms(11_880)), PreviewAction::SeekTo(ms(5_000)));
        assert_eq!(preview.on_position(ms(4_000)), PreviewAction::SeekTo(ms(5_000)));
    }

    #[test]
    fn test_paused_preview_never_seeks() {
        let mut preview = LoopPreview::new(ms(0), ms(1_000), DEFAULT_LOOP_MARGIN);
        assert!(preview.toggle_pause());
        assert_eq!(preview.on_position(ms(999)), PreviewAction::Continue);
        assert!(!preview.toggle_pause());
    }

    #[test]
    fn test_seek_by_stays_in_loop() {
        let preview = LoopPreview::new(ms(5_000), ms(12_000), DEFAULT_LOOP_MARGIN);
        assert_eq!(preview.seek_by(ms(6_000), 1_000), ms(7_000));
        assert_eq!(preview.seek_by(ms(5_500), -1_000), ms(5_000));
        assert_eq!(preview.seek_by(ms(11_500), 1_000), ms(11_880));
        assert_eq!(preview.seek_by(ms(0), -1_000), ms(5_000));
    }

    #[test]
    fn test_short_range_loop_end_never_precedes_start() {
        let preview = LoopPreview::new(ms(5_000), ms(5_050), DEFAULT_LOOP_MARGIN);
        assert_eq!(preview.loop_end(), ms(5_000));
    }

    #[test]
    fn test_relative_position_and_restart() {
        let mut preview = LoopPreview::new(ms(5_000), ms(12_000), DEFAULT_LOOP_MARGIN);
        assert_eq!(preview.relative_position(ms(6_500)), ms(1_500));
        assert_eq!(preview.relative_position(ms(20_000)), ms(7_000));

        assert_eq!(preview.set_range(ms(1_000), ms(3_000)), ms(1_000));
        assert_eq!(preview.restart(false), ms(1_000));
        assert!(preview.is_paused());
        preview.restart(true);
        assert!(!preview.is_paused());
    }
}
