//! Common utilities and helpers

pub mod path;

use std::collections::VecDeque;
use std::time::Duration;

/// Format duration for display
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    let milliseconds = duration.subsec_millis();

    if hours > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
    } else {
        format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
    }
}

/// Bounded buffer keeping the last lines of a tool's diagnostics
#[derive(Debug, Clone)]
pub struct LineTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LineTail {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.trim().is_empty() {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Lines joined with ` | ` so the tail fits on one line of output
    pub fn joined(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim())
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(61_250)), "01:01.250");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "01:02:05.000");
    }

    #[test]
    fn test_line_tail_keeps_last_lines() {
        let mut tail = LineTail::new(2);
        tail.push("first");
        tail.push("   ");
        tail.push("second");
        tail.push("third\n");
        assert_eq!(tail.joined(), "second | third");
    }
}
