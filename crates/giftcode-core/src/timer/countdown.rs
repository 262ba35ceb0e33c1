//! Session countdown.
//!
//! Whole seconds, one decrement per tick. The countdown never goes below
//! zero and has no upper cap, so time bonuses may exceed the starting
//! budget.

use serde::{Deserialize, Serialize};

/// Default session length: 15 minutes.
pub const DEFAULT_SESSION_SECS: u64 = 15 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    time_left: u64,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_SECS)
    }
}

impl Countdown {
    pub fn new(time_left: u64) -> Self {
        Self { time_left }
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn is_expired(&self) -> bool {
        self.time_left == 0
    }

    /// Decrement by one second. Returns the new value.
    pub fn tick(&mut self) -> u64 {
        self.time_left = self.time_left.saturating_sub(1);
        self.time_left
    }

    /// Add `seconds` to the remaining time. Returns the new value.
    pub fn add(&mut self, seconds: u64) -> u64 {
        self.time_left = self.time_left.saturating_add(seconds);
        self.time_left
    }

    pub fn reset(&mut self, duration_secs: u64) {
        self.time_left = duration_secs;
    }

    pub fn clock(&self) -> String {
        format_clock(self.time_left)
    }
}

/// Format seconds as `m:ss`.
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_saturates_at_zero() {
        let mut countdown = Countdown::new(2);
        assert_eq!(countdown.tick(), 1);
        assert_eq!(countdown.tick(), 0);
        assert_eq!(countdown.tick(), 0);
        assert!(countdown.is_expired());
    }

    #[test]
    fn add_has_no_cap() {
        let mut countdown = Countdown::default();
        assert_eq!(countdown.add(15), DEFAULT_SESSION_SECS + 15);
    }

    #[test]
    fn clock_formatting() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(65), "1:05");
        assert_eq!(format_clock(900), "15:00");
        assert_eq!(format_clock(3601), "60:01");
    }
}
