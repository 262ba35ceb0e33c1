use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::progress::Phase;

/// Every state change in the session produces an Event.
/// Views poll for them; the CLI prints them as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ChallengeCompleted {
        challenge: String,
        /// False when the challenge was already in the completed set.
        newly_completed: bool,
        position: u8,
        digit: String,
        completed: usize,
        total: usize,
        at: DateTime<Utc>,
    },
    TimeBonusAdded {
        seconds: u64,
        time_left: u64,
        at: DateTime<Utc>,
    },
    TimerTicked {
        time_left: u64,
        at: DateTime<Utc>,
    },
    /// Countdown hit zero before the final challenge. Emitted once.
    SessionLost {
        completed: usize,
        total: usize,
        at: DateTime<Utc>,
    },
    /// Final code accepted. Emitted once.
    SessionWon {
        time_left: u64,
        at: DateTime<Utc>,
    },
    GameReset {
        time_left: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        player_name: String,
        time_left: u64,
        clock: String,
        completed_challenges: Vec<String>,
        code_digits: BTreeMap<u8, String>,
        current_challenge: usize,
        completed: usize,
        total: usize,
        at: DateTime<Utc>,
    },
}
