//! Persisted game state record.
//!
//! Field names serialize in camelCase so the JSON stored under the
//! `game-state` key keeps the layout the browser build wrote.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::challenge::{self, CODE_LENGTH};
use super::engine::Phase;

/// What happens when a digit position is written a second time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitPolicy {
    /// Re-completion overwrites the stored digit.
    #[default]
    LastWrite,
    /// The first stored digit for a position is kept.
    FirstWrite,
}

pub const DEFAULT_PLAYER_NAME: &str = "Dominik";

fn default_player_name() -> String {
    DEFAULT_PLAYER_NAME.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// Completed challenge ids in completion order, without duplicates.
    #[serde(default)]
    pub completed_challenges: Vec<String>,
    /// Code digit by 1-based position.
    #[serde(default)]
    pub code_digits: BTreeMap<u8, String>,
    /// Highest unlocked index, cached from completions.
    #[serde(default)]
    pub current_challenge: usize,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    /// Written once the session ends; absent while running.
    #[serde(default, skip_serializing_if = "is_running")]
    pub phase: Phase,
}

fn is_running(phase: &Phase) -> bool {
    !phase.is_terminal()
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYER_NAME)
    }
}

impl GameState {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            completed_challenges: Vec::new(),
            code_digits: BTreeMap::new(),
            current_challenge: 0,
            player_name: player_name.into(),
            phase: Phase::Running,
        }
    }

    pub fn is_completed(&self, challenge: &str) -> bool {
        self.completed_challenges.iter().any(|c| c == challenge)
    }

    /// Append `challenge` unless already present. Returns true if appended.
    pub fn record_completion(&mut self, challenge: &str) -> bool {
        if self.is_completed(challenge) {
            return false;
        }
        self.completed_challenges.push(challenge.to_string());
        true
    }

    /// Store `digit` at `position`, empty or not.
    ///
    /// Returns true if the stored value changed.
    pub fn set_digit(&mut self, position: u8, digit: &str, policy: DigitPolicy) -> bool {
        match (policy, self.code_digits.get(&position)) {
            (DigitPolicy::FirstWrite, Some(_)) => false,
            (_, Some(existing)) if existing == digit => false,
            _ => {
                self.code_digits.insert(position, digit.to_string());
                true
            }
        }
    }

    pub fn digit(&self, position: u8) -> Option<&str> {
        self.code_digits.get(&position).map(String::as_str)
    }

    /// Non-empty digits in code positions 1..=5.
    pub fn digits_collected(&self) -> usize {
        (1..=CODE_LENGTH as u8)
            .filter(|pos| self.digit(*pos).is_some_and(|d| !d.is_empty()))
            .count()
    }

    /// Drop duplicate and unknown challenge ids from a loaded record,
    /// keeping first occurrences. Returns true if anything was removed.
    pub fn sanitize(&mut self) -> bool {
        let before = self.completed_challenges.len();
        let mut seen = Vec::with_capacity(before);
        self.completed_challenges.retain(|c| {
            if challenge::index_of(c).is_none() || seen.contains(c) {
                return false;
            }
            seen.push(c.clone());
            true
        });
        self.current_challenge = self.current_challenge.min(challenge::total());
        self.completed_challenges.len() != before
    }
}
