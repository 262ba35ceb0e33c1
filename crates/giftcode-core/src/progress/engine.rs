//! Progression engine.
//!
//! Owns the canonical game state: countdown, completed challenges,
//! collected code digits, and the session phase. Like the countdown it
//! has no internal thread; the owner calls `tick()` once per second.
//!
//! ## Phase Transitions
//!
//! ```text
//! Running -> Won   (final challenge completed)
//! Running -> Lost  (countdown reaches zero first)
//! ```
//!
//! Both terminal phases stop the countdown. Only `reset_game()` leaves
//! them.
//!
//! Mutations mark the engine dirty per persisted key; the session
//! wrapper drains that with `take_dirty()` in its save step.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::challenge::{self, GatingMode, AMBULANCE, CHALLENGE_ORDER, CODE_LENGTH, FINAL};
use super::state::{DigitPolicy, GameState, DEFAULT_PLAYER_NAME};
use crate::events::Event;
use crate::timer::{Countdown, DEFAULT_SESSION_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Running,
    Won,
    Lost,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Phase::Running)
    }

    /// The single place terminal conditions are evaluated.
    fn derive(state: &GameState, time_left: u64) -> Self {
        if state.is_completed(FINAL) {
            Phase::Won
        } else if time_left == 0 {
            Phase::Lost
        } else {
            Phase::Running
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

/// Engine rules, normally built from `Config::engine_rules()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRules {
    pub session_secs: u64,
    pub player_name: String,
    pub gating: GatingMode,
    pub digit_policy: DigitPolicy,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            session_secs: DEFAULT_SESSION_SECS,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            gating: GatingMode::default(),
            digit_policy: DigitPolicy::default(),
        }
    }
}

/// Which persisted keys changed since the last save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dirty {
    pub state: bool,
    pub timer: bool,
    /// Snapshot must be deleted before anything is written.
    pub cleared: bool,
}

impl Dirty {
    pub fn any(&self) -> bool {
        self.state || self.timer || self.cleared
    }
}

#[derive(Debug, Clone)]
pub struct ProgressionEngine {
    rules: EngineRules,
    state: GameState,
    countdown: Countdown,
    dirty: Dirty,
}

impl ProgressionEngine {
    /// Fresh session: empty state, full countdown.
    pub fn new(rules: EngineRules) -> Self {
        let mut state = GameState::new(rules.player_name.clone());
        let countdown = Countdown::new(rules.session_secs);
        state.phase = Phase::derive(&state, countdown.time_left());
        Self {
            rules,
            state,
            countdown,
            dirty: Dirty::default(),
        }
    }

    /// Resume from a persisted snapshot.
    ///
    /// The player name always comes from the rules. A recorded terminal
    /// phase is final; records without one derive it from the countdown
    /// and the final challenge. Either way no event is emitted.
    pub fn restore(rules: EngineRules, mut state: GameState, time_left: u64) -> Self {
        state.player_name = rules.player_name.clone();
        if !state.phase.is_terminal() {
            state.phase = Phase::derive(&state, time_left);
        }
        Self {
            rules,
            state,
            countdown: Countdown::new(time_left),
            dirty: Dirty::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn rules(&self) -> &EngineRules {
        &self.rules
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn time_left(&self) -> u64 {
        self.countdown.time_left()
    }

    pub fn progress(&self) -> Progress {
        Progress {
            completed: self.state.completed_challenges.len(),
            total: challenge::total(),
        }
    }

    pub fn is_completed(&self, challenge: &str) -> bool {
        self.state.is_completed(challenge)
    }

    /// Lock query for views.
    ///
    /// The first challenge is never locked, unknown ids always are. The
    /// ambulance side game opens once anything has been completed.
    pub fn is_challenge_locked(&self, challenge: &str) -> bool {
        if challenge == AMBULANCE {
            return self.state.completed_challenges.is_empty();
        }
        match challenge::index_of(challenge) {
            None => true,
            Some(0) => false,
            Some(i) => match self.rules.gating {
                GatingMode::Predecessor => !self.state.is_completed(CHALLENGE_ORDER[i - 1]),
                GatingMode::Prefix => CHALLENGE_ORDER[..i]
                    .iter()
                    .any(|c| !self.state.is_completed(c)),
            },
        }
    }

    /// Whether the countdown is still decrementing.
    pub fn is_ticking(&self) -> bool {
        let progress = self.progress();
        self.state.phase == Phase::Running
            && progress.completed < progress.total
            && !self.countdown.is_expired()
    }

    /// Collected code, one char per position, `?` where missing.
    pub fn code(&self) -> String {
        (1..=CODE_LENGTH as u8)
            .map(|pos| {
                self.state
                    .digit(pos)
                    .and_then(|d| d.chars().next())
                    .unwrap_or('?')
            })
            .collect()
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let progress = self.progress();
        Event::StateSnapshot {
            phase: self.state.phase,
            player_name: self.state.player_name.clone(),
            time_left: self.countdown.time_left(),
            clock: self.countdown.clock(),
            completed_challenges: self.state.completed_challenges.clone(),
            code_digits: self.state.code_digits.clone(),
            current_challenge: self.state.current_challenge,
            completed: progress.completed,
            total: progress.total,
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Record a mini-game win. The only write path mini-games use.
    ///
    /// Unknown ids are ignored, and so is everything once the session
    /// is over. Completing the terminal challenge while running wins the
    /// session.
    pub fn complete_challenge(&mut self, challenge: &str, digit: &str, position: u8) -> Vec<Event> {
        let Some(index) = challenge::index_of(challenge) else {
            tracing::warn!(challenge, "ignoring completion of unknown challenge");
            return Vec::new();
        };
        if self.state.phase.is_terminal() {
            tracing::warn!(challenge, phase = ?self.state.phase, "ignoring completion after session end");
            return Vec::new();
        }

        let newly_completed = self.state.record_completion(challenge);
        self.state.set_digit(position, digit, self.rules.digit_policy);
        self.state.current_challenge = self.state.current_challenge.max(index + 1);
        self.dirty.state = true;

        let progress = self.progress();
        tracing::debug!(
            challenge,
            digit,
            position,
            newly_completed,
            completed = progress.completed,
            "challenge completed"
        );

        let mut events = vec![Event::ChallengeCompleted {
            challenge: challenge.to_string(),
            newly_completed,
            position,
            digit: digit.to_string(),
            completed: progress.completed,
            total: progress.total,
            at: Utc::now(),
        }];

        if challenge::is_terminal(challenge) {
            self.state.phase = Phase::Won;
            tracing::info!(time_left = self.time_left(), "session won");
            events.push(Event::SessionWon {
                time_left: self.time_left(),
                at: Utc::now(),
            });
        }
        events
    }

    /// Add reward time. Applies in every phase but never revives a
    /// terminal one.
    pub fn add_time_bonus(&mut self, seconds: u64) -> Event {
        let time_left = self.countdown.add(seconds);
        self.dirty.timer = true;
        tracing::debug!(seconds, time_left, "time bonus added");
        Event::TimeBonusAdded {
            seconds,
            time_left,
            at: Utc::now(),
        }
    }

    /// Advance the countdown by one second.
    ///
    /// Returns `None` when the countdown is not running. The tick that
    /// reaches zero returns `SessionLost`; later ticks return `None`.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.is_ticking() {
            return None;
        }
        let time_left = self.countdown.tick();
        self.dirty.timer = true;

        if time_left == 0 && !self.state.is_completed(FINAL) {
            self.state.phase = Phase::Lost;
            self.dirty.state = true;
            let progress = self.progress();
            tracing::info!(completed = progress.completed, "session lost");
            return Some(Event::SessionLost {
                completed: progress.completed,
                total: progress.total,
                at: Utc::now(),
            });
        }
        Some(Event::TimerTicked {
            time_left,
            at: Utc::now(),
        })
    }

    /// Back to defaults. The persisted snapshot is cleared on next save.
    pub fn reset_game(&mut self) -> Event {
        self.state = GameState::new(self.rules.player_name.clone());
        self.countdown.reset(self.rules.session_secs);
        self.state.phase = Phase::derive(&self.state, self.countdown.time_left());
        self.dirty = Dirty {
            state: false,
            timer: false,
            cleared: true,
        };
        tracing::info!(time_left = self.time_left(), "game reset");
        Event::GameReset {
            time_left: self.time_left(),
            at: Utc::now(),
        }
    }

    /// Drain the dirty flags for the save step.
    pub fn take_dirty(&mut self) -> Dirty {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for ProgressionEngine {
    fn default() -> Self {
        Self::new(EngineRules::default())
    }
}
