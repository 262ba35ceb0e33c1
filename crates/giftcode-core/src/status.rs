//! Player status read-model.
//!
//! Pure derivations over the countdown and progress, for the status
//! panel and the game-over screen. Nothing here mutates the session.

use serde::Serialize;

use crate::progress::challenge::{CHALLENGE_ORDER, FINAL};
use crate::progress::{GameState, ProgressionEngine};
use crate::timer::format_clock;

/// Venom and heart rate are scaled against a fifteen minute session.
pub const REFERENCE_TOTAL_SECS: u64 = 900;

/// Missions shown on the panel: every ordered challenge except the vault.
pub const MISSIONS: usize = CHALLENGE_ORDER.len() - 1;

const BASE_HEART_RATE: f64 = 70.0;
const HEART_RATE_SPAN: f64 = 80.0;
const MAX_HEART_RATE: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Stable,
    Warning,
    Dangerous,
    Critical,
}

impl Urgency {
    pub fn from_time_left(time_left: u64) -> Self {
        match time_left {
            t if t < 180 => Urgency::Critical,
            t if t < 300 => Urgency::Dangerous,
            t if t < 600 => Urgency::Warning,
            _ => Urgency::Stable,
        }
    }

    /// Heart rate multiplier.
    pub fn stress(self) -> f64 {
        match self {
            Urgency::Critical => 1.8,
            Urgency::Dangerous => 1.4,
            Urgency::Warning => 1.2,
            Urgency::Stable => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alertness {
    Clear,
    Tired,
    Dazed,
}

impl Alertness {
    pub fn from_time_left(time_left: u64) -> Self {
        match time_left {
            t if t < 180 => Alertness::Dazed,
            t if t < 600 => Alertness::Tired,
            _ => Alertness::Clear,
        }
    }
}

fn elapsed_fraction(time_left: u64) -> f64 {
    let elapsed = REFERENCE_TOTAL_SECS.saturating_sub(time_left);
    (elapsed as f64 / REFERENCE_TOTAL_SECS as f64).min(1.0)
}

/// Percent of the reference session already gone, 0..=100.
pub fn venom_level(time_left: u64) -> f64 {
    elapsed_fraction(time_left) * 100.0
}

pub fn heart_rate(time_left: u64) -> u32 {
    let stress = Urgency::from_time_left(time_left).stress();
    let rate = ((BASE_HEART_RATE + elapsed_fraction(time_left) * HEART_RATE_SPAN) * stress).round();
    (rate as u32).min(MAX_HEART_RATE)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissionStatus {
    pub challenge: &'static str,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub player_name: String,
    pub time_left: u64,
    pub clock: String,
    pub urgency: Urgency,
    pub alertness: Alertness,
    pub venom_percent: u32,
    pub heart_rate: u32,
    pub missions_done: usize,
    pub missions_total: usize,
    pub digits_collected: usize,
    pub code: String,
    pub missions: Vec<MissionStatus>,
}

impl PlayerStatus {
    pub fn from_engine(engine: &ProgressionEngine) -> Self {
        let time_left = engine.time_left();
        let missions = CHALLENGE_ORDER[..MISSIONS]
            .iter()
            .map(|c| MissionStatus {
                challenge: *c,
                completed: engine.is_completed(c),
            })
            .collect();

        Self {
            player_name: engine.state().player_name.clone(),
            time_left,
            clock: format_clock(time_left),
            urgency: Urgency::from_time_left(time_left),
            alertness: Alertness::from_time_left(time_left),
            venom_percent: venom_level(time_left).round() as u32,
            heart_rate: heart_rate(time_left),
            missions_done: engine.progress().completed.min(MISSIONS),
            missions_total: MISSIONS,
            digits_collected: engine.state().digits_collected(),
            code: engine.code(),
            missions,
        }
    }
}

/// Summary for the game-over screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Rescued,
    /// Every mission done, but the code was not entered in time.
    AllButCode,
    /// Three or four missions.
    Close,
    /// One or two missions.
    Few,
    None,
}

impl Outcome {
    pub fn evaluate(state: &GameState) -> Self {
        if state.is_completed(FINAL) {
            return Outcome::Rescued;
        }
        match state.completed_challenges.len() {
            0 => Outcome::None,
            1..=2 => Outcome::Few,
            n if n < MISSIONS => Outcome::Close,
            _ => Outcome::AllButCode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::challenge::{MAZE, MEMORY, PUZZLE, RHYTHM, RIDDLE};

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::from_time_left(900), Urgency::Stable);
        assert_eq!(Urgency::from_time_left(600), Urgency::Stable);
        assert_eq!(Urgency::from_time_left(599), Urgency::Warning);
        assert_eq!(Urgency::from_time_left(299), Urgency::Dangerous);
        assert_eq!(Urgency::from_time_left(179), Urgency::Critical);
        assert_eq!(Urgency::from_time_left(0), Urgency::Critical);
    }

    #[test]
    fn venom_rises_with_elapsed_time() {
        assert_eq!(venom_level(900), 0.0);
        assert_eq!(venom_level(450), 50.0);
        assert_eq!(venom_level(0), 100.0);
        assert_eq!(venom_level(1200), 0.0);
    }

    #[test]
    fn heart_rate_curve() {
        assert_eq!(heart_rate(900), 70);
        // 780 s elapsed of 900, stress 1.8, capped
        assert_eq!(heart_rate(120), 200);
        // (70 + 80/3) * 1.2 = 116
        assert_eq!(heart_rate(600 - 1), 116);
        assert_eq!(heart_rate(0), 200);
    }

    #[test]
    fn status_panel_snapshot() {
        let mut engine = ProgressionEngine::default();
        engine.complete_challenge(MEMORY, "7", 1);
        let status = PlayerStatus::from_engine(&engine);
        assert_eq!(status.clock, "15:00");
        assert_eq!(status.missions_done, 1);
        assert_eq!(status.missions_total, 5);
        assert_eq!(status.digits_collected, 1);
        assert_eq!(status.code, "7????");
        assert!(status.missions[0].completed);
        assert!(!status.missions[1].completed);
    }

    #[test]
    fn outcome_buckets() {
        let mut state = GameState::default();
        assert_eq!(Outcome::evaluate(&state), Outcome::None);
        state.record_completion(MEMORY);
        assert_eq!(Outcome::evaluate(&state), Outcome::Few);
        state.record_completion(PUZZLE);
        state.record_completion(MAZE);
        assert_eq!(Outcome::evaluate(&state), Outcome::Close);
        state.record_completion(RHYTHM);
        assert_eq!(Outcome::evaluate(&state), Outcome::Close);
        state.record_completion(RIDDLE);
        assert_eq!(Outcome::evaluate(&state), Outcome::AllButCode);
        state.record_completion(FINAL);
        assert_eq!(Outcome::evaluate(&state), Outcome::Rescued);
    }
}
