//! Heart rhythm: tap in time with beats crossing a timing line.
//!
//! Beats are scheduled in batches from the current heart rate. Each one
//! reaches the timing line [`TRAVEL_MS`] after it spawns and is written
//! off as missed [`MISS_AFTER_MS`] after crossing. Survive the whole
//! duration with at least half the heart health to win.

use rand::Rng;
use serde::Serialize;

use super::{Challenge, GameRng, GameStatus, Reward, RewardLatch};
use crate::progress::challenge::RHYTHM;

pub const BATCH_SIZE: usize = 20;
pub const REFILL_BELOW: usize = 10;
pub const MIN_SPACING_MS: f64 = 400.0;
pub const TRAVEL_MS: u64 = 4000;
pub const MISS_AFTER_MS: u64 = 4500;
pub const INPUT_WINDOW_MS: u64 = 1000;
pub const GOOD_MS: u64 = 200;
pub const PERFECT_MS: u64 = 100;
pub const RESTING_HEART_RATE: f64 = 72.0;
pub const MAX_HEALTH: i32 = 100;
pub const WIN_HEALTH: i32 = 50;

const DIFFICULTY_STEP_MS: u64 = 20_000;
const HEART_RATE_EASING: f64 = 0.1;

pub const REWARD: Reward = Reward {
    challenge: RHYTHM,
    digit: "2",
    position: 4,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatState {
    Pending,
    Hit { perfect: bool },
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Beat {
    pub id: u32,
    pub spawn_ms: u64,
    pub state: BeatState,
}

impl Beat {
    /// When the beat sits on the timing line.
    pub fn cross_ms(&self) -> u64 {
        self.spawn_ms + TRAVEL_MS
    }

    fn is_pending(&self) -> bool {
        self.state == BeatState::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Not running, or no beat near the line.
    Ignored,
    Perfect,
    Good,
    Miss,
}

#[derive(Debug, Clone)]
pub struct RhythmGame {
    rng: GameRng,
    duration_ms: u64,
    clock_ms: u64,
    beats: Vec<Beat>,
    next_id: u32,
    heart_rate: f64,
    difficulty: f64,
    health: i32,
    score: u32,
    streak: u32,
    perfect_hits: u32,
    hits: u32,
    started: bool,
    status: GameStatus,
    latch: RewardLatch,
}

impl RhythmGame {
    pub fn new(rng: GameRng, duration_secs: u64) -> Self {
        Self {
            rng,
            duration_ms: duration_secs * 1000,
            clock_ms: 0,
            beats: Vec::new(),
            next_id: 0,
            heart_rate: RESTING_HEART_RATE,
            difficulty: 1.0,
            health: MAX_HEALTH,
            score: 0,
            streak: 0,
            perfect_hits: 0,
            hits: 0,
            started: false,
            status: GameStatus::Playing,
            latch: RewardLatch::default(),
        }
    }

    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.schedule_batch();
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn time_left(&self) -> u64 {
        self.duration_ms.saturating_sub(self.clock_ms).div_ceil(1000)
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn perfect_hits(&self) -> u32 {
        self.perfect_hits
    }

    pub fn hits(&self) -> u32 {
        self.hits
    }

    pub fn heart_rate(&self) -> f64 {
        self.heart_rate
    }

    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    /// Player input: judge the pending beat nearest the timing line.
    pub fn press(&mut self) -> HitOutcome {
        if !self.started || self.status != GameStatus::Playing {
            return HitOutcome::Ignored;
        }
        let now = self.clock_ms;
        let nearest = self
            .beats
            .iter_mut()
            .filter(|b| b.is_pending())
            .map(|b| (b.cross_ms().abs_diff(now), b))
            .filter(|(distance, _)| *distance < INPUT_WINDOW_MS)
            .min_by_key(|(distance, _)| *distance);

        let Some((distance, beat)) = nearest else {
            return HitOutcome::Ignored;
        };

        if distance > GOOD_MS {
            self.streak = 0;
            self.health = (self.health - 5).max(0);
            return HitOutcome::Miss;
        }

        let perfect = distance <= PERFECT_MS;
        beat.state = BeatState::Hit { perfect };
        self.streak += 1;
        self.hits += 1;
        if perfect {
            self.score += 100;
            self.perfect_hits += 1;
            self.health = (self.health + 2).min(MAX_HEALTH);
            HitOutcome::Perfect
        } else {
            self.score += 50;
            self.health = (self.health + 1).min(MAX_HEALTH);
            HitOutcome::Good
        }
    }

    /// Let `elapsed_ms` of game time pass. One call is one frame.
    pub fn advance(&mut self, elapsed_ms: u64) {
        if !self.started || self.status != GameStatus::Playing {
            return;
        }
        self.clock_ms += elapsed_ms;

        let now = self.clock_ms;
        for beat in self.beats.iter_mut().filter(|b| b.is_pending()) {
            if now > beat.cross_ms() + MISS_AFTER_MS {
                beat.state = BeatState::Missed;
                self.health = (self.health - 10).max(0);
                self.streak = 0;
            }
        }

        self.difficulty = 1.0 + (now / DIFFICULTY_STEP_MS) as f64 * 0.5;
        let target = RESTING_HEART_RATE
            + (self.difficulty - 1.0) * 10.0
            + f64::from(MAX_HEALTH - self.health) * 0.3;
        self.heart_rate += (target - self.heart_rate) * HEART_RATE_EASING;

        if self.beats.iter().filter(|b| b.is_pending()).count() < REFILL_BELOW {
            self.schedule_batch();
        }

        if self.health <= 0 {
            self.status = GameStatus::Lost;
        } else if now >= self.duration_ms {
            self.status = if self.health >= WIN_HEALTH {
                GameStatus::Won
            } else {
                GameStatus::Lost
            };
        }
        if self.status != GameStatus::Playing {
            tracing::debug!(status = ?self.status, health = self.health, score = self.score, "rhythm game over");
        }
    }

    /// Drop resolved beats and append a batch after the last pending one.
    fn schedule_batch(&mut self) {
        self.beats.retain(Beat::is_pending);

        let interval = 60_000.0 / self.heart_rate;
        let jitter = self.difficulty * 30.0;
        let anchor = self
            .beats
            .iter()
            .map(|b| b.spawn_ms)
            .max()
            .unwrap_or(self.clock_ms) as f64;

        let mut previous: Option<f64> = None;
        for i in 0..BATCH_SIZE {
            let base = anchor + (i + 1) as f64 * interval;
            let mut at = base + (self.rng.gen::<f64>() - 0.5) * jitter;
            if let Some(prev) = previous {
                if at - prev < MIN_SPACING_MS {
                    at = prev + MIN_SPACING_MS;
                }
            }
            previous = Some(at);
            self.beats.push(Beat {
                id: self.next_id,
                spawn_ms: at.max(0.0).round() as u64,
                state: BeatState::Pending,
            });
            self.next_id += 1;
        }
    }
}

impl Challenge for RhythmGame {
    fn status(&self) -> GameStatus {
        self.status
    }

    fn reward(&self) -> Reward {
        REWARD
    }

    fn latch(&mut self) -> &mut RewardLatch {
        &mut self.latch
    }
}
