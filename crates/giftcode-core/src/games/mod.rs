//! Mini-game rule engines.
//!
//! Each game is a self-contained state machine. None of them touch the
//! progression engine directly: on their win condition they hold a
//! [`Reward`], and the owner claims it once through
//! [`Challenge::take_reward`] and hands it to the session.
//!
//! Randomness is a seeded PCG so any game can be replayed in tests.

pub mod ambulance;
pub mod bomb_maze;
pub mod memory;
pub mod rhythm;
pub mod riddle;
pub mod tile_merge;
pub mod vault;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// What a won mini-game contributes to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub challenge: &'static str,
    pub digit: &'static str,
    pub position: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Playing,
    Won,
    Lost,
}

/// Hands a reward out at most once.
#[derive(Debug, Clone, Default)]
pub struct RewardLatch {
    claimed: bool,
}

impl RewardLatch {
    pub fn claim(&mut self, reward: Reward) -> Option<Reward> {
        if self.claimed {
            return None;
        }
        self.claimed = true;
        Some(reward)
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed
    }
}

/// Common contract of the ordered mini-games.
pub trait Challenge {
    fn status(&self) -> GameStatus;

    /// The reward this game pays when won.
    fn reward(&self) -> Reward;

    fn latch(&mut self) -> &mut RewardLatch;

    /// `Some` exactly once, after the game is won.
    fn take_reward(&mut self) -> Option<Reward> {
        if self.status() != GameStatus::Won {
            return None;
        }
        let reward = self.reward();
        self.latch().claim(reward)
    }
}

/// The fixed reward of an ordered challenge, by id.
pub fn reward_for(challenge: &str) -> Option<Reward> {
    [
        memory::REWARD,
        tile_merge::REWARD,
        bomb_maze::REWARD,
        rhythm::REWARD,
        riddle::REWARD,
        vault::REWARD,
    ]
    .into_iter()
    .find(|r| r.challenge == challenge)
}

pub type GameRng = Pcg64;

pub fn seeded_rng(seed: u64) -> GameRng {
    Pcg64::seed_from_u64(seed)
}

pub fn entropy_rng() -> GameRng {
    Pcg64::from_entropy()
}
