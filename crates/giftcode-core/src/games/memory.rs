//! Memory match: six ingredient pairs, twelve face-down cards.
//!
//! Two cards are turned per move. A pair stays face up; a mismatch stays
//! visible until the view calls `settle()` (the browser build waited one
//! second). The game has its own countdown which starts on the first
//! flip.

use rand::seq::SliceRandom;
use serde::Serialize;

use super::{Challenge, GameRng, GameStatus, Reward, RewardLatch};
use crate::progress::challenge::MEMORY;

pub const INGREDIENTS: [&str; 6] = [
    "Healing Herb",
    "Magic Mushroom",
    "Crystal",
    "Elixir",
    "Potion",
    "Crystal Ball",
];

pub const REWARD: Reward = Reward {
    challenge: MEMORY,
    digit: "7",
    position: 1,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: usize,
    pub ingredient: &'static str,
    pub face_up: bool,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipOutcome {
    /// Card unknown, already visible, or two cards are pending.
    Ignored,
    /// First card of a move.
    Revealed,
    Matched,
    /// Both cards stay visible until `settle()`.
    Mismatched,
}

#[derive(Debug, Clone)]
pub struct MemoryGame {
    cards: Vec<Card>,
    pending: Vec<usize>,
    matched_pairs: usize,
    moves: u32,
    time_left: u64,
    started: bool,
    latch: RewardLatch,
}

impl MemoryGame {
    pub fn new(rng: &mut GameRng, time_limit_secs: u64) -> Self {
        let mut ingredients: Vec<&'static str> =
            INGREDIENTS.iter().chain(INGREDIENTS.iter()).copied().collect();
        ingredients.shuffle(rng);
        let cards = ingredients
            .into_iter()
            .enumerate()
            .map(|(id, ingredient)| Card {
                id,
                ingredient,
                face_up: false,
                matched: false,
            })
            .collect();
        Self {
            cards,
            pending: Vec::with_capacity(2),
            matched_pairs: 0,
            moves: 0,
            time_left: time_limit_secs,
            started: false,
            latch: RewardLatch::default(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn time_left(&self) -> u64 {
        self.time_left
    }

    pub fn flip(&mut self, card_id: usize) -> FlipOutcome {
        if self.status() != GameStatus::Playing || self.pending.len() >= 2 {
            return FlipOutcome::Ignored;
        }
        match self.cards.get(card_id) {
            Some(card) if !card.face_up && !card.matched => {}
            _ => return FlipOutcome::Ignored,
        }
        self.started = true;
        self.cards[card_id].face_up = true;
        self.pending.push(card_id);

        if self.pending.len() < 2 {
            return FlipOutcome::Revealed;
        }

        self.moves += 1;
        let (first, second) = (self.pending[0], self.pending[1]);
        if self.cards[first].ingredient == self.cards[second].ingredient {
            self.cards[first].matched = true;
            self.cards[second].matched = true;
            self.matched_pairs += 1;
            self.pending.clear();
            FlipOutcome::Matched
        } else {
            FlipOutcome::Mismatched
        }
    }

    /// Turn a mismatched pair back face down.
    pub fn settle(&mut self) {
        if self.pending.len() == 2 {
            for id in self.pending.drain(..) {
                self.cards[id].face_up = false;
            }
        }
    }

    /// One second of the game's own countdown. Runs only after the first flip.
    pub fn tick(&mut self) {
        if self.started && self.status() == GameStatus::Playing {
            self.time_left = self.time_left.saturating_sub(1);
        }
    }
}

impl Challenge for MemoryGame {
    fn status(&self) -> GameStatus {
        if self.matched_pairs == INGREDIENTS.len() {
            GameStatus::Won
        } else if self.time_left == 0 {
            GameStatus::Lost
        } else {
            GameStatus::Playing
        }
    }

    fn reward(&self) -> Reward {
        REWARD
    }

    fn latch(&mut self) -> &mut RewardLatch {
        &mut self.latch
    }
}
