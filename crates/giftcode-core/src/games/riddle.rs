//! Riddle chamber: solve enough of the nine riddles, in any order.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{Challenge, GameStatus, Reward, RewardLatch};
use crate::progress::challenge::RIDDLE;

pub const DEFAULT_RIDDLES_NEEDED: usize = 7;

pub const REWARD: Reward = Reward {
    challenge: RIDDLE,
    digit: "1",
    position: 5,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Riddle {
    pub id: u32,
    pub question: &'static str,
    pub hint: &'static str,
    pub answer: &'static str,
    pub category: &'static str,
    pub difficulty: Difficulty,
}

pub const RIDDLES: [Riddle; 9] = [
    Riddle {
        id: 1,
        question: "I am invisible, yet everywhere. Without me you cannot breathe. What am I?",
        hint: "You breathe me in and out every day.",
        answer: "air",
        category: "Nature",
        difficulty: Difficulty::Easy,
    },
    Riddle {
        id: 2,
        question: "I have cities but no houses, mountains but no trees, water but no fish. What am I?",
        hint: "You find me in every car and on many walls.",
        answer: "map",
        category: "Objects",
        difficulty: Difficulty::Medium,
    },
    Riddle {
        id: 3,
        question: "What gets wetter the more it dries?",
        hint: "You use it after a shower.",
        answer: "towel",
        category: "Everyday",
        difficulty: Difficulty::Medium,
    },
    Riddle {
        id: 4,
        question: "The more you take from me, the bigger I get. What am I?",
        hint: "You dig me.",
        answer: "hole",
        category: "Logic",
        difficulty: Difficulty::Medium,
    },
    Riddle {
        id: 5,
        question: "Dominik's favourite number is the number of letters in his name. Which number is it?",
        hint: "Count the letters: D-O-M-I-N-I-K",
        answer: "7",
        category: "Personal",
        difficulty: Difficulty::Easy,
    },
    Riddle {
        id: 6,
        question: "I am at the end of time and space, in every end and the start of every edge. What am I?",
        hint: "Look at the letters of the words.",
        answer: "e",
        category: "Wordplay",
        difficulty: Difficulty::Hard,
    },
    Riddle {
        id: 7,
        question: "In which year was Dominik born if he turns exactly 30 in 2024?",
        hint: "Count back from 2024.",
        answer: "1994",
        category: "Personal",
        difficulty: Difficulty::Easy,
    },
    Riddle {
        id: 8,
        question: "World of Warcraft: which Alliance capital did Deathwing leave in ruins?",
        hint: "The heart of the human kingdom in the Eastern Kingdoms.",
        answer: "stormwind",
        category: "Gaming",
        difficulty: Difficulty::Medium,
    },
    Riddle {
        id: 9,
        question: "I speak without a mouth and hear without ears. I have no body, but the wind brings me alive. What am I?",
        hint: "You hear me in the mountains and in empty rooms.",
        answer: "echo",
        category: "Nature",
        difficulty: Difficulty::Hard,
    },
];

/// Lowercase, trim, keep only `[a-z0-9]`.
pub fn normalize_answer(answer: &str) -> String {
    answer
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Blank answer, unknown riddle, already solved, or game over.
    Ignored,
    Correct,
    Wrong,
}

#[derive(Debug, Clone)]
pub struct RiddleGame {
    needed: usize,
    solved: BTreeSet<u32>,
    hints_shown: BTreeSet<u32>,
    wrong_answers: u32,
    latch: RewardLatch,
}

impl RiddleGame {
    pub fn new(needed: usize) -> Self {
        Self {
            needed: needed.clamp(1, RIDDLES.len()),
            solved: BTreeSet::new(),
            hints_shown: BTreeSet::new(),
            wrong_answers: 0,
            latch: RewardLatch::default(),
        }
    }

    pub fn riddles(&self) -> &'static [Riddle] {
        &RIDDLES
    }

    pub fn needed(&self) -> usize {
        self.needed
    }

    pub fn solved_count(&self) -> usize {
        self.solved.len()
    }

    pub fn is_solved(&self, id: u32) -> bool {
        self.solved.contains(&id)
    }

    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    pub fn answer(&mut self, id: u32, answer: &str) -> AnswerOutcome {
        if self.status() != GameStatus::Playing || answer.trim().is_empty() || self.is_solved(id) {
            return AnswerOutcome::Ignored;
        }
        let Some(riddle) = RIDDLES.iter().find(|r| r.id == id) else {
            return AnswerOutcome::Ignored;
        };

        if normalize_answer(answer) == normalize_answer(riddle.answer) {
            self.solved.insert(id);
            AnswerOutcome::Correct
        } else {
            self.wrong_answers += 1;
            AnswerOutcome::Wrong
        }
    }

    /// Reveal a riddle's hint.
    pub fn hint(&mut self, id: u32) -> Option<&'static str> {
        let riddle = RIDDLES.iter().find(|r| r.id == id)?;
        self.hints_shown.insert(id);
        Some(riddle.hint)
    }

    pub fn is_hint_shown(&self, id: u32) -> bool {
        self.hints_shown.contains(&id)
    }
}

impl Default for RiddleGame {
    fn default() -> Self {
        Self::new(DEFAULT_RIDDLES_NEEDED)
    }
}

impl Challenge for RiddleGame {
    fn status(&self) -> GameStatus {
        if self.solved.len() >= self.needed {
            GameStatus::Won
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
