//! The fixed challenge ordering and the gating modes over it.

use serde::{Deserialize, Serialize};

pub const MEMORY: &str = "memory";
pub const PUZZLE: &str = "puzzle";
pub const MAZE: &str = "maze";
pub const RHYTHM: &str = "rhythm";
pub const RIDDLE: &str = "riddle";
pub const FINAL: &str = "final";

/// Side game outside the ordered progression. Pays time, never a digit.
pub const AMBULANCE: &str = "ambulance";

/// Ordered progression. The last entry is the terminal challenge.
pub const CHALLENGE_ORDER: [&str; 6] = [MEMORY, PUZZLE, MAZE, RHYTHM, RIDDLE, FINAL];

/// Number of code digits handed out before the final stage.
pub const CODE_LENGTH: usize = 5;

/// How a challenge's lock state is derived from the completed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingMode {
    /// Unlocked once the immediately preceding challenge is completed.
    ///
    /// Not transitive: a snapshot edited out of band can unlock a
    /// challenge whose earlier predecessors are still open.
    #[default]
    Predecessor,
    /// Unlocked only once every earlier challenge is completed.
    Prefix,
}

/// Position of `challenge` in the ordered list.
pub fn index_of(challenge: &str) -> Option<usize> {
    CHALLENGE_ORDER.iter().position(|c| *c == challenge)
}

/// Challenge that must be completed before `challenge` opens.
pub fn predecessor(challenge: &str) -> Option<&'static str> {
    match index_of(challenge)? {
        0 => None,
        i => Some(CHALLENGE_ORDER[i - 1]),
    }
}

pub fn is_terminal(challenge: &str) -> bool {
    challenge == FINAL
}

pub fn total() -> usize {
    CHALLENGE_ORDER.len()
}
