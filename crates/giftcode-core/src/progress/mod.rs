pub mod challenge;
mod engine;
mod state;

pub use challenge::GatingMode;
pub use engine::{Dirty, EngineRules, Phase, Progress, ProgressionEngine};
pub use state::{DigitPolicy, GameState, DEFAULT_PLAYER_NAME};
