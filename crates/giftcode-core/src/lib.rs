//! # Giftcode Core Library
//!
//! Core logic for a timed chain of mini-game challenges. Each won
//! challenge contributes one digit of a five digit code; entering the
//! code in the final vault before the countdown runs out wins the
//! session.
//!
//! ## Architecture
//!
//! - **Progression**: a single owned engine tracks completed challenges,
//!   collected digits and the session countdown, and derives the phase
//! - **Timer**: second-resolution countdown plus a tokio ticker that
//!   guarantees one live tick task
//! - **Storage**: key-value persistence (SQLite or in-memory) and TOML
//!   configuration
//! - **Games**: rules for each mini-game, reporting rewards through the
//!   [`Challenge`] trait
//! - **Navigation**: lock guard and one-shot terminal redirects
//!
//! ## Key Components
//!
//! - [`ProgressionEngine`]: progression state machine
//! - [`Session`]: engine bound to a store and config
//! - [`Database`]: persisted session snapshot
//! - [`Config`]: application configuration management

pub mod error;
pub mod events;
pub mod games;
pub mod navigation;
pub mod progress;
pub mod session;
pub mod status;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::Event;
pub use games::{Challenge, GameStatus, Reward};
pub use navigation::{Router, Screen};
pub use progress::{EngineRules, GameState, Phase, Progress, ProgressionEngine};
pub use session::Session;
pub use status::{Outcome, PlayerStatus};
pub use storage::{Config, Database, KvStore, MemoryStore, Snapshot};
pub use timer::{Countdown, Ticker};
