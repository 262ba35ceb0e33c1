//! Persistence round-trip for the session.
//!
//! Two keys, both read once at session start:
//!
//! - `game-state`: the JSON `GameState` record
//! - `timer-value`: remaining seconds as a decimal string
//!
//! A missing or unparsable value falls back to defaults and is logged,
//! never surfaced to the player. Duplicate or unknown challenge ids in a
//! loaded record are dropped.

use super::KvStore;
use crate::error::Result;
use crate::progress::{Dirty, EngineRules, GameState, ProgressionEngine};

pub const GAME_STATE_KEY: &str = "game-state";
pub const TIMER_VALUE_KEY: &str = "timer-value";

/// Whatever could be recovered from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub state: Option<GameState>,
    pub time_left: Option<u64>,
}

impl Snapshot {
    /// Read both keys.
    ///
    /// # Errors
    /// Only store access failures are returned; bad values become `None`.
    pub fn load(store: &impl KvStore) -> Result<Self> {
        let state = store
            .get(GAME_STATE_KEY)?
            .and_then(|raw| match serde_json::from_str::<GameState>(&raw) {
                Ok(mut state) => {
                    if state.sanitize() {
                        tracing::warn!(
                            completed = ?state.completed_challenges,
                            "dropped duplicate or unknown challenges from game state"
                        );
                    }
                    Some(state)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "discarding unreadable game state");
                    None
                }
            });

        let time_left = store
            .get(TIMER_VALUE_KEY)?
            .and_then(|raw| match parse_timer_value(&raw) {
                Some(secs) => Some(secs),
                None => {
                    tracing::warn!(value = %raw, "discarding unreadable timer value");
                    None
                }
            });

        Ok(Self { state, time_left })
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.time_left.is_none()
    }

    /// Build the engine, filling gaps from the rules' defaults.
    pub fn into_engine(self, rules: EngineRules) -> ProgressionEngine {
        if self.is_empty() {
            return ProgressionEngine::new(rules);
        }
        let time_left = self.time_left.unwrap_or(rules.session_secs);
        let state = self
            .state
            .unwrap_or_else(|| GameState::new(rules.player_name.clone()));
        ProgressionEngine::restore(rules, state, time_left)
    }

    /// Explicit save step: write whatever the engine marked dirty.
    ///
    /// # Errors
    /// Returns an error if serialization or a store write fails. The
    /// dirty flags are consumed either way.
    pub fn persist(store: &impl KvStore, engine: &mut ProgressionEngine) -> Result<Dirty> {
        let dirty = engine.take_dirty();
        if dirty.cleared {
            Self::clear(store)?;
        }
        if dirty.state {
            let json = serde_json::to_string(engine.state())?;
            store.set(GAME_STATE_KEY, &json)?;
        }
        if dirty.timer {
            store.set(TIMER_VALUE_KEY, &engine.time_left().to_string())?;
        }
        Ok(dirty)
    }

    /// Remove both keys.
    ///
    /// # Errors
    /// Returns an error if a store delete fails.
    pub fn clear(store: &impl KvStore) -> Result<()> {
        store.remove(GAME_STATE_KEY)?;
        store.remove(TIMER_VALUE_KEY)?;
        Ok(())
    }
}

/// Decimal seconds. Negative values clamp to zero.
fn parse_timer_value(raw: &str) -> Option<u64> {
    let value: i64 = raw.trim().parse().ok()?;
    Some(value.max(0) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::Phase;
    use crate::storage::MemoryStore;

    #[test]
    fn empty_store_yields_fresh_engine() {
        let store = MemoryStore::new();
        let snapshot = Snapshot::load(&store).unwrap();
        assert!(snapshot.is_empty());
        let engine = snapshot.into_engine(EngineRules::default());
        assert_eq!(engine.time_left(), 900);
        assert_eq!(engine.phase(), Phase::Running);
    }

    #[test]
    fn corrupted_values_fall_back_to_defaults() {
        let store = MemoryStore::new();
        store.set(GAME_STATE_KEY, "{not json").unwrap();
        store.set(TIMER_VALUE_KEY, "soon").unwrap();
        let snapshot = Snapshot::load(&store).unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn foreign_shape_is_discarded() {
        let store = MemoryStore::new();
        store.set(GAME_STATE_KEY, r#"{"completedChallenges": 42}"#).unwrap();
        assert!(Snapshot::load(&store).unwrap().state.is_none());
    }

    #[test]
    fn inflated_record_is_cleaned_and_still_ticks() {
        let store = MemoryStore::new();
        store
            .set(
                GAME_STATE_KEY,
                r#"{"completedChallenges":["memory","memory","memory","memory","memory","memory"]}"#,
            )
            .unwrap();
        let mut engine = Snapshot::load(&store)
            .unwrap()
            .into_engine(EngineRules::default());
        assert_eq!(engine.progress().completed, 1);
        assert!(engine.is_ticking());
        assert!(engine.tick().is_some());
        assert_eq!(engine.time_left(), 899);
    }

    #[test]
    fn recorded_loss_survives_a_later_bonus() {
        let store = MemoryStore::new();
        let mut engine = ProgressionEngine::new(EngineRules {
            session_secs: 1,
            ..EngineRules::default()
        });
        engine.tick();
        engine.add_time_bonus(30);
        Snapshot::persist(&store, &mut engine).unwrap();

        let restored = Snapshot::load(&store)
            .unwrap()
            .into_engine(EngineRules::default());
        assert_eq!(restored.phase(), Phase::Lost);
        assert_eq!(restored.time_left(), 30);
    }

    #[test]
    fn timer_value_parsing() {
        assert_eq!(parse_timer_value("120"), Some(120));
        assert_eq!(parse_timer_value(" 7\n"), Some(7));
        assert_eq!(parse_timer_value("-3"), Some(0));
        assert_eq!(parse_timer_value("1.5"), None);
        assert_eq!(parse_timer_value(""), None);
    }

    #[test]
    fn persist_writes_only_dirty_keys() {
        let store = MemoryStore::new();
        let mut engine = ProgressionEngine::default();

        engine.tick();
        let dirty = Snapshot::persist(&store, &mut engine).unwrap();
        assert!(dirty.timer && !dirty.state);
        assert_eq!(store.get(TIMER_VALUE_KEY).unwrap().as_deref(), Some("899"));
        assert!(store.get(GAME_STATE_KEY).unwrap().is_none());

        let dirty = Snapshot::persist(&store, &mut engine).unwrap();
        assert!(!dirty.any());
    }

    #[test]
    fn roundtrip_restores_progress_and_time() {
        let store = MemoryStore::new();
        let mut engine = ProgressionEngine::default();
        engine.complete_challenge("memory", "7", 1);
        engine.tick();
        Snapshot::persist(&store, &mut engine).unwrap();

        let restored = Snapshot::load(&store)
            .unwrap()
            .into_engine(EngineRules::default());
        assert_eq!(restored.state(), engine.state());
        assert_eq!(restored.time_left(), 899);
    }

    #[test]
    fn reset_clears_both_keys() {
        let store = MemoryStore::new();
        let mut engine = ProgressionEngine::default();
        engine.complete_challenge("memory", "7", 1);
        engine.tick();
        Snapshot::persist(&store, &mut engine).unwrap();
        assert_eq!(store.len(), 2);

        engine.reset_game();
        Snapshot::persist(&store, &mut engine).unwrap();
        assert!(store.is_empty());
    }
}
