//! Session wrapper: engine + store + config.
//!
//! The explicitly owned replacement for a process-wide game context.
//! Every mutation goes through here and is followed by the save step,
//! which writes only the keys the engine marked dirty.

use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::games::ambulance::{AmbulanceGame, DriveEvent};
use crate::games::bomb_maze::BombMazeGame;
use crate::games::memory::MemoryGame;
use crate::games::rhythm::RhythmGame;
use crate::games::riddle::RiddleGame;
use crate::games::tile_merge::TileMergeGame;
use crate::games::vault::{VaultGame, VaultOutcome};
use crate::games::{Challenge, GameRng};
use crate::progress::challenge::{AMBULANCE, FINAL};
use crate::progress::{Dirty, Phase, Progress, ProgressionEngine};
use crate::storage::{Config, KvStore, Snapshot};

pub struct Session<S: KvStore> {
    store: S,
    config: Config,
    engine: ProgressionEngine,
    vault: VaultGame,
}

impl<S: KvStore> Session<S> {
    /// Load the persisted snapshot, or start fresh.
    ///
    /// # Errors
    /// Returns an error only if the store cannot be read.
    pub fn open(store: S, config: Config) -> Result<Self> {
        let snapshot = Snapshot::load(&store)?;
        let engine = snapshot.into_engine(config.engine_rules());
        tracing::debug!(
            phase = ?engine.phase(),
            time_left = engine.time_left(),
            completed = engine.progress().completed,
            "session opened"
        );
        Ok(Self {
            store,
            config,
            engine,
            vault: VaultGame::new(),
        })
    }

    pub fn engine(&self) -> &ProgressionEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn vault(&self) -> &VaultGame {
        &self.vault
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    pub fn time_left(&self) -> u64 {
        self.engine.time_left()
    }

    pub fn progress(&self) -> Progress {
        self.engine.progress()
    }

    pub fn is_challenge_locked(&self, challenge: &str) -> bool {
        self.engine.is_challenge_locked(challenge)
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// # Errors
    /// Returns an error if the save step fails.
    pub fn complete_challenge(
        &mut self,
        challenge: &str,
        digit: &str,
        position: u8,
    ) -> Result<Vec<Event>> {
        let events = self.engine.complete_challenge(challenge, digit, position);
        self.persist()?;
        Ok(events)
    }

    /// Hand a won game's reward to the engine. Does nothing if the game
    /// is not won or its reward was already claimed.
    ///
    /// # Errors
    /// Returns an error if the save step fails.
    pub fn claim(&mut self, game: &mut impl Challenge) -> Result<Vec<Event>> {
        match game.take_reward() {
            Some(reward) => self.complete_challenge(reward.challenge, reward.digit, reward.position),
            None => Ok(Vec::new()),
        }
    }

    /// # Errors
    /// Returns an error if the save step fails.
    pub fn add_time_bonus(&mut self, seconds: u64) -> Result<Event> {
        let event = self.engine.add_time_bonus(seconds);
        self.persist()?;
        Ok(event)
    }

    /// Pay out the time bonuses from one ambulance frame.
    ///
    /// # Errors
    /// Returns an error if the save step fails.
    pub fn apply_drive_events(&mut self, events: &[DriveEvent]) -> Result<Vec<Event>> {
        let mut out = Vec::new();
        for event in events {
            if let DriveEvent::TimeBonus { seconds } = event {
                out.push(self.add_time_bonus(*seconds)?);
            }
        }
        Ok(out)
    }

    /// One second of session time.
    ///
    /// # Errors
    /// Returns an error if the save step fails.
    pub fn tick(&mut self) -> Result<Option<Event>> {
        let event = self.engine.tick();
        if event.is_some() {
            self.persist()?;
        }
        Ok(event)
    }

    /// Back to a fresh session; the persisted snapshot is deleted.
    ///
    /// # Errors
    /// Returns an error if the store delete fails.
    pub fn reset(&mut self) -> Result<Event> {
        let event = self.engine.reset_game();
        self.vault = VaultGame::new();
        self.persist()?;
        Ok(event)
    }

    /// Try the final code. Opening the vault completes the final
    /// challenge, which wins a running session.
    ///
    /// # Errors
    /// `SessionOver` once the session has ended, `ChallengeLocked` while
    /// the final challenge is gated, a validation error for a malformed
    /// entry (no attempt counted), or a save failure.
    pub fn submit_final_code(&mut self, entry: &[char]) -> Result<(VaultOutcome, Vec<Event>)> {
        let phase = self.engine.phase();
        if phase.is_terminal() {
            return Err(ValidationError::SessionOver(phase).into());
        }
        if self.engine.is_challenge_locked(FINAL) {
            return Err(ValidationError::ChallengeLocked(FINAL.to_string()).into());
        }
        let outcome = self.vault.submit(entry, &self.engine.state().code_digits)?;
        let events = match self.vault.take_reward() {
            Some(reward) => self.complete_challenge(reward.challenge, reward.digit, reward.position)?,
            None => Vec::new(),
        };
        Ok((outcome, events))
    }

    fn persist(&mut self) -> Result<Dirty> {
        Snapshot::persist(&self.store, &mut self.engine)
    }

    // ── Game factories ───────────────────────────────────────────────
    //
    // New games configured from the session config. Gating is the
    // caller's check, except for the ambulance side game.

    /// # Errors
    /// `ChallengeLocked` if `challenge` is gated.
    pub fn ensure_unlocked(&self, challenge: &str) -> Result<(), ValidationError> {
        if self.engine.is_challenge_locked(challenge) {
            return Err(ValidationError::ChallengeLocked(challenge.to_string()));
        }
        Ok(())
    }

    pub fn memory_game(&self, rng: &mut GameRng) -> MemoryGame {
        MemoryGame::new(rng, self.config.games.memory_time_limit_secs)
    }

    pub fn tile_merge_game(&self, rng: GameRng) -> TileMergeGame {
        TileMergeGame::new(rng, self.config.puzzle_win_condition())
    }

    pub fn bomb_maze_game(&self, rng: &mut GameRng) -> BombMazeGame {
        BombMazeGame::new(rng, self.config.games.maze_time_limit_secs)
    }

    pub fn rhythm_game(&self, rng: GameRng) -> RhythmGame {
        RhythmGame::new(rng, self.config.games.rhythm_duration_secs)
    }

    pub fn riddle_game(&self) -> RiddleGame {
        RiddleGame::new(self.config.games.riddles_needed)
    }

    /// # Errors
    /// `ChallengeLocked` until any challenge has been completed.
    pub fn ambulance_game(&self, rng: GameRng) -> Result<AmbulanceGame, ValidationError> {
        self.ensure_unlocked(AMBULANCE)?;
        Ok(AmbulanceGame::new(
            rng,
            self.config.games.ambulance_time_bonus_secs,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::games::seeded_rng;
    use crate::games::GameStatus;
    use crate::progress::challenge::{MAZE, MEMORY, PUZZLE, RHYTHM, RIDDLE};
    use crate::storage::{MemoryStore, GAME_STATE_KEY, TIMER_VALUE_KEY};

    fn open(store: &MemoryStore) -> Session<&MemoryStore> {
        Session::open(store, Config::default()).unwrap()
    }

    fn collect_all_digits(session: &mut Session<&MemoryStore>) {
        for (id, digit, pos) in [
            (MEMORY, "7", 1),
            (PUZZLE, "3", 2),
            (MAZE, "9", 3),
            (RHYTHM, "2", 4),
            (RIDDLE, "1", 5),
        ] {
            session.complete_challenge(id, digit, pos).unwrap();
        }
    }

    #[test]
    fn completion_is_saved_immediately() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        session.complete_challenge(MEMORY, "7", 1).unwrap();

        let raw = store.get(GAME_STATE_KEY).unwrap().unwrap();
        assert!(raw.contains("\"completedChallenges\":[\"memory\"]"));
        assert!(raw.contains("\"codeDigits\":{\"1\":\"7\"}"));
    }

    #[test]
    fn reopening_restores_the_session() {
        let store = MemoryStore::new();
        {
            let mut session = open(&store);
            session.complete_challenge(MEMORY, "7", 1).unwrap();
            session.tick().unwrap();
            session.add_time_bonus(15).unwrap();
        }
        let session = open(&store);
        assert_eq!(session.time_left(), 914);
        assert!(!session.is_challenge_locked(PUZZLE));
        assert_eq!(session.engine().code(), "7????");
    }

    #[test]
    fn claim_pays_a_won_game_once() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let mut riddles = session.riddle_game();
        for riddle in riddles.riddles().iter().take(7) {
            riddles.answer(riddle.id, riddle.answer);
        }
        assert_eq!(riddles.status(), GameStatus::Won);
        assert_eq!(session.claim(&mut riddles).unwrap().len(), 1);
        assert!(session.claim(&mut riddles).unwrap().is_empty());
        assert_eq!(session.engine().state().digit(5), Some("1"));
    }

    #[test]
    fn locked_final_rejects_code() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        let err = session.submit_final_code(&['7', '3', '9', '2', '1']).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::ChallengeLocked(_))
        ));
    }

    #[test]
    fn correct_code_wins_and_persists() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        collect_all_digits(&mut session);

        let (outcome, events) = session
            .submit_final_code(&['7', '3', '9', '2', '1'])
            .unwrap();
        assert_eq!(outcome, VaultOutcome::Opened);
        assert!(events.iter().any(|e| matches!(e, Event::SessionWon { .. })));
        assert_eq!(session.phase(), Phase::Won);

        let reopened = open(&store);
        assert_eq!(reopened.phase(), Phase::Won);
    }

    #[test]
    fn ambulance_bonus_reaches_the_countdown() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        assert!(session.ambulance_game(seeded_rng(1)).is_err());

        session.complete_challenge(MEMORY, "7", 1).unwrap();
        let mut drive = session.ambulance_game(seeded_rng(1)).unwrap();
        drive.place_collectible(crate::games::ambulance::CollectibleKind::Clock, 1, 560.0);
        let frame = drive.frame(16.67);
        let events = session.apply_drive_events(&frame).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(session.time_left(), 915);
        assert_eq!(store.get(TIMER_VALUE_KEY).unwrap().as_deref(), Some("915"));
    }

    #[test]
    fn reset_wipes_store_and_vault() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        collect_all_digits(&mut session);
        let _ = session.submit_final_code(&['1', '1', '1', '1', '1']).unwrap();
        assert_eq!(session.vault().attempts(), 1);

        session.reset().unwrap();
        assert!(store.is_empty());
        assert_eq!(session.vault().attempts(), 0);
        assert_eq!(session.progress(), Progress { completed: 0, total: 6 });
    }

    #[test]
    fn bonus_after_loss_stays_lost_across_reopen() {
        let store = MemoryStore::new();
        let mut config = Config::default();
        config.session.duration_secs = 2;
        let mut session = Session::open(&store, config.clone()).unwrap();
        session.tick().unwrap();
        session.tick().unwrap();
        assert_eq!(session.phase(), Phase::Lost);

        session.add_time_bonus(15).unwrap();
        assert_eq!(session.phase(), Phase::Lost);

        let reopened = Session::open(&store, config).unwrap();
        assert_eq!(reopened.phase(), Phase::Lost);
        assert_eq!(reopened.time_left(), 15);
    }

    #[test]
    fn final_code_after_loss_is_rejected() {
        let store = MemoryStore::new();
        let mut config = Config::default();
        config.session.duration_secs = 1;
        let mut session = Session::open(&store, config.clone()).unwrap();
        collect_all_digits(&mut session);
        session.tick().unwrap();
        assert_eq!(session.phase(), Phase::Lost);

        let err = session.submit_final_code(&['7', '3', '9', '2', '1']).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::SessionOver(Phase::Lost))
        ));
        assert_eq!(session.vault().attempts(), 0);

        assert!(session.complete_challenge(FINAL, "", 0).unwrap().is_empty());
        assert!(!session.engine().is_completed(FINAL));

        let reopened = Session::open(&store, config).unwrap();
        assert_eq!(reopened.phase(), Phase::Lost);
        assert!(!reopened.engine().is_completed(FINAL));
    }

    #[test]
    fn idle_tick_writes_nothing() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        collect_all_digits(&mut session);
        session.complete_challenge(FINAL, "", 0).unwrap();
        let before = store.get(TIMER_VALUE_KEY).unwrap();
        assert!(session.tick().unwrap().is_none());
        assert_eq!(store.get(TIMER_VALUE_KEY).unwrap(), before);
    }
}
