//! TOML-based game configuration.
//!
//! Stores session and rule settings including:
//! - Session length and player name
//! - Gating and digit overwrite rules
//! - Per-mini-game limits and targets
//! - Navigation base path
//!
//! Configuration is stored at `~/.config/giftcode/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, CoreError, Result};
use crate::games::tile_merge::WinCondition;
use crate::progress::{DigitPolicy, EngineRules, GatingMode, DEFAULT_PLAYER_NAME};
use crate::timer::DEFAULT_SESSION_SECS;

/// Session-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    #[serde(default = "default_player_name")]
    pub player_name: String,
}

/// Progression rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub gating: GatingMode,
    #[serde(default)]
    pub digit_policy: DigitPolicy,
}

/// How the tile-merge puzzle is won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PuzzleWin {
    /// Reach `puzzle_win_tile`.
    #[default]
    Tile,
    /// Reach `puzzle_score_target` points instead.
    ScoreTarget,
}

/// Mini-game tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GamesConfig {
    #[serde(default = "default_riddles_needed")]
    pub riddles_needed: usize,
    #[serde(default)]
    pub puzzle_win: PuzzleWin,
    #[serde(default = "default_puzzle_score_target")]
    pub puzzle_score_target: u32,
    #[serde(default = "default_puzzle_win_tile")]
    pub puzzle_win_tile: u32,
    #[serde(default = "default_memory_time_limit")]
    pub memory_time_limit_secs: u64,
    #[serde(default = "default_maze_time_limit")]
    pub maze_time_limit_secs: u64,
    #[serde(default = "default_rhythm_duration")]
    pub rhythm_duration_secs: u64,
    #[serde(default = "default_ambulance_time_bonus")]
    pub ambulance_time_bonus_secs: u64,
}

/// Navigation settings for views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Prefix for every route, e.g. `/jga-minigames`.
    #[serde(default)]
    pub base_path: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/giftcode/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub games: GamesConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
}

// Default functions
fn default_duration_secs() -> u64 {
    DEFAULT_SESSION_SECS
}
fn default_player_name() -> String {
    DEFAULT_PLAYER_NAME.to_string()
}
fn default_riddles_needed() -> usize {
    7
}
/// Alternative goal, only read with `puzzle_win = "score_target"`.
fn default_puzzle_score_target() -> u32 {
    1000
}
fn default_puzzle_win_tile() -> u32 {
    2048
}
fn default_memory_time_limit() -> u64 {
    60
}
fn default_maze_time_limit() -> u64 {
    120
}
fn default_rhythm_duration() -> u64 {
    90
}
fn default_ambulance_time_bonus() -> u64 {
    15
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            player_name: default_player_name(),
        }
    }
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            riddles_needed: default_riddles_needed(),
            puzzle_win: PuzzleWin::default(),
            puzzle_score_target: default_puzzle_score_target(),
            puzzle_win_tile: default_puzzle_win_tile(),
            memory_time_limit_secs: default_memory_time_limit(),
            maze_time_limit_secs: default_maze_time_limit(),
            rhythm_duration_secs: default_rhythm_duration(),
            ambulance_time_bonus_secs: default_ambulance_time_bonus(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> std::result::Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("not a leaf value".to_string()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Same as `load`, for an explicit file.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Same as `save`, for an explicit file.
    ///
    /// # Errors
    ///
    /// See [`Config::save`].
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| -> CoreError {
            ConfigError::SaveFailed {
                path: path.to_path_buf(),
                message,
            }
            .into()
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit
    /// the field.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    pub fn engine_rules(&self) -> EngineRules {
        EngineRules {
            session_secs: self.session.duration_secs,
            player_name: self.session.player_name.clone(),
            gating: self.rules.gating,
            digit_policy: self.rules.digit_policy,
        }
    }

    pub fn puzzle_win_condition(&self) -> WinCondition {
        match self.games.puzzle_win {
            PuzzleWin::ScoreTarget => WinCondition::ScoreTarget(self.games.puzzle_score_target),
            PuzzleWin::Tile => WinCondition::Tile(self.games.puzzle_win_tile),
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.session.duration_secs, 900);
        assert_eq!(parsed.games.riddles_needed, 7);
        assert_eq!(parsed.rules.gating, GatingMode::Predecessor);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[session]\nduration_secs = 60\n").unwrap();
        assert_eq!(parsed.session.duration_secs, 60);
        assert_eq!(parsed.session.player_name, "Dominik");
        assert_eq!(parsed.games.maze_time_limit_secs, 120);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.duration_secs").as_deref(), Some("900"));
        assert_eq!(cfg.get("rules.digit_policy").as_deref(), Some("last_write"));
        assert!(cfg.get("session.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_number_and_enum() {
        let mut cfg = Config::default();
        cfg.apply("session.duration_secs", "60").unwrap();
        cfg.apply("rules.gating", "prefix").unwrap();
        assert_eq!(cfg.session.duration_secs, 60);
        assert_eq!(cfg.rules.gating, GatingMode::Prefix);
        assert_eq!(cfg.engine_rules().session_secs, 60);
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.nonexistent", "1").is_err());
        assert!(cfg.apply("session", "1").is_err());
    }

    #[test]
    fn apply_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.apply("session.duration_secs", "soon").is_err());
        assert!(cfg.apply("rules.gating", "sideways").is_err());
        assert_eq!(cfg.rules.gating, GatingMode::Predecessor);
    }

    #[test]
    fn puzzle_win_condition_follows_mode() {
        let mut cfg = Config::default();
        assert_eq!(cfg.puzzle_win_condition(), WinCondition::Tile(2048));
        cfg.apply("games.puzzle_win", "score_target").unwrap();
        assert_eq!(cfg.puzzle_win_condition(), WinCondition::ScoreTarget(1000));
    }

    #[test]
    fn load_from_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.session.duration_secs, 900);
        assert!(path.exists());
    }

    #[test]
    fn load_from_broken_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "session = [").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
