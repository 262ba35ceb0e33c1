//! Navigation guard.
//!
//! The engine never navigates. The router turns lock queries into
//! screens and phase changes into redirects, at most one per terminal
//! phase.

use serde::Serialize;

use crate::progress::{Phase, ProgressionEngine};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "challenge", rename_all = "snake_case")]
pub enum Screen {
    Home,
    Challenge(String),
    /// Placeholder shown on a gated challenge's route.
    Locked(String),
    GameOver,
    Victory,
}

#[derive(Debug, Clone)]
pub struct Router {
    base_path: String,
    current: Screen,
    redirected_lost: bool,
    redirected_won: bool,
}

impl Router {
    /// `base_path` is a URL prefix such as `/jga-minigames`; empty for none.
    pub fn new(base_path: &str) -> Self {
        let trimmed = base_path.trim().trim_end_matches('/');
        let base_path = if trimmed.is_empty() || trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };
        Self {
            base_path,
            current: Screen::Home,
            redirected_lost: false,
            redirected_won: false,
        }
    }

    pub fn current(&self) -> &Screen {
        &self.current
    }

    pub fn go_home(&mut self) -> &Screen {
        self.current = Screen::Home;
        &self.current
    }

    /// Open a challenge route: the game itself, or the locked placeholder.
    pub fn enter(&mut self, challenge: &str, engine: &ProgressionEngine) -> &Screen {
        self.current = if engine.is_challenge_locked(challenge) {
            Screen::Locked(challenge.to_string())
        } else {
            Screen::Challenge(challenge.to_string())
        };
        &self.current
    }

    /// React to the session phase. Returns the redirect target, if any.
    ///
    /// Each terminal phase redirects once; a later `Running` (after a
    /// reset) re-arms both.
    pub fn on_phase(&mut self, phase: Phase) -> Option<Screen> {
        let (target, done) = match phase {
            Phase::Running => {
                self.redirected_lost = false;
                self.redirected_won = false;
                return None;
            }
            Phase::Lost => (Screen::GameOver, &mut self.redirected_lost),
            Phase::Won => (Screen::Victory, &mut self.redirected_won),
        };
        if *done || self.current == target {
            *done = true;
            return None;
        }
        *done = true;
        tracing::debug!(?target, "redirect");
        self.current = target.clone();
        Some(target)
    }

    /// URL path for a screen, with the base path prefix and a trailing
    /// slash.
    pub fn path(&self, screen: &Screen) -> String {
        let route = match screen {
            Screen::Home => String::from("/"),
            Screen::Challenge(id) | Screen::Locked(id) => format!("/game/{id}/"),
            Screen::GameOver => String::from("/gameover/"),
            Screen::Victory => String::from("/game/final/"),
        };
        format!("{}{route}", self.base_path)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new("")
    }
}
