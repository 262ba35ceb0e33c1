//! Final vault: enter the five collected digits to open the lock.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Challenge, GameStatus, Reward, RewardLatch};
use crate::error::ValidationError;
use crate::progress::challenge::{CODE_LENGTH, FINAL};

/// Wrong attempts before the hint shows.
pub const HINT_AFTER_ATTEMPTS: u32 = 3;

pub const HINT: &str = "Check the digits you earned in the earlier challenges!";

/// The vault's digit is empty; completing it ends the session.
pub const REWARD: Reward = Reward {
    challenge: FINAL,
    digit: "",
    position: 0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VaultOutcome {
    Opened,
    Wrong { attempts: u32, hint: Option<&'static str> },
    /// Already open; nothing was checked.
    AlreadyOpen,
}

/// Check an entry's shape. A space is a blank slot.
///
/// # Errors
/// `InvalidValue` for more than five slots, `InvalidDigit` for anything
/// but a decimal digit or blank, `IncompleteCode` when a slot is blank.
pub fn validate_entry(entry: &[char]) -> Result<(), ValidationError> {
    if entry.len() > CODE_LENGTH {
        return Err(ValidationError::InvalidValue {
            field: "code".to_string(),
            message: format!("expected {CODE_LENGTH} digits, got {}", entry.len()),
        });
    }
    if let Some(bad) = entry.iter().find(|c| !c.is_ascii_digit() && **c != ' ') {
        return Err(ValidationError::InvalidDigit(*bad));
    }
    let filled = entry.iter().filter(|c| c.is_ascii_digit()).count();
    if filled < CODE_LENGTH {
        return Err(ValidationError::IncompleteCode {
            filled,
            expected: CODE_LENGTH,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct VaultGame {
    attempts: u32,
    opened: bool,
    latch: RewardLatch,
}

impl VaultGame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Try an entry against the collected digits. A position that was
    /// never collected matches nothing.
    ///
    /// # Errors
    /// Malformed entries are rejected without counting an attempt.
    pub fn submit(
        &mut self,
        entry: &[char],
        collected: &BTreeMap<u8, String>,
    ) -> Result<VaultOutcome, ValidationError> {
        if self.opened {
            return Ok(VaultOutcome::AlreadyOpen);
        }
        validate_entry(entry)?;
        self.attempts += 1;

        let matches = entry.iter().enumerate().all(|(i, c)| {
            collected
                .get(&(i as u8 + 1))
                .is_some_and(|d| d.chars().eq(std::iter::once(*c)))
        });

        if matches {
            self.opened = true;
            tracing::info!(attempts = self.attempts, "vault opened");
            return Ok(VaultOutcome::Opened);
        }

        tracing::debug!(attempts = self.attempts, "wrong vault code");
        Ok(VaultOutcome::Wrong {
            attempts: self.attempts,
            hint: (self.attempts >= HINT_AFTER_ATTEMPTS).then_some(HINT),
        })
    }
}

impl Challenge for VaultGame {
    fn status(&self) -> GameStatus {
        if self.opened {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn collected(digits: &str) -> BTreeMap<u8, String> {
        digits
            .chars()
            .enumerate()
            .filter(|(_, c)| *c != '?')
            .map(|(i, c)| (i as u8 + 1, c.to_string()))
            .collect()
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn incomplete_entry_is_not_an_attempt() {
        let mut vault = VaultGame::new();
        let err = vault.submit(&chars("73 21"), &collected("73921")).unwrap_err();
        assert_eq!(
            err,
            ValidationError::IncompleteCode {
                filled: 4,
                expected: 5
            }
        );
        assert!(vault.submit(&chars("739"), &collected("73921")).is_err());
        assert_eq!(vault.attempts(), 0);
    }

    #[test]
    fn letters_and_overlong_entries_are_rejected() {
        assert_eq!(
            validate_entry(&chars("7392a")),
            Err(ValidationError::InvalidDigit('a'))
        );
        assert!(matches!(
            validate_entry(&chars("739211")),
            Err(ValidationError::InvalidValue { .. })
        ));
    }

    #[test]
    fn correct_code_opens() {
        let mut vault = VaultGame::new();
        assert_eq!(
            vault.submit(&chars("73921"), &collected("73921")),
            Ok(VaultOutcome::Opened)
        );
        assert_eq!(vault.take_reward(), Some(REWARD));
        assert_eq!(
            vault.submit(&chars("00000"), &collected("73921")),
            Ok(VaultOutcome::AlreadyOpen)
        );
    }

    #[test]
    fn missing_digit_never_matches() {
        let mut vault = VaultGame::new();
        let outcome = vault.submit(&chars("73921"), &collected("739?1")).unwrap();
        assert!(matches!(outcome, VaultOutcome::Wrong { attempts: 1, .. }));
        assert!(!vault.is_open());
    }

    #[test]
    fn hint_appears_on_third_wrong_attempt() {
        let mut vault = VaultGame::new();
        let code = collected("73921");
        for expected in 1..=2 {
            assert_eq!(
                vault.submit(&chars("11111"), &code),
                Ok(VaultOutcome::Wrong {
                    attempts: expected,
                    hint: None
                })
            );
        }
        assert_eq!(
            vault.submit(&chars("11111"), &code),
            Ok(VaultOutcome::Wrong {
                attempts: 3,
                hint: Some(HINT)
            })
        );
    }
}
