use clap::Subcommand;
use giftcode_core::games::reward_for;
use giftcode_core::progress::challenge::{AMBULANCE, CHALLENGE_ORDER};
use giftcode_core::{PlayerStatus, Router};

use super::{open_session, print_json};

#[derive(Subcommand)]
pub enum GameAction {
    /// Print the status panel as JSON
    Status,
    /// Print the raw session snapshot as JSON
    Snapshot,
    /// Print completed/total
    Progress,
    /// Show which challenges are locked
    Locked {
        /// Only this challenge
        challenge: Option<String>,
    },
    /// Resolve the screen and route for a challenge
    Enter {
        challenge: String,
    },
    /// Record a challenge win
    Complete {
        /// Challenge id (memory, puzzle, maze, rhythm, riddle, final)
        challenge: String,
        /// Digit to record; defaults to the challenge's reward
        #[arg(long, requires = "position")]
        digit: Option<String>,
        /// Code position 1-5
        #[arg(long, requires = "digit")]
        position: Option<u8>,
        /// Skip the lock check
        #[arg(long)]
        force: bool,
    },
    /// Add bonus seconds to the countdown
    Bonus {
        seconds: u64,
    },
    /// Advance the countdown
    Tick {
        #[arg(long, default_value = "1")]
        count: u64,
    },
    /// Enter the final code
    Submit {
        /// Five digits, e.g. 73921
        code: String,
    },
    /// Start over with a fresh session
    Reset,
}

pub fn run(action: GameAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session()?;

    match action {
        GameAction::Status => {
            print_json(&PlayerStatus::from_engine(session.engine()))?;
        }
        GameAction::Snapshot => {
            print_json(&session.snapshot())?;
        }
        GameAction::Progress => {
            print_json(&session.progress())?;
        }
        GameAction::Locked { challenge } => {
            let ids: Vec<&str> = match &challenge {
                Some(id) => vec![id.as_str()],
                None => CHALLENGE_ORDER.iter().copied().chain([AMBULANCE]).collect(),
            };
            let locks: Vec<_> = ids
                .into_iter()
                .map(|id| {
                    serde_json::json!({
                        "challenge": id,
                        "locked": session.is_challenge_locked(id),
                    })
                })
                .collect();
            print_json(&locks)?;
        }
        GameAction::Enter { challenge } => {
            let mut router = Router::new(&session.config().navigation.base_path);
            let screen = router.enter(&challenge, session.engine()).clone();
            print_json(&serde_json::json!({
                "screen": screen,
                "path": router.path(&screen),
            }))?;
        }
        GameAction::Complete {
            challenge,
            digit,
            position,
            force,
        } => {
            if !force {
                session.ensure_unlocked(&challenge)?;
            }
            let (digit, position) = match (digit, position) {
                (Some(d), Some(p)) => (d, p),
                _ => {
                    let reward = reward_for(&challenge).ok_or_else(|| {
                        format!("no default reward for '{challenge}', pass --digit and --position")
                    })?;
                    (reward.digit.to_string(), reward.position)
                }
            };
            let events = session.complete_challenge(&challenge, &digit, position)?;
            print_json(&events)?;
        }
        GameAction::Bonus { seconds } => {
            let event = session.add_time_bonus(seconds)?;
            print_json(&event)?;
        }
        GameAction::Tick { count } => {
            let mut events = Vec::new();
            for _ in 0..count {
                match session.tick()? {
                    Some(event) => events.push(event),
                    None => break,
                }
            }
            print_json(&events)?;
        }
        GameAction::Submit { code } => {
            let entry: Vec<char> = code.chars().collect();
            let (outcome, events) = session.submit_final_code(&entry)?;
            print_json(&serde_json::json!({
                "outcome": outcome,
                "events": events,
            }))?;
        }
        GameAction::Reset => {
            let event = session.reset()?;
            print_json(&event)?;
        }
    }
    Ok(())
}
