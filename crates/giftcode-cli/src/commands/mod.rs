pub mod config;
pub mod game;
pub mod play;

use giftcode_core::{Config, Database, Session};

/// Session over the on-disk database and config.
pub fn open_session() -> Result<Session<Database>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(Session::open(db, Config::load_or_default())?)
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
