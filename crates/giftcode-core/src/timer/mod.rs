mod countdown;
mod ticker;

pub use countdown::{format_clock, Countdown, DEFAULT_SESSION_SECS};
pub use ticker::Ticker;
