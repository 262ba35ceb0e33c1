//! Live countdown: one tick per period until the session ends.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Args;
use giftcode_core::timer::format_clock;
use giftcode_core::{Phase, Router, Ticker};

use super::open_session;

#[derive(Args)]
pub struct PlayArgs {
    /// Wall-clock seconds per countdown second
    #[arg(long, default_value = "1.0")]
    seconds_per_tick: f64,
    /// Stop after this many ticks even if the session is still running
    #[arg(long)]
    limit: Option<u64>,
}

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(args.seconds_per_tick.is_finite() && args.seconds_per_tick > 0.0) {
        return Err("--seconds-per-tick must be a positive number".into());
    }
    let period = Duration::from_secs_f64(args.seconds_per_tick);

    let session = open_session()?;
    if session.phase().is_terminal() {
        println!("session already over: {:?}", session.phase());
        return Ok(());
    }
    let mut router = Router::new(&session.config().navigation.base_path);
    let session = Arc::new(Mutex::new(session));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        let mut ticker = Ticker::new();
        let shared = Arc::clone(&session);
        let mut ticks = 0u64;

        ticker.arm(period, move || {
            let Ok(mut session) = shared.lock() else {
                tracing::error!("session lock poisoned");
                return ControlFlow::Break(());
            };
            match session.tick() {
                Ok(Some(event)) => {
                    if let Ok(line) = serde_json::to_string(&event) {
                        println!("{line}");
                    }
                }
                Ok(None) => return ControlFlow::Break(()),
                Err(e) => {
                    tracing::error!(error = %e, "tick failed");
                    return ControlFlow::Break(());
                }
            }

            if let Some(screen) = router.on_phase(session.phase()) {
                println!("-> {}", router.path(&screen));
            }
            ticks += 1;
            let over = session.phase() != Phase::Running;
            if over || args.limit.is_some_and(|limit| ticks >= limit) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        ticker.finished().await;
    });

    let session = session.lock().map_err(|_| "session lock poisoned")?;
    println!(
        "{} left, {}/{} challenges",
        format_clock(session.time_left()),
        session.progress().completed,
        session.progress().total
    );
    Ok(())
}
