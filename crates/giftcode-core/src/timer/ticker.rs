//! Single owned periodic timer.
//!
//! At most one tick task is alive per `Ticker`. Arming always aborts the
//! previous task first, and dropping the ticker aborts the current one,
//! so a view that re-arms on every state change never ends up with two
//! countdowns decrementing the same session.
//!
//! Must be armed from inside a tokio runtime.

use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

#[derive(Debug, Default)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Start calling `on_tick` every `period`, first call one period from now.
    ///
    /// The task ends on its own once `on_tick` returns `ControlFlow::Break`.
    pub fn arm<F>(&mut self, period: Duration, mut on_tick: F)
    where
        F: FnMut() -> ControlFlow<()> + Send + 'static,
    {
        self.disarm();
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if on_tick().is_break() {
                    break;
                }
            }
        });
        tracing::debug!(?period, "ticker armed");
        self.handle = Some(handle);
    }

    /// Abort the running task, if any. Returns true if one was aborted.
    pub fn disarm(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                if was_running {
                    tracing::debug!("ticker disarmed");
                }
                was_running
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait until the current task stops by itself or is aborted.
    pub async fn finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Cancellation is the only error a plain loop task can report.
            let _ = handle.await;
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
