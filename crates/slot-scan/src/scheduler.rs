use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::dispatch::NotificationDispatcher;
use crate::scan_types::{ScanError, SlotFound};
use crate::scanner::SlotScanner;
use crate::session_manager::SessionManager;

/// Outcome of a single scheduler tick.
#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing found; keep polling.
    Idle,
    /// A slot was found and the alert dispatched; the process should stop.
    Notified(SlotFound),
}

/// Drives the session/scan/notify sequence at a fixed wall-clock interval.
///
/// Single-threaded and cooperative: one tick runs to completion before the
/// next is considered, and all tick-level errors are contained here. The
/// scheduler, not the dispatcher, decides when the process stops.
pub struct Scheduler {
    interval: Duration,
    session: SessionManager,
    scanner: SlotScanner,
    dispatcher: NotificationDispatcher,
}

impl Scheduler {
    /// Creates a scheduler ticking at the given interval.
    pub fn new(
        interval: Duration,
        session: SessionManager,
        scanner: SlotScanner,
        dispatcher: NotificationDispatcher,
    ) -> Self {
        Self {
            interval,
            session,
            scanner,
            dispatcher,
        }
    }

    /// Runs ticks until the first dispatched notification (returns the
    /// event) or an interrupt signal (returns `None`). The first tick fires
    /// immediately. A failed tick is logged and the loop keeps running.
    pub async fn run(&mut self) -> Option<SlotFound> {
        let mut ticks = interval(self.interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    match self.tick().await {
                        Ok(TickOutcome::Notified(event)) => return Some(event),
                        Ok(TickOutcome::Idle) => {}
                        Err(err) => error!("tick failed: {err}"),
                    }
                }
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping");
                    return None;
                }
            }
        }
    }

    /// One tick: ensure the session is authenticated, run one scan pass,
    /// dispatch on the first hit.
    ///
    /// A session that dies mid-scan is rebuilt and logged in again within
    /// the same tick; the rescan itself waits for the next tick.
    pub async fn tick(&mut self) -> Result<TickOutcome, ScanError> {
        info!("starting scan tick");
        self.session.ensure_logged_in().await?;

        let scan = self.scanner.scan(self.session.browser()).await;
        match scan {
            Ok(Some(event)) => {
                self.dispatcher.notify(&event).await;
                Ok(TickOutcome::Notified(event))
            }
            Ok(None) => Ok(TickOutcome::Idle),
            Err(ScanError::SessionDead) => {
                self.session.recover().await?;
                Ok(TickOutcome::Idle)
            }
            Err(err) => Err(err),
        }
    }
}
