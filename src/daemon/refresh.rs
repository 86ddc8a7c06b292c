use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    store::prefs_store::PrefsStore,
    tracker::{StepSummary, StepTracker},
    utils::clock::Clock,
};

/// Amount of refresh ticks between two history snapshots.
pub const DEFAULT_SAVE_EVERY: u32 = 10;

/// Periodically re-reads the counter. This is what resets the day at midnight when the sensor is
/// quiet, and what keeps today's history entry fresh.
pub struct RefreshModule<S> {
    tracker: Arc<StepTracker<S>>,
    shutdown: CancellationToken,
    refresh_frequency: Duration,
    save_every: u32,
    time_provider: Box<dyn Clock>,
}

impl<S: PrefsStore> RefreshModule<S> {
    pub fn new(
        tracker: Arc<StepTracker<S>>,
        shutdown: CancellationToken,
        refresh_frequency: Duration,
        save_every: u32,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            tracker,
            shutdown,
            refresh_frequency,
            save_every: save_every.max(1),
            time_provider,
        }
    }

    pub async fn run(self) -> Result<()> {
        let mut refresh_point = self.time_provider.instant();
        let mut last_summary: Option<StepSummary> = None;
        let mut ticks = 0u32;
        loop {
            refresh_point += self.refresh_frequency;

            match self.tracker.summary().await {
                Ok(summary) => {
                    if last_summary.is_some_and(|v| v.date != summary.date) {
                        info!("Day changed to {}", summary.date);
                    }
                    if last_summary != Some(summary) {
                        debug!(
                            "{} of {} steps, {} left",
                            summary.current_steps, summary.daily_goal, summary.remaining_steps
                        );
                    }
                    last_summary = Some(summary);
                }
                Err(e) => warn!("Failed to refresh the counter {e:?}"),
            }

            ticks += 1;
            if ticks >= self.save_every {
                ticks = 0;
                if let Err(e) = self.tracker.save_today().await {
                    warn!("Failed to save today's history {e:?}");
                }
            }

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(refresh_point) => ()
            }
        }
    }
}
