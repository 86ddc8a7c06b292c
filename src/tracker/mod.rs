//! Daily step accounting. [StepTracker] is the only owner of the counter state: every operation
//! runs inside one store transaction that first applies the day rollover
//! ([day::roll_over]) and then does its own work, so a reset and a sensor credit never
//! interleave.

pub mod day;
pub mod history;
pub mod reconcile;

use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;
use day::{roll_over, DayState};
use history::{collect, prune, HistoryEntry, HistoryStats, MAX_HISTORY_DAYS};
use reconcile::{reconcile, CounterState, RecordOutcome};
use tracing::{debug, info, warn};

use crate::{
    config::Config,
    sensor::event::SensorEvent,
    store::{
        keys::{
            history_key, BACKGROUND_TRACKING, CURRENT_STEPS, DAILY_GOAL, STEP_COUNTER_BASE,
            UNSET_BASE,
        },
        prefs::Prefs,
        prefs_store::PrefsStore,
    },
    utils::{clock::Clock, percentage::goal_progress},
};

pub const DEFAULT_DAILY_GOAL: u64 = 10_000;
pub const DEFAULT_RETENTION_DAYS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Goal used while the user hasn't configured one.
    pub default_goal: u64,
    /// Archived days older than this are pruned.
    pub history_retention_days: u32,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            default_goal: DEFAULT_DAILY_GOAL,
            history_retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl From<&Config> for TrackerSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_goal: config.default_goal,
            history_retention_days: config.history_retention_days,
        }
    }
}

/// Everything the ui shows on the main screen, read in one go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepSummary {
    pub date: NaiveDate,
    pub current_steps: u64,
    pub daily_goal: u64,
    /// Share of the goal in 0..=1.
    pub progress: f32,
    pub remaining_steps: u64,
    pub background_tracking: bool,
}

pub struct StepTracker<S> {
    store: S,
    clock: Box<dyn Clock>,
    settings: TrackerSettings,
}

impl<S: PrefsStore> StepTracker<S> {
    pub fn new(store: S, clock: Box<dyn Clock>, settings: TrackerSettings) -> Self {
        Self {
            store,
            clock,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Calendar day the tracker currently accounts steps to.
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Starts a new listening session. The next counter reading becomes the base.
    pub async fn begin_session(&self) -> Result<()> {
        let today = self.clock.today();
        self.store
            .update(|prefs| {
                roll_over(prefs, today);
                prefs.put_int(STEP_COUNTER_BASE, UNSET_BASE);
            })
            .await
    }

    /// Applies one sensor event to today's counter.
    pub async fn record(&self, event: SensorEvent) -> Result<RecordOutcome> {
        let today = self.clock.today();
        let default_goal = self.settings.default_goal;
        let outcome = self
            .store
            .update(|prefs| {
                roll_over(prefs, today);
                let state = counter_state(prefs, default_goal);
                let (next, outcome) = reconcile(state, event);
                store_counter_state(prefs, next);
                outcome
            })
            .await?;

        match outcome {
            RecordOutcome::Calibrated { base } => info!("Step counter calibrated at {base}"),
            RecordOutcome::Rebased { base } => {
                info!("Step counter went below its base, rebased at {base}")
            }
            RecordOutcome::Credited { steps } => debug!("Credited {steps} steps from {event}"),
            RecordOutcome::Frozen => debug!("Goal reached, ignoring {event}"),
            RecordOutcome::Ignored => debug!("Nothing to credit for {event}"),
        }
        Ok(outcome)
    }

    /// Explicit day check. Resets the counter when midnight has passed since the last
    /// transaction.
    pub async fn tick(&self) -> Result<DayState> {
        let today = self.clock.today();
        self.store.update(|prefs| roll_over(prefs, today)).await
    }

    pub async fn current_steps(&self) -> Result<u64> {
        let today = self.clock.today();
        self.store
            .update(|prefs| {
                roll_over(prefs, today);
                current_steps(prefs)
            })
            .await
    }

    pub async fn daily_goal(&self) -> Result<u64> {
        let prefs = self.store.read().await?;
        Ok(daily_goal(&prefs, self.settings.default_goal))
    }

    pub async fn progress(&self) -> Result<f32> {
        Ok(self.summary().await?.progress)
    }

    pub async fn remaining_steps(&self) -> Result<u64> {
        Ok(self.summary().await?.remaining_steps)
    }

    pub async fn summary(&self) -> Result<StepSummary> {
        let today = self.clock.today();
        let default_goal = self.settings.default_goal;
        self.store
            .update(|prefs| {
                roll_over(prefs, today);
                let current_steps = current_steps(prefs);
                let daily_goal = daily_goal(prefs, default_goal);
                StepSummary {
                    date: today,
                    current_steps,
                    daily_goal,
                    progress: goal_progress(current_steps, daily_goal),
                    remaining_steps: daily_goal.saturating_sub(current_steps),
                    background_tracking: prefs.get_bool(BACKGROUND_TRACKING, false),
                }
            })
            .await
    }

    pub async fn set_goal(&self, goal: u64) -> Result<()> {
        let stored = i64::try_from(goal).map_err(|_| anyhow!("Goal {goal} is too large"))?;
        if stored <= 0 {
            bail!("Goal has to be a positive number of steps");
        }
        self.store
            .update(|prefs| prefs.put_int(DAILY_GOAL, stored))
            .await?;
        info!("Daily goal set to {goal}");
        Ok(())
    }

    /// Stores the default goal unless the user already picked one. Returns whether anything was
    /// written.
    pub async fn ensure_default_goal(&self) -> Result<bool> {
        let default_goal = to_stored(self.settings.default_goal);
        self.store
            .update(|prefs| {
                if prefs.get_int(DAILY_GOAL, 0) > 0 {
                    return false;
                }
                prefs.put_int(DAILY_GOAL, default_goal);
                true
            })
            .await
    }

    pub async fn background_tracking(&self) -> Result<bool> {
        Ok(self.store.read().await?.get_bool(BACKGROUND_TRACKING, false))
    }

    pub async fn set_background_tracking(&self, enabled: bool) -> Result<()> {
        self.store
            .update(|prefs| prefs.put_bool(BACKGROUND_TRACKING, enabled))
            .await
    }

    /// Copies today's live total into the history, so it survives even if the counter is lost.
    pub async fn save_today(&self) -> Result<()> {
        let today = self.clock.today();
        self.store
            .update(|prefs| {
                roll_over(prefs, today);
                snapshot_today(prefs, today);
            })
            .await
    }

    /// History of the last `days` days, oldest first, today included.
    ///
    /// Today's live total is archived and expired days are pruned on the way. If that write
    /// fails the history is still computed from what's stored.
    pub async fn history(&self, days: u32) -> Result<Vec<HistoryEntry>> {
        let today = self.clock.today();
        let days = days.min(MAX_HISTORY_DAYS);
        let retention_days = self.settings.history_retention_days;
        let written = self
            .store
            .update(|prefs| {
                roll_over(prefs, today);
                snapshot_today(prefs, today);
                prune(prefs, today, retention_days);
                collect(prefs, today, days)
            })
            .await;

        match written {
            Ok(history) => Ok(history),
            Err(e) => {
                warn!("Failed to save history, showing stored data {e:?}");
                let mut prefs = self.store.read().await?;
                roll_over(&mut prefs, today);
                snapshot_today(&mut prefs, today);
                Ok(collect(&prefs, today, days))
            }
        }
    }

    pub async fn stats(&self, days: u32) -> Result<HistoryStats> {
        Ok(HistoryStats::from_entries(&self.history(days).await?))
    }
}

/// Validates raw user input for a goal.
pub fn parse_goal(input: &str) -> Result<u64> {
    let input = input.trim();
    let goal = input
        .parse::<i64>()
        .map_err(|_| anyhow!("{input:?} is not a number of steps"))?;
    if goal <= 0 {
        bail!("Goal has to be a positive number of steps, got {goal}");
    }
    Ok(goal as u64)
}

fn current_steps(prefs: &Prefs) -> u64 {
    prefs.get_int(CURRENT_STEPS, 0).max(0) as u64
}

fn daily_goal(prefs: &Prefs, default_goal: u64) -> u64 {
    match prefs.get_int(DAILY_GOAL, 0) {
        goal if goal > 0 => goal as u64,
        _ => default_goal,
    }
}

fn counter_state(prefs: &Prefs, default_goal: u64) -> CounterState {
    let base = prefs.get_int(STEP_COUNTER_BASE, UNSET_BASE);
    CounterState {
        current_steps: current_steps(prefs),
        base: (base >= 0).then_some(base),
        goal: daily_goal(prefs, default_goal),
    }
}

fn store_counter_state(prefs: &mut Prefs, state: CounterState) {
    prefs.put_int(CURRENT_STEPS, to_stored(state.current_steps));
    prefs.put_int(STEP_COUNTER_BASE, state.base.unwrap_or(UNSET_BASE));
}

fn snapshot_today(prefs: &mut Prefs, today: NaiveDate) {
    let steps = to_stored(current_steps(prefs));
    prefs.put_int(history_key(today), steps);
}

fn to_stored(steps: u64) -> i64 {
    i64::try_from(steps).unwrap_or(i64::MAX)
}
