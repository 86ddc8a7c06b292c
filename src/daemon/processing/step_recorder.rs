use std::sync::Arc;

use anyhow::Result;

use crate::{
    sensor::event::SensorEvent,
    store::prefs_store::PrefsStore,
    tracker::StepTracker,
};

use super::module::EventProcessor;

/// Bridges [ProcessingModule](super::ProcessingModule) and [StepTracker].
pub struct StepRecorder<S> {
    tracker: Arc<StepTracker<S>>,
}

impl<S: PrefsStore> StepRecorder<S> {
    pub fn new(tracker: Arc<StepTracker<S>>) -> Self {
        Self { tracker }
    }
}

impl<S: PrefsStore> EventProcessor for StepRecorder<S> {
    async fn process_next(&mut self, message: SensorEvent) -> Result<()> {
        self.tracker.record(message).await?;
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        self.tracker.save_today().await
    }
}
