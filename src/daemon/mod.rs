use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Result;
use collection::collector::DataCollectionModule;
use processing::{step_recorder::StepRecorder, ProcessingModule};
use refresh::{RefreshModule, DEFAULT_SAVE_EVERY};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    config::Config,
    sensor::{event::SensorEvent, GenericStepSensor, StepSensor},
    store::{file_store::FilePrefsStore, prefs_store::PrefsStore},
    tracker::{StepTracker, TrackerSettings},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod collection;
pub mod processing;
pub mod refresh;
pub mod shutdown;

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf) -> Result<()> {
    let dir = std::fs::canonicalize(dir)?;
    let config = Config::load(&dir)?;

    let tracker = Arc::new(StepTracker::new(
        FilePrefsStore::in_dir(&dir)?,
        Box::new(DefaultClock),
        TrackerSettings::from(&config),
    ));
    if !tracker.background_tracking().await? {
        info!("Background tracking is disabled in {dir:?}, not starting the daemon");
        return Ok(());
    }

    std::env::set_current_dir("/")?;
    info!("Starting daemon in {dir:?} with {config:?}");

    let (sender, receiver) = mpsc::channel::<SensorEvent>(10);
    let sensor = GenericStepSensor::new(&config.sensor)?;

    tracker.ensure_default_goal().await?;
    tracker.begin_session().await?;

    let shutdown_token = CancellationToken::new();

    let collector = create_collector(
        sender,
        sensor,
        &shutdown_token,
        config.poll_interval(),
        DefaultClock,
    );

    let processor = create_processor(tracker.clone(), receiver);

    let refresher = create_refresher(
        tracker,
        &shutdown_token,
        config.refresh_interval(),
        DefaultClock,
    );

    let (_, collection_result, processing_result, refresh_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        async {
            let result = collector.run().await;
            // Without a collector there is nothing left to do.
            shutdown_token.cancel();
            result
        },
        processor.run(),
        refresher.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    if let Err(refresh_result) = refresh_result {
        error!("Refresh module got an error {:?}", refresh_result);
    }

    Ok(())
}

fn create_collector(
    sender: mpsc::Sender<SensorEvent>,
    sensor: impl StepSensor + 'static,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> DataCollectionModule {
    DataCollectionModule::new(
        sender,
        Box::new(sensor),
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}

fn create_processor<S: PrefsStore>(
    tracker: Arc<StepTracker<S>>,
    receiver: mpsc::Receiver<SensorEvent>,
) -> ProcessingModule<StepRecorder<S>> {
    ProcessingModule::new(receiver, StepRecorder::new(tracker))
}

fn create_refresher<S: PrefsStore>(
    tracker: Arc<StepTracker<S>>,
    shutdown_token: &CancellationToken,
    refresh_interval: Duration,
    clock: impl Clock,
) -> RefreshModule<S> {
    RefreshModule::new(
        tracker,
        shutdown_token.clone(),
        refresh_interval,
        DEFAULT_SAVE_EVERY,
        Box::new(clock),
    )
}

#[cfg(test)]
mod daemon_tests {
    use std::{sync::Arc, time::Duration};

    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::tempdir;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use crate::{
        daemon::{create_collector, create_processor, create_refresher, start_daemon},
        sensor::{event::SensorEvent, MockStepSensor},
        store::{file_store::FilePrefsStore, prefs_store::PrefsStore},
        tracker::{StepTracker, TrackerSettings},
        utils::{clock::test_clock::ManualClock, logging::TEST_LOGGING},
    };

    const TEST_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2018, 7, 4) {
        Some(date) => date,
        None => panic!("invalid test date"),
    };

    /// Very simple smoke test to check if the whole pipeline works: sensor, channel, tracker and
    /// the file store. Time is paused, so the seconds pass instantly.
    #[tokio::test(start_paused = true)]
    async fn smoke_test_daemon() -> Result<()> {
        *TEST_LOGGING;
        let mut mock_sensor = MockStepSensor::new();
        let mut reading = 990;
        mock_sensor.expect_poll().returning(move || {
            reading += 10;
            Ok(vec![SensorEvent::Counter(reading)])
        });

        let dir = tempdir()?;
        let clock = ManualClock::new(TEST_DATE);
        let tracker = Arc::new(StepTracker::new(
            FilePrefsStore::in_dir(dir.path())?,
            Box::new(clock.clone()),
            TrackerSettings::default(),
        ));
        tracker.ensure_default_goal().await?;
        tracker.begin_session().await?;

        let shutdown_token = CancellationToken::new();
        let (sender, receiver) = mpsc::channel::<SensorEvent>(10);

        let collector = create_collector(
            sender,
            mock_sensor,
            &shutdown_token,
            Duration::from_secs(1),
            clock.clone(),
        );
        let processor = create_processor(tracker.clone(), receiver);
        let refresher = create_refresher(
            tracker.clone(),
            &shutdown_token,
            Duration::from_secs(1),
            clock.clone(),
        );

        let (_, collection_result, processing_result, refresh_result) = tokio::join!(
            async {
                tokio::time::sleep(Duration::from_millis(3500)).await;
                shutdown_token.cancel()
            },
            collector.run(),
            processor.run(),
            refresher.run(),
        );

        collection_result?;
        processing_result?;
        refresh_result?;

        // Readings 1000, 1010, 1020 and 1030: the first one only calibrates.
        let reopened = FilePrefsStore::in_dir(dir.path())?;
        let prefs = reopened.read().await?;
        assert_eq!(prefs.get_int("current_steps", 0), 30);
        assert_eq!(prefs.get_int("history_2018-07-04", 0), 30);
        assert_eq!(prefs.get_int("daily_goal", 0), 10_000);

        Ok(())
    }

    #[tokio::test]
    async fn test_daemon_exits_when_tracking_disabled() -> Result<()> {
        *TEST_LOGGING;
        let dir = tempdir()?;
        let store = FilePrefsStore::in_dir(dir.path())?;
        store
            .update(|prefs| prefs.put_bool("background_tracking", false))
            .await?;

        tokio::time::timeout(Duration::from_secs(5), start_daemon(dir.path().to_path_buf()))
            .await??;

        // Nothing was started, so no session was opened either.
        let prefs = store.read().await?;
        assert!(!prefs.contains("daily_goal"));
        assert!(!prefs.contains("step_counter_base"));
        Ok(())
    }
}
