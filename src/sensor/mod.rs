//! Contains logic for reading steps from different sources.
//! [GenericStepSensor] is the main artifact of this module that abstracts
//! the operations.

pub mod event;
pub mod feed;
#[cfg(target_os = "linux")]
pub mod iio;

use anyhow::Result;
use event::SensorEvent;

use crate::config::SensorConfig;

/// Intended to serve as a contract every step source must implement. Sources are polled, each
/// call returns what happened since the previous one.
#[cfg_attr(test, mockall::automock)]
pub trait StepSensor: Send {
    fn poll(&mut self) -> Result<Vec<SensorEvent>>;
}

/// Serves as a configurable StepSensor implementation.
pub struct GenericStepSensor {
    inner: Box<dyn StepSensor>,
}

impl GenericStepSensor {
    pub fn new(config: &SensorConfig) -> Result<Self> {
        let inner: Box<dyn StepSensor> = match config {
            SensorConfig::Feed { path } => Box::new(feed::FeedSensor::new(path.clone())?),
            SensorConfig::Iio { path } => {
                cfg_if::cfg_if! {
                    if #[cfg(target_os = "linux")] {
                        Box::new(iio::IioStepCounter::new(path.clone())?)
                    } else {
                        anyhow::bail!("Step counter {path:?} requires the Linux IIO subsystem")
                    }
                }
            }
        };
        Ok(Self { inner })
    }
}

impl StepSensor for GenericStepSensor {
    fn poll(&mut self) -> Result<Vec<SensorEvent>> {
        self.inner.poll()
    }
}
