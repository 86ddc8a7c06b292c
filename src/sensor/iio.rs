use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use tracing::{info, warn};

use super::{event::SensorEvent, StepSensor};

/// Cumulative step counter of an accelerometer driven by the IIO subsystem. The channel is
/// exposed as a sysfs file holding the amount of steps since the chip powered on.
pub struct IioStepCounter {
    path: PathBuf,
}

impl IioStepCounter {
    pub fn new(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            bail!("Step counter channel {path:?} doesn't exist");
        }
        let counter = Self { path };
        counter.enable();
        Ok(counter)
    }

    /// Most drivers keep the counter off until `in_steps_en` is set.
    fn enable(&self) {
        let Some(enable_path) = self
            .path
            .parent()
            .map(|dir| dir.join("in_steps_en"))
            .filter(|v| v.exists())
        else {
            return;
        };
        match std::fs::write(&enable_path, "1") {
            Ok(_) => info!("Enabled step counter through {enable_path:?}"),
            Err(e) => warn!("Can't enable step counter through {enable_path:?}: {e}"),
        }
    }

    fn read_counter(&self) -> Result<i64> {
        let content = std::fs::read_to_string(&self.path)?;
        content
            .trim()
            .parse::<i64>()
            .map_err(|e| anyhow!("Unexpected value {content:?} in {:?}: {e}", self.path))
    }
}

impl StepSensor for IioStepCounter {
    fn poll(&mut self) -> Result<Vec<SensorEvent>> {
        Ok(vec![SensorEvent::Counter(self.read_counter()?)])
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::sensor::{event::SensorEvent, StepSensor};

    use super::IioStepCounter;

    #[test]
    fn test_reads_counter_and_enables_channel() -> Result<()> {
        let dir = tempdir()?;
        let steps = dir.path().join("in_steps_input");
        std::fs::write(&steps, "1532\n")?;
        std::fs::write(dir.path().join("in_steps_en"), "0\n")?;

        let mut counter = IioStepCounter::new(steps.clone())?;
        assert_eq!(std::fs::read_to_string(dir.path().join("in_steps_en"))?, "1");
        assert_eq!(counter.poll()?, vec![SensorEvent::Counter(1532)]);

        std::fs::write(&steps, "garbage")?;
        assert!(counter.poll().is_err());
        Ok(())
    }

    #[test]
    fn test_missing_channel() {
        assert!(IioStepCounter::new("/definitely/not/here/in_steps_input".into()).is_err());
    }
}
