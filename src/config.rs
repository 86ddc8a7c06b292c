use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tracker::{DEFAULT_DAILY_GOAL, DEFAULT_RETENTION_DAYS};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_IIO_STEPS_PATH: &str = "/sys/bus/iio/devices/iio:device0/in_steps_input";

const MIN_RETENTION_DAYS: u32 = 7;
const MAX_RETENTION_DAYS: u32 = 365;

/// Settings of the daemon and the cli. Every field is optional in the file, missing fields take
/// their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Goal used until the user sets one.
    pub default_goal: u64,
    pub history_retention_days: u32,
    /// How often the daemon re-reads the counter and checks for midnight.
    pub refresh_interval_secs: u64,
    /// How often the sensor is polled.
    pub poll_interval_secs: u64,
    pub sensor: SensorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_goal: DEFAULT_DAILY_GOAL,
            history_retention_days: DEFAULT_RETENTION_DAYS,
            refresh_interval_secs: 1,
            poll_interval_secs: 1,
            sensor: SensorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorConfig {
    /// Cumulative step counter exposed by the Linux industrial I/O subsystem.
    Iio { path: PathBuf },
    /// Text file with one event per line, see [crate::sensor::feed].
    Feed { path: PathBuf },
}

impl Default for SensorConfig {
    fn default() -> Self {
        SensorConfig::Iio {
            path: DEFAULT_IIO_STEPS_PATH.into(),
        }
    }
}

impl Config {
    /// Loads `config.json` from the application directory. A missing file means defaults.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let path = app_dir.join(CONFIG_FILE_NAME);
        let config = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Config>(&content)
                .map_err(|e| anyhow!("Invalid configuration in {path:?}: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No configuration in {path:?}, using defaults");
                Config::default()
            }
            Err(e) => Err(e)?,
        };
        config.validated(app_dir)
    }

    /// Rejects values that can't work and clamps the ones that are merely unreasonable. Relative
    /// sensor paths are resolved against the application directory.
    fn validated(mut self, app_dir: &Path) -> Result<Self> {
        if self.default_goal == 0 || i64::try_from(self.default_goal).is_err() {
            bail!("default_goal must be a positive number of steps");
        }
        self.history_retention_days = self
            .history_retention_days
            .clamp(MIN_RETENTION_DAYS, MAX_RETENTION_DAYS);
        self.refresh_interval_secs = self.refresh_interval_secs.max(1);
        self.poll_interval_secs = self.poll_interval_secs.max(1);

        match &mut self.sensor {
            SensorConfig::Iio { path } | SensorConfig::Feed { path } if path.is_relative() => {
                *path = app_dir.join(&*path);
            }
            SensorConfig::Iio { .. } | SensorConfig::Feed { .. } => {}
        }
        Ok(self)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}
