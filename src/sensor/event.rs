use std::{fmt::Display, str::FromStr};

use anyhow::{anyhow, bail};

/// Raw event delivered by a step sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorEvent {
    /// Reading of a cumulative hardware counter. Monotonic until the device reboots.
    Counter(i64),
    /// Step detector pulse. A value of `1.0` means one detected step.
    Pulse(f32),
}

impl SensorEvent {
    pub const DETECTED_STEP: f32 = 1.;

    pub fn is_detected_step(&self) -> bool {
        matches!(self, SensorEvent::Pulse(v) if *v == Self::DETECTED_STEP)
    }
}

impl Display for SensorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorEvent::Counter(v) => write!(f, "counter {v}"),
            SensorEvent::Pulse(v) => write!(f, "pulse {v}"),
        }
    }
}

/// Parses the line format used by event feeds: `counter <integer>` or `pulse <number>`.
impl FromStr for SensorEvent {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let (Some(kind), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("Expected '<kind> <value>', got {s:?}");
        };

        match kind.to_ascii_lowercase().as_str() {
            "counter" => Ok(SensorEvent::Counter(
                value
                    .parse()
                    .map_err(|e| anyhow!("Invalid counter value {value:?}: {e}"))?,
            )),
            "pulse" => Ok(SensorEvent::Pulse(
                value
                    .parse()
                    .map_err(|e| anyhow!("Invalid pulse value {value:?}: {e}"))?,
            )),
            _ => bail!("Unknown sensor event kind {kind:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SensorEvent;

    #[test]
    fn test_parse_events() {
        assert_eq!("counter 1234".parse::<SensorEvent>().unwrap(), SensorEvent::Counter(1234));
        assert_eq!("PULSE 1".parse::<SensorEvent>().unwrap(), SensorEvent::Pulse(1.));
        assert_eq!("  pulse   1.0 ".parse::<SensorEvent>().unwrap(), SensorEvent::Pulse(1.));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<SensorEvent>().is_err());
        assert!("counter".parse::<SensorEvent>().is_err());
        assert!("counter ten".parse::<SensorEvent>().is_err());
        assert!("counter 1 2".parse::<SensorEvent>().is_err());
        assert!("steps 1".parse::<SensorEvent>().is_err());
    }

    #[test]
    fn test_detected_step() {
        assert!(SensorEvent::Pulse(1.).is_detected_step());
        assert!(!SensorEvent::Pulse(0.).is_detected_step());
        assert!(!SensorEvent::Counter(1).is_detected_step());
    }
}
