use crate::sensor::event::SensorEvent;

/// Largest count that still fits the persisted integer.
pub const MAX_STEPS: u64 = i64::MAX as u64;

/// Part of the persisted state the reconciler works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterState {
    pub current_steps: u64,
    /// Zero-point of the hardware counter. `None` until the first reading calibrates it.
    pub base: Option<i64>,
    pub goal: u64,
}

impl CounterState {
    pub fn goal_reached(&self) -> bool {
        self.current_steps >= self.goal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First counter reading of a session, stored as the base.
    Calibrated { base: i64 },
    Credited { steps: u64 },
    /// Counter dropped below the base, which only happens after a reboot.
    Rebased { base: i64 },
    /// Goal is already met, the count stays as is.
    Frozen,
    Ignored,
}

/// Converts one sensor event into the next counter state.
///
/// The base only moves together with credited steps. While the count is frozen at the goal it
/// stays put, so steps made meanwhile get credited once the goal is raised.
pub fn reconcile(state: CounterState, event: SensorEvent) -> (CounterState, RecordOutcome) {
    match event {
        SensorEvent::Counter(raw) if raw < 0 => (state, RecordOutcome::Ignored),
        SensorEvent::Counter(raw) => match state.base {
            None => (
                CounterState {
                    base: Some(raw),
                    ..state
                },
                RecordOutcome::Calibrated { base: raw },
            ),
            Some(base) if raw < base => (
                CounterState {
                    base: Some(raw),
                    ..state
                },
                RecordOutcome::Rebased { base: raw },
            ),
            Some(base) if raw == base => (state, RecordOutcome::Ignored),
            Some(_) if state.goal_reached() => (state, RecordOutcome::Frozen),
            Some(base) => {
                let current_steps = state
                    .current_steps
                    .saturating_add(raw.abs_diff(base))
                    .min(MAX_STEPS);
                (
                    CounterState {
                        current_steps,
                        base: Some(raw),
                        ..state
                    },
                    RecordOutcome::Credited {
                        steps: current_steps - state.current_steps,
                    },
                )
            }
        },
        SensorEvent::Pulse(_) if !event.is_detected_step() => (state, RecordOutcome::Ignored),
        SensorEvent::Pulse(_) if state.goal_reached() => (state, RecordOutcome::Frozen),
        SensorEvent::Pulse(_) => (
            CounterState {
                current_steps: state.current_steps.saturating_add(1).min(MAX_STEPS),
                ..state
            },
            RecordOutcome::Credited { steps: 1 },
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::sensor::event::SensorEvent;

    use super::{reconcile, CounterState, RecordOutcome, MAX_STEPS};

    fn state(current_steps: u64, base: Option<i64>, goal: u64) -> CounterState {
        CounterState {
            current_steps,
            base,
            goal,
        }
    }

    fn run(initial: CounterState, events: &[SensorEvent]) -> CounterState {
        events
            .iter()
            .fold(initial, |state, event| reconcile(state, *event).0)
    }

    #[test]
    fn test_first_reading_calibrates() {
        let (next, outcome) = reconcile(state(12, None, 10_000), SensorEvent::Counter(5_000));
        assert_eq!(outcome, RecordOutcome::Calibrated { base: 5_000 });
        assert_eq!(next, state(12, Some(5_000), 10_000));
    }

    #[test]
    fn test_monotonic_readings_sum_to_last_minus_first() {
        let readings = [1_000, 1_003, 1_003, 1_050, 1_051, 1_400];
        let events = readings.map(SensorEvent::Counter);
        let result = run(state(0, None, 10_000), &events);
        assert_eq!(result.current_steps, 400);
        assert_eq!(result.base, Some(1_400));
    }

    #[test]
    fn test_reboot_never_decreases() {
        let events = [
            SensorEvent::Counter(8_000),
            SensorEvent::Counter(8_100),
            // reboot, counter restarted
            SensorEvent::Counter(20),
            SensorEvent::Counter(70),
        ];
        let mut current = state(0, None, 10_000);
        for event in events {
            let (next, _) = reconcile(current, event);
            assert!(next.current_steps >= current.current_steps);
            current = next;
        }
        assert_eq!(current.current_steps, 150);
        assert_eq!(current.base, Some(70));
    }

    #[test]
    fn test_reboot_rebases_without_credit() {
        let (next, outcome) = reconcile(state(300, Some(9_000), 10_000), SensorEvent::Counter(15));
        assert_eq!(outcome, RecordOutcome::Rebased { base: 15 });
        assert_eq!(next.current_steps, 300);
    }

    #[test]
    fn test_goal_freezes_counter_and_base() {
        let frozen = state(100, Some(500), 100);
        let (next, outcome) = reconcile(frozen, SensorEvent::Counter(700));
        assert_eq!(outcome, RecordOutcome::Frozen);
        assert_eq!(next, frozen);

        let (next, outcome) = reconcile(frozen, SensorEvent::Pulse(1.));
        assert_eq!(outcome, RecordOutcome::Frozen);
        assert_eq!(next, frozen);

        // Raising the goal releases everything walked meanwhile.
        let (next, _) = reconcile(state(100, Some(500), 1_000), SensorEvent::Counter(700));
        assert_eq!(next.current_steps, 300);
    }

    #[test]
    fn test_credit_may_overshoot_goal() {
        let (next, _) = reconcile(state(95, Some(0), 100), SensorEvent::Counter(10));
        assert_eq!(next.current_steps, 105);
    }

    #[test]
    fn test_pulses() {
        let events = [SensorEvent::Pulse(1.); 5];
        let result = run(state(40, None, 100), &events);
        assert_eq!(result.current_steps, 45);
        assert_eq!(result.base, None);

        let (_, outcome) = reconcile(state(40, None, 100), SensorEvent::Pulse(0.));
        assert_eq!(outcome, RecordOutcome::Ignored);
    }

    #[test]
    fn test_negative_reading_ignored() {
        let initial = state(3, Some(10), 100);
        assert_eq!(
            reconcile(initial, SensorEvent::Counter(-4)),
            (initial, RecordOutcome::Ignored)
        );
    }

    #[test]
    fn test_huge_reading_saturates() {
        let initial = state(500, Some(0), MAX_STEPS);
        let (next, outcome) = reconcile(initial, SensorEvent::Counter(i64::MAX));
        assert_eq!(next.current_steps, MAX_STEPS);
        assert_eq!(
            outcome,
            RecordOutcome::Credited {
                steps: MAX_STEPS - 500
            }
        );
        assert_eq!(next.base, Some(i64::MAX));
    }

    #[test]
    fn test_reboot_while_frozen_rebases() {
        let frozen = state(100, Some(5_000), 100);
        let (next, outcome) = reconcile(frozen, SensorEvent::Counter(12));
        assert_eq!(outcome, RecordOutcome::Rebased { base: 12 });
        assert_eq!(next, state(100, Some(12), 100));

        let (next, outcome) = reconcile(next, SensorEvent::Counter(40));
        assert_eq!(outcome, RecordOutcome::Frozen);
        assert_eq!(next.current_steps, 100);

        // After a goal raise only the steps since the reboot count.
        let (next, _) = reconcile(state(100, Some(12), 1_000), SensorEvent::Counter(40));
        assert_eq!(next.current_steps, 128);
    }
}
