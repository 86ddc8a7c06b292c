use chrono::NaiveDate;
use tracing::{info, warn};

use crate::{
    store::{
        keys::{history_key, CURRENT_STEPS, LAST_DATE, STEP_COUNTER_BASE, UNSET_BASE},
        prefs::Prefs,
    },
    utils::time::{date_to_key, parse_date_key},
};

/// Where the stored daily counter stands relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayState {
    Active(NaiveDate),
    /// The counter belonged to another day. `from` is `None` when the stored day is missing or
    /// unreadable.
    RolledOver {
        from: Option<NaiveDate>,
        to: NaiveDate,
    },
}

/// Decides the state of the counter from the stored `last_date` value.
pub fn transition(last_date: Option<&str>, today: NaiveDate) -> DayState {
    match last_date.map(|raw| (raw, parse_date_key(raw))) {
        Some((_, Some(last))) if last == today => DayState::Active(today),
        Some((_, Some(last))) => DayState::RolledOver {
            from: Some(last),
            to: today,
        },
        Some((raw, None)) => {
            warn!("Stored date {raw:?} can't be parsed, resetting the counter");
            DayState::RolledOver {
                from: None,
                to: today,
            }
        }
        None => DayState::RolledOver {
            from: None,
            to: today,
        },
    }
}

/// Runs the rollover transition on `prefs`. Must be the first step of every transaction that
/// touches the counter.
///
/// The outgoing total is archived only when it's positive and larger than what the history
/// already holds for that day, so a stale zero never replaces a real entry.
pub fn roll_over(prefs: &mut Prefs, today: NaiveDate) -> DayState {
    let state = transition(prefs.get_string(LAST_DATE), today);
    let DayState::RolledOver { from, to } = state else {
        return state;
    };

    let steps = prefs.get_int(CURRENT_STEPS, 0).max(0);
    if let Some(from) = from {
        let key = history_key(from);
        let archived = prefs.get_int(&key, 0);
        if steps > 0 && (!prefs.contains(&key) || archived < steps) {
            prefs.put_int(key, steps);
            info!("New day {to}, archived {steps} steps for {from}");
        } else {
            info!("New day {to}, kept history of {from} as is");
        }
    }

    prefs.put_int(CURRENT_STEPS, 0);
    prefs.put_string(LAST_DATE, date_to_key(to));
    prefs.put_int(STEP_COUNTER_BASE, UNSET_BASE);
    state
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::store::{
        keys::{CURRENT_STEPS, LAST_DATE, STEP_COUNTER_BASE},
        prefs::Prefs,
    };

    use super::{roll_over, transition, DayState};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn prefs_for(last_date: &str, steps: i64) -> Prefs {
        let mut prefs = Prefs::default();
        prefs.put_string(LAST_DATE, last_date);
        prefs.put_int(CURRENT_STEPS, steps);
        prefs.put_int(STEP_COUNTER_BASE, 4_000);
        prefs
    }

    #[test]
    fn test_transition() {
        assert_eq!(transition(Some("2024-01-02"), date(2)), DayState::Active(date(2)));
        assert_eq!(
            transition(Some("2024-01-01"), date(2)),
            DayState::RolledOver {
                from: Some(date(1)),
                to: date(2)
            }
        );
        assert_eq!(
            transition(Some("yesterday"), date(2)),
            DayState::RolledOver {
                from: None,
                to: date(2)
            }
        );
        assert_eq!(
            transition(None, date(2)),
            DayState::RolledOver {
                from: None,
                to: date(2)
            }
        );
    }

    #[test]
    fn test_rollover_archives_previous_day() {
        let mut prefs = prefs_for("2024-01-01", 87);
        roll_over(&mut prefs, date(2));

        assert_eq!(prefs.get_int("history_2024-01-01", 0), 87);
        assert_eq!(prefs.get_int(CURRENT_STEPS, -1), 0);
        assert_eq!(prefs.get_string(LAST_DATE), Some("2024-01-02"));
        assert_eq!(prefs.get_int(STEP_COUNTER_BASE, 0), -1);
    }

    #[test]
    fn test_rollover_keeps_existing_entry() {
        let mut prefs = prefs_for("2024-01-01", 0);
        prefs.put_int("history_2024-01-01", 500);
        roll_over(&mut prefs, date(2));
        assert_eq!(prefs.get_int("history_2024-01-01", 0), 500);

        let mut prefs = prefs_for("2024-01-01", 650);
        prefs.put_int("history_2024-01-01", 500);
        roll_over(&mut prefs, date(2));
        assert_eq!(prefs.get_int("history_2024-01-01", 0), 650);
    }

    #[test]
    fn test_zero_day_is_not_archived() {
        let mut prefs = prefs_for("2024-01-01", 0);
        roll_over(&mut prefs, date(2));
        assert!(!prefs.contains("history_2024-01-01"));
    }

    #[test]
    fn test_same_day_is_untouched() {
        let mut prefs = prefs_for("2024-01-02", 87);
        let before = prefs.clone();
        assert_eq!(roll_over(&mut prefs, date(2)), DayState::Active(date(2)));
        assert_eq!(prefs, before);
    }

    #[test]
    fn test_malformed_date_resets_without_history() {
        let mut prefs = prefs_for("01/01/2024", 87);
        roll_over(&mut prefs, date(2));
        assert_eq!(prefs.get_int(CURRENT_STEPS, -1), 0);
        assert_eq!(prefs.keys_with_prefix("history_").count(), 0);
    }
}
