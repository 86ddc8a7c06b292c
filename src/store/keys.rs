use chrono::NaiveDate;

use crate::utils::time::{date_to_key, parse_date_key};

pub const CURRENT_STEPS: &str = "current_steps";
pub const DAILY_GOAL: &str = "daily_goal";
pub const LAST_DATE: &str = "last_date";
/// Calibration base of the cumulative step counter. [UNSET_BASE] means no calibration yet.
pub const STEP_COUNTER_BASE: &str = "step_counter_base";
pub const BACKGROUND_TRACKING: &str = "background_tracking";
pub const HISTORY_PREFIX: &str = "history_";

pub const UNSET_BASE: i64 = -1;

pub fn history_key(date: NaiveDate) -> String {
    format!("{HISTORY_PREFIX}{}", date_to_key(date))
}

/// Extracts the raw date part of a history key.
pub fn history_date_part(key: &str) -> Option<&str> {
    key.strip_prefix(HISTORY_PREFIX)
}

pub fn history_date(key: &str) -> Option<NaiveDate> {
    history_date_part(key).and_then(parse_date_key)
}
