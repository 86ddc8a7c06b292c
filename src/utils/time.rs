use chrono::{Days, NaiveDate};

/// This is the standard way of converting a date to a string in steptrack. Matches ISO-8601, so
/// keys written by other tools stay readable.
pub fn date_to_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_key(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Returns `days` calendar dates ending with `last` (inclusive), oldest first.
pub fn days_ending_at(last: NaiveDate, days: u32) -> impl Iterator<Item = NaiveDate> {
    (0..days as u64)
        .rev()
        .filter_map(move |offset| last.checked_sub_days(Days::new(offset)))
}
