use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::{
    store::{
        keys::{history_date, history_key, HISTORY_PREFIX},
        prefs::Prefs,
    },
    utils::time::{days_ending_at, parse_date_key},
};

/// Longest window a history or stats request may cover, roughly ten years.
pub const MAX_HISTORY_DAYS: u32 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub steps: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: u64,
    /// Truncated towards zero.
    pub average: u64,
    pub max: u64,
    pub min: u64,
    pub days: usize,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        if entries.is_empty() {
            return Self::default();
        }
        let total = entries.iter().map(|v| v.steps).sum::<u64>();
        Self {
            total,
            average: total / entries.len() as u64,
            max: entries.iter().map(|v| v.steps).max().unwrap_or(0),
            min: entries.iter().map(|v| v.steps).min().unwrap_or(0),
            days: entries.len(),
        }
    }
}

/// Builds one entry per day for the `days` days ending today, oldest first. Days without an
/// archived value are reported as zero.
pub fn collect(prefs: &Prefs, today: NaiveDate, days: u32) -> Vec<HistoryEntry> {
    days_ending_at(today, days)
        .map(|date| HistoryEntry {
            date,
            steps: prefs.get_int(&history_key(date), 0).max(0) as u64,
        })
        .collect()
}

/// Removes archived days that fell out of the retention window. Keys with unreadable dates are
/// left alone. Returns the amount of removed entries.
pub fn prune(prefs: &mut Prefs, today: NaiveDate, retention_days: u32) -> usize {
    let Some(cutoff) = today.checked_sub_days(Days::new(retention_days as u64)) else {
        return 0;
    };
    let expired = prefs
        .keys_with_prefix(HISTORY_PREFIX)
        .filter(|key| matches!(history_date(key), Some(date) if date <= cutoff))
        .map(str::to_owned)
        .collect::<Vec<_>>();

    for key in &expired {
        prefs.remove(key);
    }
    if !expired.is_empty() {
        debug!("Pruned {} history entries up to {cutoff}", expired.len());
    }
    expired.len()
}

/// Human friendly label for a stored date. Unparseable values are shown as they are.
pub fn format_date_label(raw: &str, today: NaiveDate) -> String {
    let Some(date) = parse_date_key(raw) else {
        return raw.to_string();
    };
    if date == today {
        "Today".into()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".into()
    } else {
        date.format("%b %d, %Y").to_string()
    }
}

/// Compact step amount: `950`, `1.5K`, `2.25M`.
pub fn format_steps(steps: u64) -> String {
    fn compact(value: f64, suffix: &str) -> String {
        let formatted = format!("{value:.2}");
        let formatted = formatted.trim_end_matches('0').trim_end_matches('.');
        format!("{formatted}{suffix}")
    }

    if steps >= 1_000_000 {
        compact(steps as f64 / 1_000_000., "M")
    } else if steps >= 1_000 {
        compact(steps as f64 / 1_000., "K")
    } else {
        steps.to_string()
    }
}
