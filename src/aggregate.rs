use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::types::{mg_to_kg, Aggregate, GroupMode, NormalizedRow, Totals};

/// Locale-independent weekday labels, Monday first.
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Key used for the single bucket of `GroupMode::NoGroup`.
pub const ALL_KEY: &str = "All";

pub fn weekday_label(date: NaiveDate) -> &'static str {
    WEEKDAYS[date.weekday().num_days_from_monday() as usize]
}

/// Bucket key for a row, or `None` when the row has no place in this grouping.
pub fn group_key(row: &NormalizedRow, mode: GroupMode) -> Option<String> {
    match mode {
        GroupMode::NoGroup => Some(ALL_KEY.to_string()),
        GroupMode::ByWeekday => row.date.map(|d| weekday_label(d).to_string()),
        GroupMode::ByDate => row.date.map(|d| d.format("%Y-%m-%d").to_string()),
        GroupMode::ByType => Some(row.product_type.clone()),
    }
}

/// Fold rows into per-key bag and weight totals.
///
/// Rows without a date are skipped for the date-based groupings. The result
/// does not depend on the order of `rows`.
pub fn aggregate(rows: &[NormalizedRow], mode: GroupMode) -> Aggregate {
    let mut agg = Aggregate::default();
    for row in rows {
        // Undated rows have no weekday/date bucket; drop them quietly.
        let Some(key) = group_key(row, mode) else {
            continue;
        };
        // Missing keys start from zero totals.
        agg.buckets.entry(key).or_default().add_row(row);
    }
    agg
}

/// Ungrouped totals of a row set.
pub fn total(rows: &[NormalizedRow]) -> Totals {
    let mut t = Totals::default();
    for row in rows {
        t.add_row(row);
    }
    t
}

/// Inclusive date filter. An open window matches everything; once a bound is
/// set, rows without a date never match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    pub fn day(date: NaiveDate) -> Self {
        Self { from: Some(date), to: Some(date) }
    }

    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: Option<NaiveDate>) -> bool {
        if self.is_open() {
            return true;
        }
        let Some(d) = date else {
            return false;
        };
        self.from.map_or(true, |f| d >= f) && self.to.map_or(true, |t| d <= t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub entries: usize,
    pub bags_count: i64,
    pub kilograms: f64,
}

/// Entry count and totals for the rows inside `window`.
pub fn summarize_window(rows: &[NormalizedRow], window: DateWindow) -> WindowSummary {
    let mut entries = 0usize;
    let mut t = Totals::default();
    for row in rows.iter().filter(|r| window.contains(r.date)) {
        entries += 1;
        t.add_row(row);
    }
    WindowSummary {
        entries,
        bags_count: t.bags_count,
        kilograms: mg_to_kg(t.weight_mg),
    }
}
