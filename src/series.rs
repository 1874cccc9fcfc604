// Daily stock series for the dashboard chart: period and volume filters, axis
// ticks and the day-over-day change figure.
use chrono::NaiveDate;

use crate::aggregate::weekday_label;
use crate::reconcile::percentage_change;
use crate::types::Aggregate;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub weekday: &'static str,
    pub bags: i64,
    pub kilograms: f64,
}

/// Which slice of the daily series to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// The last seven days that have data.
    ThisWeek,
    /// The seven data days before `ThisWeek`.
    LastWeek,
    All,
    Custom { start: NaiveDate, end: NaiveDate },
}

/// Inclusive kilogram bounds on a single day's volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRange {
    pub min: f64,
    pub max: f64,
}

impl Default for VolumeRange {
    fn default() -> Self {
        Self { min: 0.0, max: f64::INFINITY }
    }
}

impl VolumeRange {
    pub fn contains(&self, kg: f64) -> bool {
        kg >= self.min && kg <= self.max
    }
}

/// Date-ordered points from a `ByDate` aggregate. Keys that are not dates are
/// ignored.
pub fn daily_series(by_date: &Aggregate) -> Vec<TrendPoint> {
    // BTreeMap order over `YYYY-MM-DD` keys is already chronological.
    by_date
        .iter()
        .filter_map(|(key, t)| {
            let date = NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()?;
            Some(TrendPoint {
                date,
                weekday: weekday_label(date),
                bags: t.bags_count,
                kilograms: t.kilograms(),
            })
        })
        .collect()
}

pub fn select_period(points: &[TrendPoint], period: Period) -> Vec<TrendPoint> {
    let n = points.len();
    match period {
        Period::ThisWeek => points[n.saturating_sub(7)..].to_vec(),
        Period::LastWeek => points[n.saturating_sub(14)..n.saturating_sub(7)].to_vec(),
        Period::All => points.to_vec(),
        Period::Custom { start, end } => points
            .iter()
            .filter(|p| p.date >= start && p.date <= end)
            .cloned()
            .collect(),
    }
}

pub fn filter_volume(points: &[TrendPoint], range: VolumeRange) -> Vec<TrendPoint> {
    points.iter().filter(|p| range.contains(p.kilograms)).cloned().collect()
}

/// Y-axis gridline values, highest first, ending at zero.
pub fn axis_ticks(max_kg: f64) -> Vec<f64> {
    let max_kg = if max_kg.is_finite() { max_kg.max(0.0) } else { 0.0 };
    let mut step = (max_kg / 5.0 / 10.0).ceil() * 10.0;
    if step <= 0.0 {
        step = 50.0;
    }
    let top = (max_kg / step).ceil() as i64;
    (0..=top).rev().map(|i| i as f64 * step).collect()
}

/// Percent change between the last two points; 0 with fewer than two.
pub fn latest_change(points: &[TrendPoint]) -> i64 {
    match points {
        [.., prev, curr] => percentage_change(prev.kilograms, curr.kilograms),
        _ => 0,
    }
}
