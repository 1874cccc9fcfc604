// Utility helpers for parsing and formatting.
//
// All of the forgiving number/date handling lives here so the normalizer can
// stay a short list of business rules.
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Parse a loosely formatted numeric string the way the stock sheets write
/// them.
///
/// - Strips thousands separators (`"1,250"`) and surrounding whitespace.
/// - Empty or unparseable input yields `0.0`.
/// - `NaN` and infinities are treated as `0.0` so they never reach a total.
pub fn parse_number_str(s: &str) -> f64 {
    let s = s.replace(',', "");
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Numeric value of an arbitrary JSON field. Non-numeric kinds count as zero.
pub fn to_number(v: Option<&Value>) -> f64 {
    match v {
        Some(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_number_str(s),
        _ => 0.0,
    }
}

/// Round a quantity to the nearest whole number.
///
/// Callers cap the input first; the cast alone clamps to the `i64` range but
/// leaves no headroom for summing.
pub fn round_count(n: f64) -> i64 {
    n.round() as i64
}

/// Calendar date of a string-ish timestamp.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps (taken as their UTC date) and
/// naive `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` forms.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc().date());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

pub fn parse_date_value(v: Option<&Value>) -> Option<NaiveDate> {
    match v {
        Some(Value::String(s)) => parse_date_safe(Some(s)),
        _ => None,
    }
}

/// Two-decimal rounding used for every figure shown to a person.
pub fn round2(n: f64) -> f64 {
    ((n + f64::EPSILON) * 100.0).round() / 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus `en` thousands separators, e.g. `1,234,567.89`.
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = parts.next() {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
