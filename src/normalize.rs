use crate::types::{NormalizedRow, RawRecord};
use crate::util::{parse_date_value, round_count, to_number};

/// Fixed weight of one bag of paddy.
pub const BAG_WEIGHT_KG: f64 = 60.0;

/// Largest weight a single row may carry. Larger values are clamped so that
/// totals over many rows still fit the milligram accumulator.
pub const MAX_ROW_KILOGRAMS: f64 = 1e15;

/// Bag count matching `MAX_ROW_KILOGRAMS`.
pub const MAX_ROW_BAGS: f64 = MAX_ROW_KILOGRAMS / BAG_WEIGHT_KG;

pub const UNKNOWN_TYPE: &str = "Unknown";

const BAGS_FIELDS: &[&str] = &["Bags", "bags"];
const WEIGHT_FIELDS: &[&str] = &["Weight", "weight"];
const TYPE_FIELDS: &[&str] = &["Type", "type"];
const DATE_FIELDS: &[&str] = &["Date", "date", "scannedAt"];

/// Turn a raw stock/scan record into bags and kilograms.
///
/// A positive bag count is authoritative and fixes the weight at 60 kg per
/// bag. Without bags, a positive weight is taken as kilograms and the bag
/// count is estimated from it. Anything else is an empty row. Quantities
/// above `MAX_ROW_KILOGRAMS` (or the matching bag count) are clamped. Never
/// fails.
pub fn normalize(raw: &RawRecord) -> NormalizedRow {
    // Both fields are read up front; unusable values come back as 0.
    let bags_raw = to_number(raw.first_present(BAGS_FIELDS)).min(MAX_ROW_BAGS);
    let weight_raw = to_number(raw.first_present(WEIGHT_FIELDS)).min(MAX_ROW_KILOGRAMS);

    let (bags_count, kilograms) = if bags_raw > 0.0 {
        // Bags are the physical unit, so weight follows from the rounded count.
        let bags = round_count(bags_raw);
        (bags, bags as f64 * BAG_WEIGHT_KG)
    } else if weight_raw > 0.0 {
        // Weight only: keep the kilograms as given, estimate the bags.
        (round_count(weight_raw / BAG_WEIGHT_KG), weight_raw)
    } else {
        (0, 0.0)
    };

    NormalizedRow {
        bags_count,
        kilograms,
        product_type: product_type(raw),
        date: parse_date_value(raw.first_present(DATE_FIELDS)),
    }
}

pub fn normalize_all(raws: &[RawRecord]) -> Vec<NormalizedRow> {
    raws.iter().map(normalize).collect()
}

fn product_type(raw: &RawRecord) -> String {
    let label = match raw.first_truthy(TYPE_FIELDS) {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    if label.is_empty() {
        UNKNOWN_TYPE.to_string()
    } else {
        label
    }
}
