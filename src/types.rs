use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;

use crate::error::StockError;

/// One record as it arrives from the stock or scan service.
///
/// Field names come in two casings (`Bags`/`bags`) and values may be numbers,
/// comma-formatted strings, empty strings or null. Nothing about the shape is
/// trusted; `normalize` is the only reader of these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_string(), value.into());
    }

    /// First of `names` holding a non-null value (`Bags ?? bags`).
    pub fn first_present(&self, names: &[&str]) -> Option<&Value> {
        names
            .iter()
            .filter_map(|n| self.0.get(*n))
            .find(|v| !v.is_null())
    }

    /// First of `names` holding a truthy value (`Type || type`).
    pub fn first_truthy(&self, names: &[&str]) -> Option<&Value> {
        names
            .iter()
            .filter_map(|n| self.0.get(*n))
            .find(|v| is_truthy(v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        // Whitespace-only labels count as missing.
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Canonical row every downstream stage works with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRow {
    pub bags_count: i64,
    pub kilograms: f64,
    pub product_type: String,
    pub date: Option<NaiveDate>,
}

/// How rows are bucketed before reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupMode {
    NoGroup,
    ByWeekday,
    ByDate,
    ByType,
}

impl GroupMode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoGroup => "none",
            Self::ByWeekday => "weekday",
            Self::ByDate => "date",
            Self::ByType => "type",
        }
    }
}

impl fmt::Display for GroupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GroupMode {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "all" => Ok(Self::NoGroup),
            "weekday" | "day" => Ok(Self::ByWeekday),
            "date" => Ok(Self::ByDate),
            "type" => Ok(Self::ByType),
            other => Err(StockError::InvalidInput(format!("unknown grouping '{other}'"))),
        }
    }
}

/// Running bag/weight totals for one bucket.
///
/// Weight is held in whole milligrams so that folding rows in any order gives
/// the same bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub bags_count: i64,
    pub weight_mg: i128,
}

pub(crate) const MG_PER_KG: f64 = 1_000_000.0;

pub(crate) fn kg_to_mg(kg: f64) -> i128 {
    (kg * MG_PER_KG).round() as i128
}

pub(crate) fn mg_to_kg(mg: i128) -> f64 {
    mg as f64 / MG_PER_KG
}

impl Totals {
    pub fn add_row(&mut self, row: &NormalizedRow) {
        self.bags_count = self.bags_count.saturating_add(row.bags_count);
        self.weight_mg = self.weight_mg.saturating_add(kg_to_mg(row.kilograms));
    }

    pub fn kilograms(&self) -> f64 {
        mg_to_kg(self.weight_mg)
    }
}

/// Totals keyed by group. Keys are kept sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregate {
    pub(crate) buckets: BTreeMap<String, Totals>,
}

impl Aggregate {
    pub fn get(&self, key: &str) -> Option<&Totals> {
        self.buckets.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Totals)> {
        self.buckets.iter()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Net figures for one group key.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledEntry {
    pub gross_bags: i64,
    pub scanned_bags: i64,
    pub gross_kg: f64,
    pub scanned_kg: f64,
    pub net_kg: f64,
    pub net_quintals: f64,
    pub net_bags: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetTotals {
    pub net_kg: f64,
    pub net_bags: i64,
    pub net_quintals: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledResult {
    pub mode: GroupMode,
    pub groups: BTreeMap<String, ReconciledEntry>,
    pub totals: NetTotals,
    /// Ungrouped gross intake, kept for diagnostics.
    pub gross: Totals,
    /// Ungrouped scanned output, kept for diagnostics.
    pub scanned: Totals,
    pub stock_rows: usize,
    pub scan_rows: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct NetStockRow {
    #[serde(rename = "Key")]
    #[tabled(rename = "Key")]
    pub key: String,
    #[serde(rename = "GrossKg")]
    #[tabled(rename = "GrossKg")]
    pub gross_kg: String,
    #[serde(rename = "ScannedKg")]
    #[tabled(rename = "ScannedKg")]
    pub scanned_kg: String,
    #[serde(rename = "NetKg")]
    #[tabled(rename = "NetKg")]
    pub net_kg: String,
    #[serde(rename = "NetQtl")]
    #[tabled(rename = "NetQtl")]
    pub net_qtl: String,
    #[serde(rename = "NetBags")]
    #[tabled(rename = "NetBags")]
    pub net_bags: i64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct TrendRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Day")]
    #[tabled(rename = "Day")]
    pub day: String,
    #[serde(rename = "Bags")]
    #[tabled(rename = "Bags")]
    pub bags: i64,
    #[serde(rename = "Kg")]
    #[tabled(rename = "Kg")]
    pub kg: String,
    #[serde(rename = "Qtl")]
    #[tabled(rename = "Qtl")]
    pub qtl: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figures {
    pub bags: i64,
    pub kg: f64,
    pub qtl: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowCounts {
    pub stock_rows: usize,
    pub scan_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockSummary {
    pub grouping: GroupMode,
    pub gross: Figures,
    pub scanned: Figures,
    pub net: Figures,
    pub counts: RowCounts,
}
