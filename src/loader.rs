use crate::error::StockError;
use crate::types::RawRecord;
use csv::{ReaderBuilder, Trim};
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
}

/// Load stock or scan records from disk.
///
/// `.json` files hold the array the stock/scan services return from their
/// list endpoints; anything else is read as a headed CSV export where every
/// cell is kept as a string for the normalizer to interpret.
pub fn load_records(path: impl AsRef<Path>) -> Result<(Vec<RawRecord>, LoadReport), StockError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("json"));
    let (records, report) = if is_json { load_json(path)? } else { load_csv(path)? };
    info!(
        path = %path.display(),
        rows = report.loaded_rows,
        skipped = report.parse_errors,
        "loaded records"
    );
    Ok((records, report))
}

fn load_json(path: &Path) -> Result<(Vec<RawRecord>, LoadReport), StockError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    let records = records_from_value(&value)?;
    let report = LoadReport {
        total_rows: records.len(),
        loaded_rows: records.len(),
        parse_errors: 0,
    };
    Ok((records, report))
}

fn load_csv(path: &Path) -> Result<(Vec<RawRecord>, LoadReport), StockError> {
    let mut rdr = ReaderBuilder::new().flexible(true).trim(Trim::All).from_path(path)?;
    let headers = rdr.headers()?.clone();
    let mut total_rows = 0usize;
    let mut parse_errors = 0usize;
    let mut records = Vec::new();

    for result in rdr.records() {
        total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row = total_rows, error = %e, "skipping unreadable CSV row");
                parse_errors += 1;
                continue;
            }
        };
        let mut raw = RawRecord::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            raw.insert(header, cell);
        }
        records.push(raw);
    }

    let report = LoadReport {
        total_rows,
        loaded_rows: records.len(),
        parse_errors,
    };
    Ok((records, report))
}

/// Check that a payload is a sequence of records and unpack it.
///
/// `null`, scalars, single objects and arrays holding non-objects are all
/// rejected with `InvalidInput`; an empty array is a valid, empty dataset.
pub fn records_from_value(value: &Value) -> Result<Vec<RawRecord>, StockError> {
    let Value::Array(items) = value else {
        return Err(StockError::InvalidInput(format!(
            "expected an array of records, found {}",
            kind_name(value)
        )));
    };
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| match item {
            Value::Object(map) => Ok(RawRecord::from(map.clone())),
            other => Err(StockError::InvalidInput(format!(
                "record {idx} is {}, not an object",
                kind_name(other)
            ))),
        })
        .collect()
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
