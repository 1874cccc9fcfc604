use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use crate::aggregate::{aggregate, total};
use crate::error::StockError;
use crate::loader::records_from_value;
use crate::normalize::normalize_all;
use crate::types::{
    mg_to_kg, GroupMode, NetTotals, RawRecord, ReconciledEntry, ReconciledResult, Totals,
};
use crate::util::round2;

pub const KG_PER_QUINTAL: f64 = 100.0;

/// Net available stock: gross intake minus scanned output, per group.
///
/// Each key present on either side gets an entry. Net weight and net bags are
/// clamped at zero per key, so a deficit in one group never eats into another.
/// Totals are the sum of the per-key nets.
pub fn reconcile(gross: &[RawRecord], scanned: &[RawRecord], mode: GroupMode) -> ReconciledResult {
    let gross_rows = normalize_all(gross);
    let scanned_rows = normalize_all(scanned);

    let gross_agg = aggregate(&gross_rows, mode);
    let scanned_agg = aggregate(&scanned_rows, mode);

    // Union of both sides: a type seen only in scans still gets a row.
    let keys: BTreeSet<&String> = gross_agg.keys().chain(scanned_agg.keys()).collect();
    let zero = Totals::default();

    let mut groups = BTreeMap::new();
    let mut totals = NetTotals::default();
    let mut quintal_sum = 0.0;
    for key in keys {
        let g = gross_agg.get(key).unwrap_or(&zero);
        let s = scanned_agg.get(key).unwrap_or(&zero);
        let entry = net_entry(g, s);

        totals.net_kg += entry.net_kg;
        totals.net_bags = totals.net_bags.saturating_add(entry.net_bags);
        quintal_sum += entry.net_quintals;
        groups.insert(key.clone(), entry);
    }
    // Quintals are already rounded per key; re-round to drop float noise.
    totals.net_quintals = round2(quintal_sum);

    let result = ReconciledResult {
        mode,
        groups,
        totals,
        gross: total(&gross_rows),
        scanned: total(&scanned_rows),
        stock_rows: gross.len(),
        scan_rows: scanned.len(),
    };
    debug!(
        mode = %mode,
        stock_rows = result.stock_rows,
        scan_rows = result.scan_rows,
        groups = result.groups.len(),
        net_kg = result.totals.net_kg,
        "reconciled stock"
    );
    result
}

/// Same as [`reconcile`], for payloads that have not been checked yet.
///
/// Fails with `InvalidInput` when either payload is not an array of objects,
/// so a malformed request is never mistaken for an empty warehouse.
pub fn reconcile_values(
    gross: &Value,
    scanned: &Value,
    mode: GroupMode,
) -> Result<ReconciledResult, StockError> {
    let gross = records_from_value(gross)?;
    let scanned = records_from_value(scanned)?;
    Ok(reconcile(&gross, &scanned, mode))
}

fn net_entry(gross: &Totals, scanned: &Totals) -> ReconciledEntry {
    // Clamp per key: a deficit here must not reduce any other group.
    let net_mg = gross.weight_mg.saturating_sub(scanned.weight_mg).max(0);
    let net_kg = mg_to_kg(net_mg);
    ReconciledEntry {
        gross_bags: gross.bags_count,
        scanned_bags: scanned.bags_count,
        gross_kg: gross.kilograms(),
        scanned_kg: scanned.kilograms(),
        net_kg,
        net_quintals: round2(net_kg / KG_PER_QUINTAL),
        net_bags: gross.bags_count.saturating_sub(scanned.bags_count).max(0),
    }
}

/// Whole-percent change between two consecutive period totals.
///
/// A previous value of zero reports 100 for growth and 0 otherwise. Halves
/// round toward positive infinity.
pub fn percentage_change(prev: f64, curr: f64) -> i64 {
    if prev == 0.0 {
        return if curr > 0.0 { 100 } else { 0 };
    }
    ((curr - prev) / prev * 100.0 + 0.5).floor() as i64
}
