use std::cmp::Ordering;

use crate::aggregate::WEEKDAYS;
use crate::reconcile::KG_PER_QUINTAL;
use crate::series::TrendPoint;
use crate::types::{
    Figures, GroupMode, NetStockRow, ReconciledResult, RowCounts, StockSummary, Totals, TrendRow,
};
use crate::util::{format_number, round2};

/// Table rows for a reconciliation, in display order.
///
/// Types are ranked by net weight, heaviest first. Weekdays run Mon..Sun and
/// dates run chronologically.
pub fn net_stock_rows(result: &ReconciledResult) -> Vec<NetStockRow> {
    let mut entries: Vec<_> = result.groups.iter().collect();
    match result.mode {
        GroupMode::ByType => entries.sort_by(|a, b| {
            b.1.net_kg
                .partial_cmp(&a.1.net_kg)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        }),
        GroupMode::ByWeekday => entries.sort_by_key(|(key, _)| weekday_rank(key)),
        GroupMode::NoGroup | GroupMode::ByDate => {}
    }

    entries
        .into_iter()
        .map(|(key, e)| NetStockRow {
            key: key.clone(),
            gross_kg: format_number(e.gross_kg, 2),
            scanned_kg: format_number(e.scanned_kg, 2),
            net_kg: format_number(e.net_kg, 2),
            net_qtl: format_number(e.net_quintals, 2),
            net_bags: e.net_bags,
        })
        .collect()
}

fn weekday_rank(key: &str) -> usize {
    WEEKDAYS.iter().position(|d| *d == key).unwrap_or(WEEKDAYS.len())
}

pub fn trend_rows(points: &[TrendPoint]) -> Vec<TrendRow> {
    points
        .iter()
        .map(|p| TrendRow {
            date: p.date.format("%Y-%m-%d").to_string(),
            day: p.weekday.to_string(),
            bags: p.bags,
            kg: format_number(p.kilograms, 2),
            qtl: format_number(p.kilograms / KG_PER_QUINTAL, 2),
        })
        .collect()
}

fn figures(t: &Totals) -> Figures {
    let kg = t.kilograms();
    Figures {
        bags: t.bags_count,
        kg: round2(kg),
        qtl: round2(kg / KG_PER_QUINTAL),
    }
}

/// Gross, scanned and net figures for the JSON summary.
pub fn summary(result: &ReconciledResult) -> StockSummary {
    StockSummary {
        grouping: result.mode,
        gross: figures(&result.gross),
        scanned: figures(&result.scanned),
        net: Figures {
            bags: result.totals.net_bags,
            kg: round2(result.totals.net_kg),
            qtl: result.totals.net_quintals,
        },
        counts: RowCounts {
            stock_rows: result.stock_rows,
            scan_rows: result.scan_rows,
        },
    }
}
