//! Stock reconciliation for a paddy mill.
//!
//! Gross intake rows and scanned (production/dispatch) rows come in with
//! loose, inconsistently cased fields. They are normalized to bags and
//! kilograms, grouped, and reconciled into net available stock that never
//! goes negative. The core (`normalize`, `aggregate`, `reconcile`) is pure;
//! loading, refreshing and report output sit around it.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod reconcile;
pub mod refresh;
pub mod reports;
pub mod series;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, summarize_window, DateWindow, WindowSummary};
pub use config::StockConfig;
pub use error::StockError;
pub use normalize::{normalize, BAG_WEIGHT_KG};
pub use reconcile::{percentage_change, reconcile, reconcile_values, KG_PER_QUINTAL};
pub use types::{
    Aggregate, GroupMode, NetTotals, NormalizedRow, RawRecord, ReconciledEntry, ReconciledResult,
    Totals,
};
