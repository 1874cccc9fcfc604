// Scheduled refresh: a caller-owned background loop that re-fetches both
// datasets, reconciles them and publishes each result on a channel. The
// reconciliation itself stays free of timers and state.
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::StockConfig;
use crate::error::StockError;
use crate::loader::load_records;
use crate::reconcile::reconcile;
use crate::types::{GroupMode, RawRecord, ReconciledResult};

/// Where gross (stock) and scanned rows come from.
pub trait RecordSource: Send {
    fn name(&self) -> &str;
    fn fetch_stock(&self) -> Result<Vec<RawRecord>, StockError>;
    fn fetch_scans(&self) -> Result<Vec<RawRecord>, StockError>;
}

/// Reads both datasets from exported files on every fetch.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub stock_path: PathBuf,
    pub scans_path: PathBuf,
}

impl FileSource {
    pub fn new(stock_path: impl Into<PathBuf>, scans_path: impl Into<PathBuf>) -> Self {
        Self {
            stock_path: stock_path.into(),
            scans_path: scans_path.into(),
        }
    }

    pub fn from_config(config: &StockConfig) -> Self {
        Self::new(&config.stock_path, &config.scans_path)
    }
}

impl RecordSource for FileSource {
    fn name(&self) -> &str {
        "files"
    }

    fn fetch_stock(&self) -> Result<Vec<RawRecord>, StockError> {
        load_records(&self.stock_path).map(|(records, _)| records)
    }

    fn fetch_scans(&self) -> Result<Vec<RawRecord>, StockError> {
        load_records(&self.scans_path).map(|(records, _)| records)
    }
}

/// A dataset that cannot be fetched counts as empty; the failure is logged.
pub fn fetch_or_empty(
    source: &str,
    dataset: &str,
    fetched: Result<Vec<RawRecord>, StockError>,
) -> Vec<RawRecord> {
    fetched.unwrap_or_else(|e| {
        warn!(source, dataset, error = %e, "fetch failed, treating dataset as empty");
        Vec::new()
    })
}

#[derive(Debug, Clone)]
pub struct RefreshEvent {
    pub tick: u64,
    pub result: ReconciledResult,
}

/// Owner side of a running refresh loop. Dropping it stops the loop.
pub struct RefreshHandle {
    stop_tx: Option<Sender<()>>,
    events: Receiver<RefreshEvent>,
    thread: Option<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn events(&self) -> &Receiver<RefreshEvent> {
        &self.events
    }

    /// Next published result, or `None` if none arrives within `timeout`.
    pub fn next_event(&self, timeout: Duration) -> Option<RefreshEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Closing the stop channel wakes the loop out of its wait.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Start refreshing immediately, then every `interval`.
pub fn spawn_refresh<S>(
    source: S,
    mode: GroupMode,
    interval: Duration,
) -> Result<RefreshHandle, StockError>
where
    S: RecordSource + 'static,
{
    let (stop_tx, stop_rx) = mpsc::channel::<()>();
    let (event_tx, event_rx) = mpsc::channel::<RefreshEvent>();

    let thread = std::thread::Builder::new()
        .name(format!("refresh-{}", source.name()))
        .spawn(move || refresh_loop(source, mode, interval, stop_rx, event_tx))?;

    Ok(RefreshHandle {
        stop_tx: Some(stop_tx),
        events: event_rx,
        thread: Some(thread),
    })
}

fn refresh_loop<S: RecordSource>(
    source: S,
    mode: GroupMode,
    interval: Duration,
    stop_rx: Receiver<()>,
    event_tx: Sender<RefreshEvent>,
) {
    let mut tick = 0u64;
    loop {
        tick += 1;
        let stock = fetch_or_empty(source.name(), "stock", source.fetch_stock());
        let scans = fetch_or_empty(source.name(), "scans", source.fetch_scans());
        let result = reconcile(&stock, &scans, mode);

        if event_tx.send(RefreshEvent { tick, result }).is_err() {
            debug!(tick, "refresh receiver gone, stopping");
            return;
        }

        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                debug!(tick, "refresh stopped");
                return;
            }
        }
    }
}
