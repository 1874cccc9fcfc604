use thiserror::Error;

/// Errors surfaced to callers of the crate.
///
/// Malformed field values never show up here: the normalizer degrades them to
/// zero, "Unknown" or a skipped date. Only input of the wrong shape entirely
/// (and boundary failures such as IO) is reported.
#[derive(Error, Debug)]
pub enum StockError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}
