use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::StockError;

pub const DEFAULT_CONFIG_FILE: &str = "paddy_stock.toml";
pub const CONFIG_ENV: &str = "PADDY_STOCK_CONFIG";

/// Runtime settings. Every field has a default, so an absent file is fine.
///
/// ```toml
/// stock_path = "exports/stocks.json"
/// scans_path = "exports/scans.csv"
/// output_dir = "reports"
/// refresh_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StockConfig {
    pub stock_path: PathBuf,
    pub scans_path: PathBuf,
    pub output_dir: PathBuf,
    pub refresh_secs: u64,
    pub preview_rows: usize,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            stock_path: PathBuf::from("stocks.json"),
            scans_path: PathBuf::from("scans.json"),
            output_dir: PathBuf::from("."),
            refresh_secs: 300,
            preview_rows: 5,
        }
    }
}

impl StockConfig {
    pub fn from_toml(s: &str) -> Result<Self, StockError> {
        let config: Self = toml::from_str(s).map_err(|e| StockError::Config(e.to_string()))?;
        if config.refresh_secs == 0 {
            return Err(StockError::Config("refresh_secs must be at least 1".into()));
        }
        Ok(config)
    }

    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, StockError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!(path = %path.display(), "using config file");
                Self::from_toml(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Config from `$PADDY_STOCK_CONFIG`, or `paddy_stock.toml` in the
    /// working directory.
    pub fn load() -> Result<Self, StockError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = StockConfig::from_toml("stock_path = \"in/stock.csv\"\nrefresh_secs = 60\n").unwrap();
        assert_eq!(config.stock_path, PathBuf::from("in/stock.csv"));
        assert_eq!(config.scans_path, PathBuf::from("scans.json"));
        assert_eq!(config.refresh_interval(), Duration::from_secs(60));
        assert_eq!(config.preview_rows, 5);
    }

    #[test]
    fn bad_values_are_config_errors() {
        assert!(matches!(
            StockConfig::from_toml("refresh_secs = \"soon\""),
            Err(StockError::Config(_))
        ));
        assert!(matches!(
            StockConfig::from_toml("refresh_secs = 0"),
            Err(StockError::Config(_))
        ));
        assert!(matches!(
            StockConfig::from_toml("stok_path = \"typo.json\""),
            Err(StockError::Config(_))
        ));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StockConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, StockConfig::default());
    }

    #[test]
    fn file_is_read() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "output_dir = \"reports\"").unwrap();
        f.flush().unwrap();
        let config = StockConfig::load_from(f.path()).unwrap();
        assert_eq!(config.output_path("a.csv"), PathBuf::from("reports").join("a.csv"));
    }
}
