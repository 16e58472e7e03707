//! Market reference tables stored as CSV.
//!
//! A market name maps to `<dir>/<slug>.csv` where the slug keeps only the
//! lowercase alphanumerics of the name (`S&P500` -> `sp500.csv`,
//! `NASDAQ 100` -> `nasdaq100.csv`). The table needs a `Symbol` or `Ticker`
//! column; other columns are ignored.

use crate::domain::error::SwingscanError;
use crate::domain::universe::{dedup_symbols, normalize_symbol};
use crate::ports::universe_port::UniversePort;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

const SYMBOL_COLUMNS: [&str; 2] = ["symbol", "ticker"];

pub struct CsvUniverseAdapter {
    base_path: PathBuf,
}

impl CsvUniverseAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn table_path(&self, market: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", market_slug(market)))
    }
}

pub fn market_slug(market: &str) -> String {
    market
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl UniversePort for CsvUniverseAdapter {
    fn resolve_universe(&self, market: &str) -> Result<Vec<String>, SwingscanError> {
        let unavailable = |reason: String| SwingscanError::UniverseUnavailable {
            market: market.to_string(),
            reason,
        };

        let path = self.table_path(market);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| unavailable(format!("CSV parse error: {}", e)))?
            .clone();
        let column = headers
            .iter()
            .position(|h| SYMBOL_COLUMNS.contains(&h.trim().to_lowercase().as_str()))
            .ok_or_else(|| unavailable("table has no Symbol or Ticker column".into()))?;

        let mut symbols = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| unavailable(format!("CSV parse error: {}", e)))?;
            match record.get(column).map(str::trim) {
                Some(s) if !s.is_empty() => symbols.push(normalize_symbol(s)),
                _ => {}
            }
        }

        let symbols = dedup_symbols(symbols);
        if symbols.is_empty() {
            return Err(unavailable("table lists no symbols".into()));
        }
        debug!(market, count = symbols.len(), "resolved universe");
        Ok(symbols)
    }

    fn list_markets(&self) -> Result<Vec<String>, SwingscanError> {
        let entries = fs::read_dir(&self.base_path)?;
        let mut markets = Vec::new();
        for entry in entries {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".csv") {
                markets.push(stem.to_string());
            }
        }
        markets.sort();
        Ok(markets)
    }
}
