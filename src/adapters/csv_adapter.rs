//! CSV file market-data adapter.
//!
//! One file per instrument and interval: `<dir>/<SYMBOL>_<interval>.csv`,
//! e.g. `AAPL_1d.csv`, `BRK-B_4h.csv`. Columns are matched by header name
//! (`Date`/`Datetime`, `Open`, `High`, `Low`, `Close`, `Volume`); extra
//! columns such as `Adj Close` are ignored.

use crate::domain::error::SwingscanError;
use crate::domain::ohlcv::{BarSeries, OhlcvBar, SeriesRequest};
use crate::domain::universe::normalize_symbol;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "Date", alias = "Datetime", alias = "datetime", alias = "timestamp")]
    date: String,
    #[serde(alias = "Open")]
    open: Option<f64>,
    #[serde(alias = "High")]
    high: Option<f64>,
    #[serde(alias = "Low")]
    low: Option<f64>,
    #[serde(alias = "Close")]
    close: Option<f64>,
    #[serde(alias = "Volume")]
    volume: Option<f64>,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, symbol: &str, request: SeriesRequest) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", normalize_symbol(symbol), request.interval))
    }

    fn read_bars(&self, symbol: &str, path: &Path) -> Result<Vec<OhlcvBar>, SwingscanError> {
        let fetch_err = |reason: String| SwingscanError::Fetch {
            symbol: symbol.to_string(),
            reason,
        };

        let content = fs::read_to_string(path)
            .map_err(|e| fetch_err(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();
        for (line, result) in rdr.deserialize::<CsvRow>().enumerate() {
            let row = result.map_err(|e| fetch_err(format!("CSV parse error: {}", e)))?;
            let timestamp = parse_timestamp(&row.date).ok_or_else(|| {
                fetch_err(format!("invalid timestamp '{}' on row {}", row.date, line + 1))
            })?;

            // Rows with missing prices (holidays, halted sessions) are dropped.
            let (Some(open), Some(high), Some(low), Some(close)) =
                (row.open, row.high, row.low, row.close)
            else {
                debug!(symbol, row = line + 1, "dropping incomplete row");
                continue;
            };

            bars.push(OhlcvBar {
                timestamp,
                open,
                high,
                low,
                close,
                volume: row.volume.unwrap_or(0.0).round() as i64,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ts);
        }
    }
    // Exchange-local timestamps with an offset keep their wall-clock time.
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z"))
        .ok()
        .map(|dt| dt.naive_local())
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: SeriesRequest,
    ) -> Result<BarSeries, SwingscanError> {
        let symbol = normalize_symbol(symbol);
        let path = self.csv_path(&symbol, request);
        let mut bars = self.read_bars(&symbol, &path)?;

        if let Some(start) = bars
            .last()
            .and_then(|last| request.period.start_from(last.timestamp))
        {
            bars.retain(|b| b.timestamp >= start);
        }

        debug!(symbol = %symbol, request = %request, bars = bars.len(), "loaded bars");
        BarSeries::new(symbol, request.interval, bars)
    }
}
