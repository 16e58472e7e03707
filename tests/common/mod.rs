#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use swingscan::domain::backtest::BacktestConfig;
use swingscan::domain::error::SwingscanError;
pub use swingscan::domain::ohlcv::{BarSeries, Interval, OhlcvBar, SeriesRequest};
use swingscan::domain::scan::ScanSettings;
use swingscan::ports::data_port::DataPort;

/// Bars keyed by symbol and interval; records every request it serves.
pub struct MockDataPort {
    pub data: HashMap<(String, Interval), Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub panics: HashSet<String>,
    pub requests: Mutex<Vec<(String, SeriesRequest)>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            panics: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Daily bars for `symbol`.
    pub fn with_bars(self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.with_interval_bars(symbol, Interval::Days(1), bars)
    }

    pub fn with_interval_bars(
        mut self,
        symbol: &str,
        interval: Interval,
        bars: Vec<OhlcvBar>,
    ) -> Self {
        self.data.insert((symbol.to_string(), interval), bars);
        self
    }

    /// Same bars served for the daily and 4h requests.
    pub fn with_both_timeframes(self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.with_bars(symbol, bars.clone())
            .with_interval_bars(symbol, Interval::Hours(4), bars)
    }

    pub fn requested_intervals(&self) -> Vec<Interval> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.interval)
            .collect()
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    pub fn with_panic(mut self, symbol: &str) -> Self {
        self.panics.insert(symbol.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        symbol: &str,
        request: SeriesRequest,
    ) -> Result<BarSeries, SwingscanError> {
        self.requests
            .lock()
            .unwrap()
            .push((symbol.to_string(), request));
        if self.panics.contains(symbol) {
            panic!("mock data port blew up on {}", symbol);
        }
        if let Some(reason) = self.errors.get(symbol) {
            return Err(SwingscanError::Fetch {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        let bars = self
            .data
            .get(&(symbol.to_string(), request.interval))
            .cloned()
            .ok_or_else(|| SwingscanError::Fetch {
                symbol: symbol.to_string(),
                reason: format!("no {} bars", request.interval),
            })?;
        BarSeries::new(symbol, request.interval, bars)
    }
}

pub fn timestamp(index: usize) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + TimeDelta::days(index as i64)
}

pub fn make_bar(index: usize, close: f64, volume: i64) -> OhlcvBar {
    OhlcvBar {
        timestamp: timestamp(index),
        open: close,
        high: close,
        low: close,
        close,
        volume,
    }
}

pub fn make_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| make_bar(i, c, 1000))
        .collect()
}

/// Gently rising zig-zag with the given length and base level.
pub fn trending_bars(len: usize, base: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..len)
        .map(|i| base + 0.1 * i as f64 + if i % 2 == 0 { 0.4 } else { -0.4 })
        .collect();
    make_bars(&closes)
}

pub fn series(symbol: &str, bars: Vec<OhlcvBar>) -> BarSeries {
    BarSeries::new(symbol, Interval::Days(1), bars).unwrap()
}

/// Scan settings sized for short synthetic series.
pub fn small_settings(workers: usize) -> ScanSettings {
    ScanSettings {
        min_primary_bars: 50,
        min_higher_bars: 20,
        workers,
        backtest: BacktestConfig::default(),
        ..ScanSettings::default()
    }
}

/// First 51 bars of the reference setup: a drifting zig-zag, then a
/// high-volume bar at index 50 that closes above its EMA, dips to it, and
/// turns RSI up from below 50.
pub fn setup_prefix() -> Vec<OhlcvBar> {
    let mut bars: Vec<OhlcvBar> = (0..50)
        .map(|i| {
            let close = 100.0 - 0.05 * i as f64 + if i % 2 == 0 { 0.3 } else { -0.3 };
            make_bar(i, close, 1000)
        })
        .collect();
    let mut entry = make_bar(50, 98.6, 5000);
    entry.low = 98.1;
    bars.push(entry);
    bars
}
