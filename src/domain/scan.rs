//! Scan orchestration across a universe.
//!
//! Each instrument runs the full pipeline (fetch, indicators, relative
//! strength, scoring, backtest) independently on a bounded worker pool. The
//! pool size also caps concurrent calls into the data port. Failures and
//! panics become skip entries; ranking happens once every instrument has
//! finished.

use crate::domain::backtest::{BacktestConfig, BacktestReport, run_backtest};
use crate::domain::error::SwingscanError;
use crate::domain::indicator_set::{IndicatorParams, IndicatorSet};
use crate::domain::ohlcv::{BarSeries, SeriesRequest};
use crate::domain::profile::ScoringProfile;
use crate::domain::relative_strength::{DEFAULT_LOOKBACK, relative_strength};
use crate::domain::rule::{BarView, RuleContext};
use crate::domain::scoring::{self, ScoreCard};
use crate::domain::snapshot::{self, TickerSnapshot};
use crate::ports::data_port::DataPort;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

pub const MIN_PRIMARY_BARS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    pub primary: SeriesRequest,
    pub higher: SeriesRequest,
    pub min_primary_bars: usize,
    pub min_higher_bars: usize,
    pub rs_lookback: usize,
    pub max_instruments: usize,
    pub workers: usize,
    pub indicators: IndicatorParams,
    pub backtest: BacktestConfig,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            primary: SeriesRequest::daily(),
            higher: SeriesRequest::four_hour(),
            min_primary_bars: 200,
            min_higher_bars: 50,
            rs_lookback: DEFAULT_LOOKBACK,
            max_instruments: 100,
            workers: 4,
            indicators: IndicatorParams::default(),
            backtest: BacktestConfig::default(),
        }
    }
}

/// Benchmark given directly or as a symbol to fetch with the primary request.
#[derive(Debug, Clone)]
pub enum Benchmark {
    Series(BarSeries),
    Symbol(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    pub done: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    Fetch(String),
    InsufficientBars { bars: usize, minimum: usize },
    InvalidData(String),
    Failed(String),
}

impl From<SwingscanError> for SkipReason {
    fn from(err: SwingscanError) -> Self {
        match err {
            SwingscanError::Fetch { reason, .. } => SkipReason::Fetch(reason),
            SwingscanError::InsufficientData { bars, minimum, .. } => {
                SkipReason::InsufficientBars { bars, minimum }
            }
            SwingscanError::InvalidSeries { reason, .. } => SkipReason::InvalidData(reason),
            other => SkipReason::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedInstrument {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    /// Ranked best first.
    pub snapshots: Vec<TickerSnapshot>,
    pub skipped: Vec<SkippedInstrument>,
    pub total: usize,
}

impl ScanOutcome {
    /// False for a scan that completed but produced no snapshots.
    pub fn has_results(&self) -> bool {
        !self.snapshots.is_empty()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Full result of analysing one instrument.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub snapshot: TickerSnapshot,
    pub card: ScoreCard,
    pub backtest: BacktestReport,
}

/// Score and backtest already-retrieved series for one instrument.
pub fn analyze_series(
    series: &BarSeries,
    higher: Option<&BarSeries>,
    benchmark: &BarSeries,
    profile: &ScoringProfile,
    settings: &ScanSettings,
) -> Result<Analysis, SwingscanError> {
    let indicators = IndicatorSet::compute(series, &settings.indicators)?;
    let higher_indicators = match higher {
        Some(h) => Some(IndicatorSet::compute(h, &settings.indicators)?),
        None => None,
    };

    let rs = match relative_strength(series, benchmark, settings.rs_lookback) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(symbol = series.symbol(), error = %e, "relative strength unavailable");
            None
        }
    };

    let primary = BarView::latest(series, &indicators).ok_or_else(|| {
        SwingscanError::InsufficientData {
            symbol: series.symbol().to_string(),
            bars: 0,
            minimum: 1,
        }
    })?;
    let higher_view = match (higher, higher_indicators.as_ref()) {
        (Some(h), Some(hi)) => BarView::latest(h, hi),
        _ => None,
    };
    let ctx = RuleContext {
        primary,
        relative_strength: rs,
        higher: higher_view,
    };

    let card = scoring::evaluate(profile, &ctx);
    let backtest = run_backtest(series, &indicators, &profile.entry_rule, &settings.backtest);

    let snapshot = TickerSnapshot {
        ticker: series.symbol().to_string(),
        score: card.score,
        relative_strength: rs,
        win_rate: backtest.win_rate,
        expectancy: backtest.expectancy,
        trade_count: backtest.trade_count(),
        signal_today: card.signal,
    };

    Ok(Analysis {
        snapshot,
        card,
        backtest,
    })
}

/// Retrieve and analyse one instrument, enforcing the minimum-length preconditions.
pub fn analyze_instrument(
    data_port: &dyn DataPort,
    symbol: &str,
    benchmark: &BarSeries,
    profile: &ScoringProfile,
    settings: &ScanSettings,
) -> Result<Analysis, SwingscanError> {
    let series = data_port.fetch_bars(symbol, settings.primary)?;
    series.require(settings.min_primary_bars)?;

    let higher = if profile.needs_higher_timeframe() {
        let higher = data_port.fetch_bars(symbol, settings.higher)?;
        higher.require(settings.min_higher_bars)?;
        Some(higher)
    } else {
        None
    };

    analyze_series(&series, higher.as_ref(), benchmark, profile, settings)
}

/// Run one scan over `universe` (truncated to `settings.max_instruments`).
///
/// Per-instrument failures are collected in `skipped`; only worker-pool setup
/// and benchmark retrieval fail the whole scan.
pub fn run_scan(
    data_port: &(dyn DataPort + Sync),
    universe: &[String],
    benchmark: Benchmark,
    profile: &ScoringProfile,
    settings: &ScanSettings,
    progress: &(dyn Fn(ScanProgress) + Sync),
) -> Result<ScanOutcome, SwingscanError> {
    let benchmark = match benchmark {
        Benchmark::Series(series) => series,
        Benchmark::Symbol(symbol) => {
            info!(benchmark = %symbol, "fetching benchmark");
            data_port.fetch_bars(&symbol, settings.primary)?
        }
    };
    if benchmark.len() <= settings.rs_lookback {
        warn!(
            benchmark = benchmark.symbol(),
            bars = benchmark.len(),
            "benchmark too short; relative strength will be unavailable"
        );
    }

    let symbols = &universe[..universe.len().min(settings.max_instruments)];
    let total = symbols.len();
    info!(
        instruments = total,
        profile = %profile.name,
        workers = settings.workers,
        "starting scan"
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(settings.workers.max(1))
        .thread_name(|i| format!("scan-worker-{}", i))
        .build()
        .map_err(|e| SwingscanError::WorkerPool {
            reason: e.to_string(),
        })?;

    let done = AtomicUsize::new(0);
    let results: Vec<(String, Result<TickerSnapshot, SkipReason>)> = pool.install(|| {
        symbols
            .par_iter()
            .map(|symbol| {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    analyze_instrument(data_port, symbol, &benchmark, profile, settings)
                }));
                let result = match result {
                    Ok(Ok(analysis)) => Ok(analysis.snapshot),
                    Ok(Err(e)) => {
                        warn!(symbol = %symbol, error = %e, "skipping instrument");
                        Err(SkipReason::from(e))
                    }
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        warn!(symbol = %symbol, panic = %message, "instrument analysis panicked");
                        Err(SkipReason::Failed(message))
                    }
                };
                let done = done.fetch_add(1, Ordering::SeqCst) + 1;
                progress(ScanProgress { done, total });
                (symbol.clone(), result)
            })
            .collect()
    });

    let mut snapshots = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (symbol, result) in results {
        match result {
            Ok(snapshot) => snapshots.push(snapshot),
            Err(reason) => skipped.push(SkippedInstrument { symbol, reason }),
        }
    }
    snapshot::rank(&mut snapshots);

    info!(
        analysed = snapshots.len(),
        skipped = skipped.len(),
        "scan finished"
    );
    Ok(ScanOutcome {
        snapshots,
        skipped,
        total,
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
