//! Bar-by-bar replay of the entry rule with a bracket exit.
//!
//! Every qualifying bar opens an independent simulated trade, even while an
//! earlier trade's forward window is still open. The result estimates
//! P(win | setup); it is not a single-account simulation.

use crate::domain::indicator_set::IndicatorSet;
use crate::domain::ohlcv::BarSeries;
use crate::domain::rule::{BarView, Predicate, RuleContext};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    /// First bar index eligible as an entry; must exceed every indicator warm-up.
    pub warmup: usize,
    /// Forward window: bars entry+1 ..= entry+horizon-1 decide the outcome.
    pub horizon: usize,
    pub reward_unit: f64,
    pub risk_unit: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            warmup: 50,
            horizon: 10,
            reward_unit: 2.0,
            risk_unit: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Win,
    Loss,
    Undecided,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedTrade {
    pub entry_index: usize,
    pub entry_price: f64,
    pub stop_price: f64,
    pub target_price: f64,
    pub outcome: TradeOutcome,
    /// Bar that resolved the trade; `None` when undecided.
    pub exit_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub trades: Vec<SimulatedTrade>,
    pub wins: usize,
    pub losses: usize,
    pub undecided: usize,
    /// Percentage in [0, 100]; `None` when no trade resolved.
    pub win_rate: Option<f64>,
    pub expectancy: Option<f64>,
}

impl BacktestReport {
    fn from_trades(trades: Vec<SimulatedTrade>, config: &BacktestConfig) -> Self {
        let count = |outcome| trades.iter().filter(|t| t.outcome == outcome).count();
        let wins = count(TradeOutcome::Win);
        let losses = count(TradeOutcome::Loss);
        let undecided = count(TradeOutcome::Undecided);

        let total = wins + losses;
        let (win_rate, expectancy) = if total > 0 {
            let win_rate = wins as f64 / total as f64 * 100.0;
            let p = win_rate / 100.0;
            (
                Some(win_rate),
                Some(p * config.reward_unit - (1.0 - p) * config.risk_unit),
            )
        } else {
            (None, None)
        };

        Self {
            trades,
            wins,
            losses,
            undecided,
            win_rate,
            expectancy,
        }
    }

    /// Resolved trades only; undecided setups are not counted.
    pub fn trade_count(&self) -> usize {
        self.wins + self.losses
    }

    /// Every bar where the entry rule held.
    pub fn setups(&self) -> usize {
        self.trades.len()
    }
}

pub fn run_backtest(
    series: &BarSeries,
    indicators: &IndicatorSet,
    entry_rule: &[Predicate],
    config: &BacktestConfig,
) -> BacktestReport {
    let len = series.len();
    let bars = series.bars();
    let mut trades = Vec::new();

    // The last entry is the one whose full forward window still fits.
    let last_entry = match len.checked_sub(config.horizon) {
        Some(last) if last >= config.warmup && config.horizon > 0 => last,
        _ => {
            debug!(
                symbol = series.symbol(),
                bars = len,
                warmup = config.warmup,
                horizon = config.horizon,
                "series too short for backtest"
            );
            return BacktestReport::from_trades(trades, config);
        }
    };

    for i in config.warmup..=last_entry {
        let ctx = RuleContext::primary_only(BarView::at(series, indicators, i));
        if !entry_rule.iter().all(|p| p.evaluate(&ctx)) {
            continue;
        }

        let bar = &bars[i];
        let (Some(ema), Some(target)) = (indicators.ema(i), indicators.bollinger_upper(i)) else {
            debug!(symbol = series.symbol(), index = i, "setup without bracket levels");
            continue;
        };
        let stop = bar.low.min(ema);

        let mut outcome = TradeOutcome::Undecided;
        let mut exit_index = None;
        let window_end = (i + config.horizon).min(len);
        for (j, future) in bars.iter().enumerate().take(window_end).skip(i + 1) {
            if future.low <= stop {
                outcome = TradeOutcome::Loss;
                exit_index = Some(j);
                break;
            }
            if future.high >= target {
                outcome = TradeOutcome::Win;
                exit_index = Some(j);
                break;
            }
        }

        trades.push(SimulatedTrade {
            entry_index: i,
            entry_price: bar.close,
            stop_price: stop,
            target_price: target,
            outcome,
            exit_index,
        });
    }

    BacktestReport::from_trades(trades, config)
}
