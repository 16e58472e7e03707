//! Per-instrument scan result and ranking.

use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSnapshot {
    pub ticker: String,
    pub score: u32,
    /// Percentage points over the benchmark; `None` if it could not be computed.
    pub relative_strength: Option<f64>,
    pub win_rate: Option<f64>,
    pub expectancy: Option<f64>,
    pub trade_count: usize,
    pub signal_today: bool,
}

/// Descending by score, then by win rate. Missing win rates rank last.
pub fn compare_rank(a: &TickerSnapshot, b: &TickerSnapshot) -> Ordering {
    let win_rate = |s: &TickerSnapshot| s.win_rate.unwrap_or(f64::NEG_INFINITY);
    b.score
        .cmp(&a.score)
        .then_with(|| win_rate(b).total_cmp(&win_rate(a)))
}

/// Stable sort, so equal snapshots keep universe order.
pub fn rank(snapshots: &mut [TickerSnapshot]) {
    snapshots.sort_by(compare_rank);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(ticker: &str, score: u32, win_rate: Option<f64>) -> TickerSnapshot {
        TickerSnapshot {
            ticker: ticker.into(),
            score,
            relative_strength: Some(0.0),
            win_rate,
            expectancy: None,
            trade_count: 0,
            signal_today: false,
        }
    }

    fn tickers(snapshots: &[TickerSnapshot]) -> Vec<&str> {
        snapshots.iter().map(|s| s.ticker.as_str()).collect()
    }

    #[test]
    fn ranks_by_score_then_win_rate() {
        let mut snaps = vec![
            snap("A", 50, Some(80.0)),
            snap("B", 70, Some(40.0)),
            snap("C", 70, Some(60.0)),
            snap("D", 20, Some(100.0)),
        ];
        rank(&mut snaps);
        assert_eq!(tickers(&snaps), vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn missing_win_rate_ranks_after_present() {
        let mut snaps = vec![snap("A", 60, None), snap("B", 60, Some(0.0))];
        rank(&mut snaps);
        assert_eq!(tickers(&snaps), vec!["B", "A"]);
    }

    #[test]
    fn ties_keep_input_order() {
        let mut snaps = vec![
            snap("X", 40, Some(50.0)),
            snap("Y", 40, Some(50.0)),
            snap("Z", 40, None),
            snap("W", 40, None),
        ];
        rank(&mut snaps);
        assert_eq!(tickers(&snaps), vec!["X", "Y", "Z", "W"]);
    }
}
