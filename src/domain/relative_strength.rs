//! Cross-instrument relative strength against a benchmark.

use crate::domain::error::SwingscanError;
use crate::domain::ohlcv::BarSeries;

pub const DEFAULT_LOOKBACK: usize = 30;

/// close[last] / close[last - n] - 1
pub fn close_return(series: &BarSeries, lookback: usize) -> Result<f64, SwingscanError> {
    series.require(lookback + 1)?;
    let bars = series.bars();
    let last = bars.len() - 1;
    let base = bars[last - lookback].close;
    if base <= 0.0 || !base.is_finite() {
        return Err(SwingscanError::InvalidSeries {
            symbol: series.symbol().to_string(),
            reason: format!("non-positive close {} at lookback base", base),
        });
    }
    Ok(bars[last].close / base - 1.0)
}

/// Instrument's trailing return minus the benchmark's, in percentage points.
pub fn relative_strength(
    instrument: &BarSeries,
    benchmark: &BarSeries,
    lookback: usize,
) -> Result<f64, SwingscanError> {
    let instrument_return = close_return(instrument, lookback)?;
    let benchmark_return = close_return(benchmark, lookback)?;
    Ok((instrument_return - benchmark_return) * 100.0)
}
