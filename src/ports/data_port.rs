//! Market-data retrieval port.

use crate::domain::error::SwingscanError;
use crate::domain::ohlcv::{BarSeries, SeriesRequest};

pub trait DataPort {
    /// Bars for `symbol` covering `request.period` at `request.interval`.
    ///
    /// Retrieval problems (network, unknown symbol, throttling, timeouts)
    /// surface as `SwingscanError::Fetch`.
    fn fetch_bars(&self, symbol: &str, request: SeriesRequest)
    -> Result<BarSeries, SwingscanError>;
}
