//! Indicator columns cached alongside one bar series for one analysis.

use crate::domain::error::SwingscanError;
use crate::domain::indicator::bollinger::calculate_bollinger_upper;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::calculate_volume_sma;
use crate::domain::indicator::{IndicatorSeries, IndicatorType};
use crate::domain::ohlcv::BarSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorParams {
    pub ema_period: usize,
    pub rsi_period: usize,
    pub volume_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult_x100: u32,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            ema_period: 20,
            rsi_period: 14,
            volume_period: 20,
            bollinger_period: 20,
            bollinger_mult_x100: 200,
        }
    }
}

impl IndicatorParams {
    pub fn indicator_types(&self) -> [IndicatorType; 4] {
        [
            IndicatorType::Ema(self.ema_period),
            IndicatorType::Rsi(self.rsi_period),
            IndicatorType::VolumeSma(self.volume_period),
            IndicatorType::BollingerUpper {
                period: self.bollinger_period,
                stddev_mult_x100: self.bollinger_mult_x100,
            },
        ]
    }

    /// Longest warm-up across all four indicators.
    pub fn max_warmup(&self) -> usize {
        self.indicator_types()
            .iter()
            .map(IndicatorType::warmup)
            .max()
            .unwrap_or(0)
    }

    /// Bars needed before every indicator has at least one defined value.
    pub fn required_bars(&self) -> usize {
        self.max_warmup() + 1
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub ema: IndicatorSeries,
    pub rsi: IndicatorSeries,
    pub volume_sma: IndicatorSeries,
    pub bollinger_upper: IndicatorSeries,
}

impl IndicatorSet {
    pub fn compute(series: &BarSeries, params: &IndicatorParams) -> Result<Self, SwingscanError> {
        series.require(params.required_bars())?;
        let bars = series.bars();
        Ok(Self {
            ema: calculate_ema(bars, params.ema_period),
            rsi: calculate_rsi(bars, params.rsi_period),
            volume_sma: calculate_volume_sma(bars, params.volume_period),
            bollinger_upper: calculate_bollinger_upper(
                bars,
                params.bollinger_period,
                params.bollinger_mult_x100,
            ),
        })
    }

    pub fn len(&self) -> usize {
        self.ema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ema.is_empty()
    }

    pub fn ema(&self, index: usize) -> Option<f64> {
        self.ema.get(index)
    }

    pub fn rsi(&self, index: usize) -> Option<f64> {
        self.rsi.get(index)
    }

    pub fn volume_sma(&self, index: usize) -> Option<f64> {
        self.volume_sma.get(index)
    }

    pub fn bollinger_upper(&self, index: usize) -> Option<f64> {
        self.bollinger_upper.get(index)
    }
}
