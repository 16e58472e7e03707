//! Setup predicates and the bar context they are evaluated against.
//!
//! A predicate reads the bar at `index` (and `index - 1` where it needs a
//! prior value). Any undefined indicator value makes the predicate false.

use crate::domain::indicator_set::IndicatorSet;
use crate::domain::ohlcv::{BarSeries, OhlcvBar};
use std::fmt;

/// One bar of a series together with its indicator columns.
#[derive(Debug, Clone, Copy)]
pub struct BarView<'a> {
    pub series: &'a BarSeries,
    pub indicators: &'a IndicatorSet,
    pub index: usize,
}

impl<'a> BarView<'a> {
    pub fn at(series: &'a BarSeries, indicators: &'a IndicatorSet, index: usize) -> Self {
        Self {
            series,
            indicators,
            index,
        }
    }

    /// View of the last bar, `None` for an empty series.
    pub fn latest(series: &'a BarSeries, indicators: &'a IndicatorSet) -> Option<Self> {
        series
            .len()
            .checked_sub(1)
            .map(|index| Self::at(series, indicators, index))
    }

    pub fn bar(&self) -> Option<&'a OhlcvBar> {
        self.series.bars().get(self.index)
    }

    fn prior_index(&self) -> Option<usize> {
        self.index.checked_sub(1)
    }
}

/// Everything a predicate may look at for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub primary: BarView<'a>,
    pub relative_strength: Option<f64>,
    pub higher: Option<BarView<'a>>,
}

impl<'a> RuleContext<'a> {
    /// Context carrying only the primary timeframe, as used by the backtest.
    pub fn primary_only(primary: BarView<'a>) -> Self {
        Self {
            primary,
            relative_strength: None,
            higher: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// close > EMA
    Trend,
    /// |low - EMA| / EMA < tolerance
    Pullback { tolerance: f64 },
    /// RSI rising from the prior bar, optionally only from below `prior_ceiling`.
    MomentumTurn { prior_ceiling: Option<f64> },
    /// volume > volume SMA
    VolumeConfirmation,
    /// relative strength > floor
    RelativeStrength { floor: f64 },
    /// Higher timeframe latest bar: close > EMA and RSI > rsi_floor.
    HigherTimeframe { rsi_floor: f64 },
}

impl Predicate {
    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> bool {
        match self {
            Predicate::Trend => trend(&ctx.primary),
            Predicate::Pullback { tolerance } => pullback(&ctx.primary, *tolerance),
            Predicate::MomentumTurn { prior_ceiling } => {
                momentum_turn(&ctx.primary, *prior_ceiling)
            }
            Predicate::VolumeConfirmation => volume_confirmation(&ctx.primary),
            Predicate::RelativeStrength { floor } => {
                ctx.relative_strength.is_some_and(|rs| rs > *floor)
            }
            Predicate::HigherTimeframe { rsi_floor } => ctx
                .higher
                .as_ref()
                .is_some_and(|view| higher_timeframe(view, *rsi_floor)),
        }
    }

    /// Whether the predicate reads only the primary series.
    pub fn is_primary(&self) -> bool {
        !matches!(
            self,
            Predicate::RelativeStrength { .. } | Predicate::HigherTimeframe { .. }
        )
    }

    pub fn needs_higher_timeframe(&self) -> bool {
        matches!(self, Predicate::HigherTimeframe { .. })
    }

    /// Stable key used in config files.
    pub fn key(&self) -> &'static str {
        match self {
            Predicate::Trend => "trend",
            Predicate::Pullback { .. } => "pullback",
            Predicate::MomentumTurn { .. } => "momentum",
            Predicate::VolumeConfirmation => "volume",
            Predicate::RelativeStrength { .. } => "relative_strength",
            Predicate::HigherTimeframe { .. } => "higher_timeframe",
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Trend => write!(f, "close > EMA"),
            Predicate::Pullback { tolerance } => {
                write!(f, "|low - EMA| / EMA < {}", tolerance)
            }
            Predicate::MomentumTurn {
                prior_ceiling: Some(ceiling),
            } => write!(f, "RSI rising from below {}", ceiling),
            Predicate::MomentumTurn {
                prior_ceiling: None,
            } => write!(f, "RSI rising"),
            Predicate::VolumeConfirmation => write!(f, "volume > volume SMA"),
            Predicate::RelativeStrength { floor } => write!(f, "relative strength > {}", floor),
            Predicate::HigherTimeframe { rsi_floor } => {
                write!(f, "higher timeframe close > EMA and RSI > {}", rsi_floor)
            }
        }
    }
}

fn trend(view: &BarView<'_>) -> bool {
    match (view.bar(), view.indicators.ema(view.index)) {
        (Some(bar), Some(ema)) => bar.close > ema,
        _ => false,
    }
}

fn pullback(view: &BarView<'_>, tolerance: f64) -> bool {
    match (view.bar(), view.indicators.ema(view.index)) {
        (Some(bar), Some(ema)) if ema != 0.0 => ((bar.low - ema) / ema).abs() < tolerance,
        _ => false,
    }
}

fn momentum_turn(view: &BarView<'_>, prior_ceiling: Option<f64>) -> bool {
    let Some(prior) = view.prior_index() else {
        return false;
    };
    match (view.indicators.rsi(view.index), view.indicators.rsi(prior)) {
        (Some(rsi), Some(prior_rsi)) => {
            rsi > prior_rsi && prior_ceiling.is_none_or(|ceiling| prior_rsi < ceiling)
        }
        _ => false,
    }
}

fn volume_confirmation(view: &BarView<'_>) -> bool {
    match (view.bar(), view.indicators.volume_sma(view.index)) {
        (Some(bar), Some(average)) => bar.volume as f64 > average,
        _ => false,
    }
}

fn higher_timeframe(view: &BarView<'_>, rsi_floor: f64) -> bool {
    match (
        view.bar(),
        view.indicators.ema(view.index),
        view.indicators.rsi(view.index),
    ) {
        (Some(bar), Some(ema), Some(rsi)) => bar.close > ema && rsi > rsi_floor,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::IndicatorSeries;
    use crate::domain::indicator::IndicatorType;
    use crate::domain::indicator::test_bars::make_bars;
    use crate::domain::ohlcv::Interval;

    fn column(indicator_type: IndicatorType, values: Vec<Option<f64>>) -> IndicatorSeries {
        IndicatorSeries {
            indicator_type,
            values,
        }
    }

    /// Two bars with hand-set indicator columns.
    fn fixture(
        close: f64,
        low: f64,
        volume: i64,
        ema: Option<f64>,
        rsi: [Option<f64>; 2],
        volume_sma: Option<f64>,
    ) -> (BarSeries, IndicatorSet) {
        let mut bars = make_bars(&[close, close]);
        bars[1].low = low;
        bars[1].volume = volume;
        let series = BarSeries::new("TEST", Interval::Days(1), bars).unwrap();
        let set = IndicatorSet {
            ema: column(IndicatorType::Ema(20), vec![None, ema]),
            rsi: column(IndicatorType::Rsi(14), rsi.to_vec()),
            volume_sma: column(IndicatorType::VolumeSma(20), vec![None, volume_sma]),
            bollinger_upper: column(
                IndicatorType::BollingerUpper {
                    period: 20,
                    stddev_mult_x100: 200,
                },
                vec![None, None],
            ),
        };
        (series, set)
    }

    fn eval(predicate: &Predicate, series: &BarSeries, set: &IndicatorSet) -> bool {
        let ctx = RuleContext::primary_only(BarView::latest(series, set).unwrap());
        predicate.evaluate(&ctx)
    }

    #[test]
    fn trend_requires_close_above_ema() {
        let (s, set) = fixture(101.0, 100.0, 1000, Some(100.0), [None, None], None);
        assert!(eval(&Predicate::Trend, &s, &set));
        let (s, set) = fixture(99.0, 98.0, 1000, Some(100.0), [None, None], None);
        assert!(!eval(&Predicate::Trend, &s, &set));
    }

    #[test]
    fn undefined_ema_is_false() {
        let (s, set) = fixture(101.0, 100.0, 1000, None, [None, None], None);
        assert!(!eval(&Predicate::Trend, &s, &set));
        assert!(!eval(&Predicate::Pullback { tolerance: 0.01 }, &s, &set));
    }

    #[test]
    fn pullback_within_tolerance() {
        let p = Predicate::Pullback { tolerance: 0.01 };
        let (s, set) = fixture(102.0, 100.5, 1000, Some(100.0), [None, None], None);
        assert!(eval(&p, &s, &set));
        let (s, set) = fixture(102.0, 101.5, 1000, Some(100.0), [None, None], None);
        assert!(!eval(&p, &s, &set));
        let (s, set) = fixture(102.0, 99.5, 1000, Some(100.0), [None, None], None);
        assert!(eval(&p, &s, &set));
    }

    #[test]
    fn momentum_turn_with_and_without_ceiling() {
        let gated = Predicate::MomentumTurn {
            prior_ceiling: Some(50.0),
        };
        let ungated = Predicate::MomentumTurn {
            prior_ceiling: None,
        };

        let (s, set) = fixture(1.0, 1.0, 1, None, [Some(45.0), Some(48.0)], None);
        assert!(eval(&gated, &s, &set));
        assert!(eval(&ungated, &s, &set));

        let (s, set) = fixture(1.0, 1.0, 1, None, [Some(55.0), Some(60.0)], None);
        assert!(!eval(&gated, &s, &set));
        assert!(eval(&ungated, &s, &set));

        let (s, set) = fixture(1.0, 1.0, 1, None, [Some(45.0), Some(44.0)], None);
        assert!(!eval(&ungated, &s, &set));

        let (s, set) = fixture(1.0, 1.0, 1, None, [None, Some(60.0)], None);
        assert!(!eval(&ungated, &s, &set));
    }

    #[test]
    fn momentum_turn_at_first_bar_is_false() {
        let (s, set) = fixture(1.0, 1.0, 1, None, [Some(40.0), Some(45.0)], None);
        let view = BarView::at(&s, &set, 0);
        let p = Predicate::MomentumTurn {
            prior_ceiling: None,
        };
        assert!(!p.evaluate(&RuleContext::primary_only(view)));
    }

    #[test]
    fn volume_confirmation_strictly_above_average() {
        let (s, set) = fixture(1.0, 1.0, 1500, None, [None, None], Some(1000.0));
        assert!(eval(&Predicate::VolumeConfirmation, &s, &set));
        let (s, set) = fixture(1.0, 1.0, 1000, None, [None, None], Some(1000.0));
        assert!(!eval(&Predicate::VolumeConfirmation, &s, &set));
        let (s, set) = fixture(1.0, 1.0, 1500, None, [None, None], None);
        assert!(!eval(&Predicate::VolumeConfirmation, &s, &set));
    }

    #[test]
    fn relative_strength_needs_a_value() {
        let (s, set) = fixture(1.0, 1.0, 1, None, [None, None], None);
        let view = BarView::latest(&s, &set).unwrap();
        let p = Predicate::RelativeStrength { floor: 0.0 };

        let mut ctx = RuleContext::primary_only(view);
        assert!(!p.evaluate(&ctx));
        ctx.relative_strength = Some(2.5);
        assert!(p.evaluate(&ctx));
        ctx.relative_strength = Some(-0.1);
        assert!(!p.evaluate(&ctx));
    }

    #[test]
    fn higher_timeframe_reads_higher_view() {
        let (primary, primary_set) = fixture(1.0, 1.0, 1, None, [None, None], None);
        let (higher, higher_set) =
            fixture(105.0, 104.0, 1, Some(100.0), [Some(50.0), Some(55.0)], None);
        let p = Predicate::HigherTimeframe { rsi_floor: 50.0 };

        let mut ctx = RuleContext::primary_only(BarView::latest(&primary, &primary_set).unwrap());
        assert!(!p.evaluate(&ctx));
        ctx.higher = BarView::latest(&higher, &higher_set);
        assert!(p.evaluate(&ctx));

        let (higher, higher_set) =
            fixture(105.0, 104.0, 1, Some(100.0), [Some(50.0), Some(50.0)], None);
        ctx.higher = BarView::latest(&higher, &higher_set);
        assert!(!p.evaluate(&ctx));
    }

    #[test]
    fn primary_classification() {
        assert!(Predicate::Trend.is_primary());
        assert!(Predicate::VolumeConfirmation.is_primary());
        assert!(!Predicate::RelativeStrength { floor: 0.0 }.is_primary());
        assert!(!Predicate::HigherTimeframe { rsi_floor: 50.0 }.is_primary());
        assert!(Predicate::HigherTimeframe { rsi_floor: 50.0 }.needs_higher_timeframe());
    }
}
