//! OHLCV bars, bar series and sampling descriptors.

use crate::domain::error::SwingscanError;
use chrono::{Months, NaiveDateTime, TimeDelta};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Bars for one instrument at one sampling interval, strictly ascending in time.
#[derive(Debug, Clone)]
pub struct BarSeries {
    symbol: String,
    interval: Interval,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        interval: Interval,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, SwingscanError> {
        let symbol = symbol.into();
        if let Some(pos) = bars
            .windows(2)
            .position(|w| w[1].timestamp <= w[0].timestamp)
        {
            return Err(SwingscanError::InvalidSeries {
                reason: format!(
                    "timestamp {} at index {} does not follow {}",
                    bars[pos + 1].timestamp,
                    pos + 1,
                    bars[pos].timestamp
                ),
                symbol,
            });
        }
        Ok(Self {
            symbol,
            interval,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// Fails with `InsufficientData` when fewer than `minimum` bars are present.
    pub fn require(&self, minimum: usize) -> Result<(), SwingscanError> {
        if self.bars.len() < minimum {
            return Err(SwingscanError::InsufficientData {
                symbol: self.symbol.clone(),
                bars: self.bars.len(),
                minimum,
            });
        }
        Ok(())
    }
}

/// How far back a retrieval reaches, e.g. `2y`, `1mo`, `5d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Days(u32),
    Months(u32),
    Years(u32),
    Max,
}

impl Period {
    /// Earliest timestamp covered when the window ends at `anchor`.
    pub fn start_from(&self, anchor: NaiveDateTime) -> Option<NaiveDateTime> {
        match *self {
            Period::Days(n) => anchor.checked_sub_signed(TimeDelta::days(i64::from(n))),
            Period::Months(n) => anchor.checked_sub_months(Months::new(n)),
            Period::Years(n) => anchor.checked_sub_months(Months::new(n.saturating_mul(12))),
            Period::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Days(n) => write!(f, "{}d", n),
            Period::Months(n) => write!(f, "{}mo", n),
            Period::Years(n) => write!(f, "{}y", n),
            Period::Max => write!(f, "max"),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        if s == "max" {
            return Ok(Period::Max);
        }
        let (count, unit) = split_count(&s)?;
        match unit {
            "d" => Ok(Period::Days(count)),
            "mo" => Ok(Period::Months(count)),
            "y" => Ok(Period::Years(count)),
            _ => Err(format!("unknown period unit '{}' in '{}'", unit, s)),
        }
    }
}

/// Sampling interval of a series, e.g. `1d`, `4h`, `30m`, `1wk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Weeks(u32),
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interval::Minutes(n) => write!(f, "{}m", n),
            Interval::Hours(n) => write!(f, "{}h", n),
            Interval::Days(n) => write!(f, "{}d", n),
            Interval::Weeks(n) => write!(f, "{}wk", n),
        }
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let (count, unit) = split_count(&s)?;
        match unit {
            "m" => Ok(Interval::Minutes(count)),
            "h" => Ok(Interval::Hours(count)),
            "d" => Ok(Interval::Days(count)),
            "wk" => Ok(Interval::Weeks(count)),
            _ => Err(format!("unknown interval unit '{}' in '{}'", unit, s)),
        }
    }
}

fn split_count(s: &str) -> Result<(u32, &str), String> {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return Err(format!("missing count in '{}'", s));
    }
    let count: u32 = s[..digits]
        .parse()
        .map_err(|e| format!("invalid count in '{}': {}", s, e))?;
    if count == 0 {
        return Err(format!("count must be positive in '{}'", s));
    }
    Ok((count, &s[digits..]))
}

/// A retrieval request shape: how far back and at what sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeriesRequest {
    pub period: Period,
    pub interval: Interval,
}

impl SeriesRequest {
    pub fn new(period: Period, interval: Interval) -> Self {
        Self { period, interval }
    }

    pub fn daily() -> Self {
        Self::new(Period::Years(2), Interval::Days(1))
    }

    pub fn four_hour() -> Self {
        Self::new(Period::Months(1), Interval::Hours(4))
    }
}

impl fmt::Display for SeriesRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.period, self.interval)
    }
}
