//! Ranked scan table written as CSV.

use crate::domain::error::SwingscanError;
use crate::domain::profile::ScoringProfile;
use crate::domain::scan::ScanOutcome;
use crate::domain::snapshot::TickerSnapshot;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::Path;

pub struct CsvReportAdapter;

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    rank: usize,
    ticker: &'a str,
    profile: &'a str,
    score: u32,
    relative_strength: Option<f64>,
    win_rate: Option<f64>,
    expectancy: Option<f64>,
    trades: usize,
    signal: &'static str,
}

impl<'a> ReportRow<'a> {
    fn new(rank: usize, snapshot: &'a TickerSnapshot, profile: &'a str) -> Self {
        Self {
            rank,
            ticker: &snapshot.ticker,
            profile,
            score: snapshot.score,
            relative_strength: snapshot.relative_strength.map(round2),
            win_rate: snapshot.win_rate.map(round2),
            expectancy: snapshot.expectancy.map(round2),
            trades: snapshot.trade_count,
            signal: signal_label(snapshot.signal_today),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn signal_label(signal: bool) -> &'static str {
    if signal { "YES" } else { "no" }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        outcome: &ScanOutcome,
        profile: &ScoringProfile,
        output_path: &Path,
    ) -> Result<(), SwingscanError> {
        let report_err = |e: csv::Error| SwingscanError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        };

        let mut writer = csv::Writer::from_path(output_path).map_err(report_err)?;
        for (i, snapshot) in outcome.snapshots.iter().enumerate() {
            writer
                .serialize(ReportRow::new(i + 1, snapshot, &profile.name))
                .map_err(report_err)?;
        }
        writer.flush()?;
        Ok(())
    }
}
