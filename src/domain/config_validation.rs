//! Configuration validation.
//!
//! Runs before any instrument is processed so a bad config fails the whole
//! scan up front instead of surfacing as per-instrument skips.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SwingscanError;
use crate::domain::indicator_set::IndicatorParams;
use crate::domain::scan::{MIN_PRIMARY_BARS, ScanSettings};
use crate::ports::config_port::ConfigPort;

pub fn validate_scan_settings(settings: &ScanSettings) -> Result<(), SwingscanError> {
    validate_indicator_params(&settings.indicators)?;
    validate_backtest_config(&settings.backtest, &settings.indicators)?;

    if settings.workers < 1 {
        return Err(invalid("scan", "workers", "workers must be at least 1"));
    }
    if settings.max_instruments < 1 {
        return Err(invalid(
            "scan",
            "max_instruments",
            "max_instruments must be at least 1",
        ));
    }
    if settings.rs_lookback < 1 {
        return Err(invalid("scan", "rs_lookback", "rs_lookback must be at least 1"));
    }

    let primary_floor = MIN_PRIMARY_BARS.max(settings.indicators.required_bars());
    if settings.min_primary_bars < primary_floor {
        return Err(invalid(
            "scan",
            "min_primary_bars",
            &format!("min_primary_bars must be at least {}", primary_floor),
        ));
    }
    let higher_floor = settings.indicators.required_bars();
    if settings.min_higher_bars < higher_floor {
        return Err(invalid(
            "scan",
            "min_higher_bars",
            &format!("min_higher_bars must be at least {}", higher_floor),
        ));
    }
    Ok(())
}

pub fn validate_indicator_params(params: &IndicatorParams) -> Result<(), SwingscanError> {
    let periods = [
        ("ema_period", params.ema_period),
        ("rsi_period", params.rsi_period),
        ("volume_period", params.volume_period),
        ("bollinger_period", params.bollinger_period),
    ];
    for (key, value) in periods {
        if value < 1 {
            return Err(invalid(
                "indicators",
                key,
                &format!("{} must be positive", key),
            ));
        }
    }
    if params.bollinger_mult_x100 == 0 {
        return Err(invalid(
            "indicators",
            "bollinger_mult",
            "bollinger_mult must be positive",
        ));
    }
    Ok(())
}

pub fn validate_backtest_config(
    config: &BacktestConfig,
    params: &IndicatorParams,
) -> Result<(), SwingscanError> {
    let max_warmup = params.max_warmup();
    if config.warmup <= max_warmup {
        return Err(invalid(
            "backtest",
            "warmup",
            &format!(
                "warmup {} must exceed the longest indicator warm-up ({})",
                config.warmup, max_warmup
            ),
        ));
    }
    if config.horizon < 2 {
        return Err(invalid("backtest", "horizon", "horizon must be at least 2"));
    }
    if !(config.reward_unit > 0.0) {
        return Err(invalid(
            "backtest",
            "reward_unit",
            "reward_unit must be positive",
        ));
    }
    if !(config.risk_unit > 0.0) {
        return Err(invalid("backtest", "risk_unit", "risk_unit must be positive"));
    }
    Ok(())
}

/// Data and universe locations needed by a scan.
pub fn validate_sources(config: &dyn ConfigPort, needs_universe: bool) -> Result<(), SwingscanError> {
    require_non_empty(config, "data", "dir")?;
    if needs_universe {
        require_non_empty(config, "universe", "dir")?;
    }
    Ok(())
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), SwingscanError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(SwingscanError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> SwingscanError {
    SwingscanError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn assert_invalid_key(result: Result<(), SwingscanError>, expected: &str) {
        let err = result.unwrap_err();
        assert!(
            matches!(&err, SwingscanError::ConfigInvalid { key, .. } if key == expected),
            "expected ConfigInvalid for {}, got {:?}",
            expected,
            err
        );
    }

    #[test]
    fn default_settings_pass() {
        assert!(validate_scan_settings(&ScanSettings::default()).is_ok());
    }

    #[test]
    fn zero_workers_fails() {
        let settings = ScanSettings {
            workers: 0,
            ..ScanSettings::default()
        };
        assert_invalid_key(validate_scan_settings(&settings), "workers");
    }

    #[test]
    fn min_primary_bars_below_floor_fails() {
        let settings = ScanSettings {
            min_primary_bars: 49,
            ..ScanSettings::default()
        };
        assert_invalid_key(validate_scan_settings(&settings), "min_primary_bars");

        let settings = ScanSettings {
            min_primary_bars: 50,
            ..ScanSettings::default()
        };
        assert!(validate_scan_settings(&settings).is_ok());
    }

    #[test]
    fn min_higher_bars_must_cover_indicators() {
        let settings = ScanSettings {
            min_higher_bars: 10,
            ..ScanSettings::default()
        };
        assert_invalid_key(validate_scan_settings(&settings), "min_higher_bars");
    }

    #[test]
    fn zero_period_fails() {
        let params = IndicatorParams {
            rsi_period: 0,
            ..IndicatorParams::default()
        };
        assert_invalid_key(validate_indicator_params(&params), "rsi_period");
    }

    #[test]
    fn zero_bollinger_mult_fails() {
        let params = IndicatorParams {
            bollinger_mult_x100: 0,
            ..IndicatorParams::default()
        };
        assert_invalid_key(validate_indicator_params(&params), "bollinger_mult");
    }

    #[test]
    fn warmup_must_exceed_indicator_warmup() {
        let params = IndicatorParams::default();
        let config = BacktestConfig {
            warmup: 19,
            ..BacktestConfig::default()
        };
        assert_invalid_key(validate_backtest_config(&config, &params), "warmup");

        let config = BacktestConfig {
            warmup: 20,
            ..BacktestConfig::default()
        };
        assert!(validate_backtest_config(&config, &params).is_ok());
    }

    #[test]
    fn warmup_tracks_longer_periods() {
        let params = IndicatorParams {
            ema_period: 60,
            ..IndicatorParams::default()
        };
        let config = BacktestConfig::default();
        assert_invalid_key(validate_backtest_config(&config, &params), "warmup");
    }

    #[test]
    fn horizon_below_two_fails() {
        let config = BacktestConfig {
            horizon: 1,
            ..BacktestConfig::default()
        };
        assert_invalid_key(
            validate_backtest_config(&config, &IndicatorParams::default()),
            "horizon",
        );
    }

    #[test]
    fn non_positive_units_fail() {
        let params = IndicatorParams::default();
        let config = BacktestConfig {
            reward_unit: 0.0,
            ..BacktestConfig::default()
        };
        assert_invalid_key(validate_backtest_config(&config, &params), "reward_unit");

        let config = BacktestConfig {
            risk_unit: f64::NAN,
            ..BacktestConfig::default()
        };
        assert_invalid_key(validate_backtest_config(&config, &params), "risk_unit");
    }

    #[test]
    fn sources_require_data_dir() {
        let config = make_config("[universe]\ndir = /tmp/u\n");
        let err = validate_sources(&config, true).unwrap_err();
        assert!(matches!(err, SwingscanError::ConfigMissing { key, .. } if key == "dir"));
    }

    #[test]
    fn universe_dir_only_needed_for_markets() {
        let config = make_config("[data]\ndir = /tmp/d\n");
        assert!(validate_sources(&config, false).is_ok());
        let err = validate_sources(&config, true).unwrap_err();
        assert!(
            matches!(err, SwingscanError::ConfigMissing { section, .. } if section == "universe")
        );
    }

    #[test]
    fn blank_data_dir_is_missing() {
        let config = make_config("[data]\ndir =   \n");
        assert!(validate_sources(&config, false).is_err());
    }
}
