//! CLI and configuration integration tests.
//!
//! Tests cover config building, symbol resolution, and full scans over CSV
//! fixtures written to temporary directories.

mod common;

use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use swingscan::adapters::file_config_adapter::FileConfigAdapter;
use swingscan::cli::{self, ScanArgs};
use swingscan::domain::error::SwingscanError;
use swingscan::domain::ohlcv::{Interval, Period};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

fn same_code(actual: ExitCode, expected: ExitCode) -> bool {
    format!("{actual:?}") == format!("{expected:?}")
}

fn write_bars_csv(dir: &Path, file: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for b in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.date(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    fs::write(dir.join(file), content).unwrap();
}

/// Data and universe directories plus a config file pointing at them.
struct Fixture {
    _root: tempfile::TempDir,
    config_path: std::path::PathBuf,
    output: std::path::PathBuf,
}

fn fixture(extra: &str, symbols_with_data: &[&str]) -> Fixture {
    let root = tempfile::TempDir::new().unwrap();
    let data = root.path().join("data");
    let universe = root.path().join("universe");
    fs::create_dir_all(&data).unwrap();
    fs::create_dir_all(&universe).unwrap();

    write_bars_csv(&data, "SPY_1d.csv", &trending_bars(80, 400.0));
    for (i, sym) in symbols_with_data.iter().enumerate() {
        write_bars_csv(
            &data,
            &format!("{}_1d.csv", sym),
            &trending_bars(80, 20.0 + 5.0 * i as f64),
        );
    }
    fs::write(
        universe.join("sp500.csv"),
        "Symbol,Security\nAAA,Alpha\nBRK.B,Berkshire\nCCC,Gamma\n",
    )
    .unwrap();

    let config_path = root.path().join("swingscan.ini");
    let output = root.path().join("ranked.csv");
    let ini = format!(
        "[scan]\nmin_primary_bars = 50\nworkers = 2\n{}\n\n[data]\ndir = {}\n\n[universe]\ndir = {}\n\n[profile]\npreset = daily\n",
        extra,
        data.display(),
        universe.display()
    );
    fs::write(&config_path, ini).unwrap();
    Fixture {
        _root: root,
        config_path,
        output,
    }
}

mod settings {
    use super::*;

    #[test]
    fn defaults_from_empty_config() {
        let settings = cli::build_scan_settings(&config("[scan]\n")).unwrap();
        assert_eq!(settings, swingscan::domain::scan::ScanSettings::default());
    }

    #[test]
    fn custom_values() {
        let settings = cli::build_scan_settings(&config(
            "[scan]\nworkers = 8\nmax_instruments = 25\nprimary_period = 1y\nhigher_interval = 1h\n\
             [indicators]\nema_period = 10\nbollinger_mult = 2.5\n\
             [backtest]\nwarmup = 30\nhorizon = 5\nreward_unit = 3.0\n",
        ))
        .unwrap();
        assert_eq!(settings.workers, 8);
        assert_eq!(settings.max_instruments, 25);
        assert_eq!(settings.primary.period, Period::Years(1));
        assert_eq!(settings.higher.interval, Interval::Hours(1));
        assert_eq!(settings.indicators.ema_period, 10);
        assert_eq!(settings.indicators.bollinger_mult_x100, 250);
        assert_eq!(settings.backtest.warmup, 30);
        assert_eq!(settings.backtest.horizon, 5);
        assert_eq!(settings.backtest.reward_unit, 3.0);
    }

    #[test]
    fn too_few_primary_bars_is_invalid() {
        let err = cli::build_scan_settings(&config("[scan]\nmin_primary_bars = 10\n")).unwrap_err();
        assert!(
            matches!(err, SwingscanError::ConfigInvalid { key, .. } if key == "min_primary_bars")
        );
    }

    #[test]
    fn malformed_interval_is_invalid() {
        let err = cli::build_scan_settings(&config("[scan]\nprimary_interval = daily\n")).unwrap_err();
        assert!(
            matches!(err, SwingscanError::ConfigInvalid { key, .. } if key == "primary_interval")
        );
    }

    #[test]
    fn warmup_inside_indicator_warmup_is_invalid() {
        let err = cli::build_scan_settings(&config("[backtest]\nwarmup = 10\n")).unwrap_err();
        assert!(matches!(err, SwingscanError::ConfigInvalid { key, .. } if key == "warmup"));
    }

    #[test]
    fn negative_bollinger_mult_is_invalid() {
        let err =
            cli::build_indicator_params(&config("[indicators]\nbollinger_mult = -1\n")).unwrap_err();
        assert!(
            matches!(err, SwingscanError::ConfigInvalid { key, .. } if key == "bollinger_mult")
        );
    }

    #[test]
    fn cache_ttl_from_config() {
        let ttl = cli::build_cache_ttl(&config("[data]\ncache_ttl_secs = 60\n")).unwrap();
        assert_eq!(ttl.as_secs(), 60);
        let ttl = cli::build_cache_ttl(&config("[data]\n")).unwrap();
        assert_eq!(ttl.as_secs(), 900);
    }
}

mod symbols {
    use super::*;

    #[test]
    fn override_takes_precedence() {
        let cfg = config("[scan]\nsymbols = AAA,BBB\n");
        let symbols = cli::resolve_symbols(Some("msft, brk.b"), &cfg).unwrap();
        assert_eq!(symbols, Some(vec!["MSFT".to_string(), "BRK-B".to_string()]));
    }

    #[test]
    fn config_symbols_used_without_override() {
        let cfg = config("[scan]\nsymbols = AAA,BBB\n");
        let symbols = cli::resolve_symbols(None, &cfg).unwrap();
        assert_eq!(symbols, Some(vec!["AAA".to_string(), "BBB".to_string()]));
    }

    #[test]
    fn none_without_symbols() {
        assert_eq!(cli::resolve_symbols(None, &config("[scan]\n")).unwrap(), None);
    }

    #[test]
    fn duplicate_symbols_are_invalid() {
        let err = cli::resolve_symbols(Some("AAA,aaa"), &config("[scan]\n")).unwrap_err();
        assert!(matches!(err, SwingscanError::ConfigInvalid { key, .. } if key == "symbols"));
    }

    #[test]
    fn market_defaults_and_overrides() {
        let cfg = config("[scan]\nmarket = NASDAQ 100\n");
        assert_eq!(cli::resolve_market(None, &cfg), "NASDAQ 100");
        assert_eq!(cli::resolve_market(Some("S&P500"), &cfg), "S&P500");
        assert_eq!(cli::resolve_market(None, &config("[scan]\n")), "S&P500");
    }
}

mod commands {
    use super::*;

    #[test]
    fn scan_market_writes_ranked_report() {
        let fx = fixture("", &["AAA", "BRK-B", "CCC"]);
        let code = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            output: Some(fx.output.clone()),
            ..ScanArgs::default()
        })
        .unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));

        let report = fs::read_to_string(&fx.output).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("rank,ticker,profile,score"));
        assert!(lines[1].starts_with("1,"));
        assert!(report.contains("BRK-B"));
    }

    #[test]
    fn scan_skips_missing_data_and_honours_limit() {
        let fx = fixture("", &["AAA"]);
        let code = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            limit: Some(2),
            output: Some(fx.output.clone()),
            ..ScanArgs::default()
        })
        .unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));

        let report = fs::read_to_string(&fx.output).unwrap();
        assert_eq!(report.lines().count(), 2);
        assert!(report.contains("AAA"));
    }

    #[test]
    fn scan_with_no_analysable_instrument_exits_six() {
        let fx = fixture("", &[]);
        let code = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            ..ScanArgs::default()
        })
        .unwrap();
        assert!(same_code(code, ExitCode::from(cli::EXIT_NO_RESULTS)));
    }

    #[test]
    fn explicit_symbols_bypass_universe() {
        let fx = fixture("", &["ZZZ"]);
        let code = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            symbols: Some("zzz".into()),
            output: Some(fx.output.clone()),
            ..ScanArgs::default()
        })
        .unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));
        assert!(fs::read_to_string(&fx.output).unwrap().contains("ZZZ"));
    }

    #[test]
    fn unknown_market_is_universe_error() {
        let fx = fixture("", &["AAA"]);
        let err = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            market: Some("DAX".into()),
            ..ScanArgs::default()
        })
        .unwrap_err();
        assert!(matches!(err, SwingscanError::UniverseUnavailable { .. }));
    }

    #[test]
    fn missing_benchmark_aborts_scan() {
        let fx = fixture("benchmark = QQQ", &["AAA"]);
        let err = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            ..ScanArgs::default()
        })
        .unwrap_err();
        assert!(matches!(err, SwingscanError::Fetch { symbol, .. } if symbol == "QQQ"));
    }

    #[test]
    fn unknown_profile_is_config_error() {
        let fx = fixture("", &["AAA"]);
        let err = cli::run_scan_command(&ScanArgs {
            config: fx.config_path.clone(),
            profile: Some("scalp".into()),
            ..ScanArgs::default()
        })
        .unwrap_err();
        let code = ExitCode::from(&err);
        assert!(same_code(code, ExitCode::from(2)));
    }

    #[test]
    fn backtest_single_symbol() {
        let fx = fixture("", &["AAA"]);
        let code = cli::run_backtest_command(&fx.config_path, "AAA", None).unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn backtest_missing_symbol_is_fetch_error() {
        let fx = fixture("", &[]);
        let err = cli::run_backtest_command(&fx.config_path, "NOPE", None).unwrap_err();
        assert!(matches!(err, SwingscanError::Fetch { .. }));
    }

    #[test]
    fn validate_accepts_fixture_config() {
        let fx = fixture("", &[]);
        let code = cli::run_validate(&fx.config_path).unwrap();
        assert!(same_code(code, ExitCode::SUCCESS));
    }

    #[test]
    fn validate_rejects_missing_data_dir() {
        let file = write_temp_ini("[scan]\nmarket = S&P500\n[universe]\ndir = /tmp\n");
        let err = cli::run_validate(file.path()).unwrap_err();
        assert!(matches!(err, SwingscanError::ConfigMissing { section, .. } if section == "data"));
    }

    #[test]
    fn validate_missing_file_is_parse_error() {
        let err = cli::run_validate(Path::new("/nonexistent/swingscan.ini")).unwrap_err();
        assert!(matches!(err, SwingscanError::ConfigParse { .. }));
    }
}

mod presentation {
    use super::*;
    use swingscan::domain::backtest::BacktestReport;
    use swingscan::domain::profile::ScoringProfile;
    use swingscan::domain::snapshot::TickerSnapshot;

    #[test]
    fn table_rounds_and_labels_signal() {
        let snaps = vec![
            TickerSnapshot {
                ticker: "NVDA".into(),
                score: 85,
                relative_strength: Some(12.3456),
                win_rate: Some(66.666),
                expectancy: Some(1.0),
                trade_count: 9,
                signal_today: true,
            },
            TickerSnapshot {
                ticker: "T".into(),
                score: 0,
                relative_strength: None,
                win_rate: None,
                expectancy: None,
                trade_count: 0,
                signal_today: false,
            },
        ];
        let table = cli::format_table(&snaps);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("12.35"));
        assert!(lines[1].contains("66.67"));
        assert!(lines[1].ends_with("YES"));
        assert!(lines[2].ends_with("no"));
        assert!(lines[2].contains(" - "));
    }

    #[test]
    fn profiles_listing_names_both_presets() {
        let text = cli::describe_profiles();
        assert!(text.contains("swing (max score 90)"));
        assert!(text.contains("daily (max score 100)"));
        assert!(text.contains("score > 70"));
    }

    #[test]
    fn backtest_summary_without_trades() {
        let report = BacktestReport {
            trades: vec![],
            wins: 0,
            losses: 0,
            undecided: 0,
            win_rate: None,
            expectancy: None,
        };
        let text = cli::format_backtest("AAA", &ScoringProfile::daily(), &report);
        assert!(text.contains("=== AAA (daily entry rule) ==="));
        assert!(text.contains("Win Rate:    -"));
    }
}
