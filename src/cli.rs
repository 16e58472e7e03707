//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::adapters::cache::{CachedDataPort, CachedUniversePort, DEFAULT_TTL};
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report::{CsvReportAdapter, round2, signal_label};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::universe_adapter::CsvUniverseAdapter;
use crate::domain::backtest::{BacktestConfig, BacktestReport, TradeOutcome, run_backtest};
use crate::domain::config_validation::{validate_scan_settings, validate_sources};
use crate::domain::error::SwingscanError;
use crate::domain::indicator_set::{IndicatorParams, IndicatorSet};
use crate::domain::ohlcv::{Interval, Period, SeriesRequest};
use crate::domain::profile::{PRESET_NAMES, ScoringProfile, SignalGate};
use crate::domain::scan::{self, Benchmark, ScanOutcome, ScanProgress, ScanSettings, SkipReason};
use crate::domain::snapshot::TickerSnapshot;
use crate::domain::universe::{normalize_symbol, parse_symbols};
use crate::ports::config_port::{ConfigPort, get_parsed};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::universe_port::UniversePort;

/// Exit status for a scan that finished without a single analysable instrument.
pub const EXIT_NO_RESULTS: u8 = 6;

pub const DEFAULT_MARKET: &str = "S&P500";
pub const DEFAULT_BENCHMARK: &str = "SPY";

#[derive(Parser, Debug)]
#[command(name = "swingscan", about = "Swing-trade setup scanner")]
pub struct Cli {
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a market and rank instruments by setup score
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Market name, e.g. "S&P500" or "NASDAQ 100"
        #[arg(long)]
        market: Option<String>,
        /// Comma separated symbols; replaces the market universe
        #[arg(long)]
        symbols: Option<String>,
        /// Scoring preset (swing, daily)
        #[arg(short, long)]
        profile: Option<String>,
        /// Maximum instruments to scan
        #[arg(long)]
        limit: Option<usize>,
        /// Write the ranked table to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Backtest the entry rule on one symbol
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(short, long)]
        profile: Option<String>,
    },
    /// Validate a configuration file without scanning
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List scoring presets and their rules
    Profiles,
    /// List markets with a reference table
    Markets {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            market,
            symbols,
            profile,
            limit,
            output,
        } => run_scan_command(&ScanArgs {
            config,
            market,
            symbols,
            profile,
            limit,
            output,
        }),
        Command::Backtest {
            config,
            symbol,
            profile,
        } => run_backtest_command(&config, &symbol, profile.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::Profiles => {
            print!("{}", describe_profiles());
            Ok(ExitCode::SUCCESS)
        }
        Command::Markets { config } => run_markets(&config),
    };

    result.unwrap_or_else(|e| {
        error!("{e}");
        ExitCode::from(&e)
    })
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SwingscanError> {
    FileConfigAdapter::from_file(path).map_err(|e| SwingscanError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug, Default)]
pub struct ScanArgs {
    pub config: PathBuf,
    pub market: Option<String>,
    pub symbols: Option<String>,
    pub profile: Option<String>,
    pub limit: Option<usize>,
    pub output: Option<PathBuf>,
}

pub fn run_scan_command(args: &ScanArgs) -> Result<ExitCode, SwingscanError> {
    // Stage 1: config, settings and profile
    info!(config = %args.config.display(), "loading config");
    let config = load_config(&args.config)?;
    let mut settings = build_scan_settings(&config)?;
    if let Some(limit) = args.limit {
        if limit == 0 {
            return Err(SwingscanError::ConfigInvalid {
                section: "scan".into(),
                key: "max_instruments".into(),
                reason: "--limit must be at least 1".into(),
            });
        }
        settings.max_instruments = limit;
    }
    let profile = ScoringProfile::from_config(&config, args.profile.as_deref())?;
    let explicit = resolve_symbols(args.symbols.as_deref(), &config)?;
    validate_sources(&config, explicit.is_none())?;

    // Stage 2: universe
    let ttl = build_cache_ttl(&config)?;
    let (label, universe) = match explicit {
        Some(symbols) => ("custom".to_string(), symbols),
        None => {
            let market = resolve_market(args.market.as_deref(), &config);
            let port = CachedUniversePort::new(universe_adapter(&config)?, ttl);
            let symbols = port.resolve_universe(&market)?;
            (market, symbols)
        }
    };
    info!(
        market = %label,
        instruments = universe.len(),
        limit = settings.max_instruments,
        "resolved universe"
    );

    // Stage 3: scan
    let data_port = CachedDataPort::new(data_adapter(&config)?, ttl);
    let benchmark = config
        .get_string("scan", "benchmark")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BENCHMARK.to_string());
    let progress = |p: ScanProgress| {
        if p.done % 10 == 0 || p.done == p.total {
            info!(done = p.done, total = p.total, "scan progress");
        } else {
            debug!(done = p.done, total = p.total, "scan progress");
        }
    };
    let outcome = scan::run_scan(
        &data_port,
        &universe,
        Benchmark::Symbol(normalize_symbol(&benchmark)),
        &profile,
        &settings,
        &progress,
    )?;

    // Stage 4: present
    for skipped in &outcome.skipped {
        debug!(symbol = %skipped.symbol, reason = %describe_skip(&skipped.reason), "skipped");
    }
    if !outcome.skipped.is_empty() {
        warn!(
            skipped = outcome.skipped.len(),
            total = outcome.total,
            "some instruments could not be analysed"
        );
    }

    if !outcome.has_results() {
        error!("no instruments could be analysed");
        return Ok(ExitCode::from(EXIT_NO_RESULTS));
    }
    print!("{}", format_table(&outcome.snapshots));
    info!("{}", summarize(&outcome));

    let output = args.output.clone().or_else(|| {
        config
            .get_string("report", "output")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
    });
    if let Some(path) = output {
        CsvReportAdapter.write(&outcome, &profile, &path)?;
        info!(path = %path.display(), "report written");
    }

    Ok(ExitCode::SUCCESS)
}

pub fn run_backtest_command(
    config_path: &Path,
    symbol: &str,
    profile_override: Option<&str>,
) -> Result<ExitCode, SwingscanError> {
    let config = load_config(config_path)?;
    let settings = build_scan_settings(&config)?;
    let profile = ScoringProfile::from_config(&config, profile_override)?;
    validate_sources(&config, false)?;

    let data_port = data_adapter(&config)?;
    let series = data_port.fetch_bars(symbol, settings.primary)?;
    series.require(settings.min_primary_bars)?;
    let indicators = IndicatorSet::compute(&series, &settings.indicators)?;
    let report = run_backtest(&series, &indicators, &profile.entry_rule, &settings.backtest);

    info!(
        symbol = series.symbol(),
        bars = series.len(),
        setups = report.setups(),
        "backtest finished"
    );
    print!("{}", format_backtest(series.symbol(), &profile, &report));
    Ok(ExitCode::SUCCESS)
}

pub fn run_validate(config_path: &Path) -> Result<ExitCode, SwingscanError> {
    let config = load_config(config_path)?;
    let settings = build_scan_settings(&config)?;
    let profile = ScoringProfile::from_config(&config, None)?;
    let explicit = resolve_symbols(None, &config)?;
    validate_sources(&config, explicit.is_none())?;
    build_cache_ttl(&config)?;

    println!(
        "{}: OK (profile {}, max score {}, {} instruments at most, {} workers)",
        config_path.display(),
        profile.name,
        profile.total_weight(),
        settings.max_instruments,
        settings.workers
    );
    Ok(ExitCode::SUCCESS)
}

fn run_markets(config_path: &Path) -> Result<ExitCode, SwingscanError> {
    let config = load_config(config_path)?;
    validate_sources(&config, true)?;
    for market in universe_adapter(&config)?.list_markets()? {
        println!("{}", market);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn build_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, SwingscanError> {
    let defaults = IndicatorParams::default();
    let mult: f64 = get_parsed(
        config,
        "indicators",
        "bollinger_mult",
        f64::from(defaults.bollinger_mult_x100) / 100.0,
    )?;
    if !mult.is_finite() || mult <= 0.0 {
        return Err(SwingscanError::ConfigInvalid {
            section: "indicators".into(),
            key: "bollinger_mult".into(),
            reason: "bollinger_mult must be positive".into(),
        });
    }

    Ok(IndicatorParams {
        ema_period: config.get_usize("indicators", "ema_period", defaults.ema_period)?,
        rsi_period: config.get_usize("indicators", "rsi_period", defaults.rsi_period)?,
        volume_period: config.get_usize("indicators", "volume_period", defaults.volume_period)?,
        bollinger_period: config.get_usize(
            "indicators",
            "bollinger_period",
            defaults.bollinger_period,
        )?,
        bollinger_mult_x100: (mult * 100.0).round() as u32,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, SwingscanError> {
    let defaults = BacktestConfig::default();
    Ok(BacktestConfig {
        warmup: config.get_usize("backtest", "warmup", defaults.warmup)?,
        horizon: config.get_usize("backtest", "horizon", defaults.horizon)?,
        reward_unit: get_parsed(config, "backtest", "reward_unit", defaults.reward_unit)?,
        risk_unit: get_parsed(config, "backtest", "risk_unit", defaults.risk_unit)?,
    })
}

/// Read every `[scan]`, `[indicators]` and `[backtest]` setting and validate them together.
pub fn build_scan_settings(config: &dyn ConfigPort) -> Result<ScanSettings, SwingscanError> {
    let defaults = ScanSettings::default();
    let request = |period_key: &str, interval_key: &str, default: SeriesRequest| {
        let period: Period = get_parsed(config, "scan", period_key, default.period)?;
        let interval: Interval = get_parsed(config, "scan", interval_key, default.interval)?;
        Ok::<_, SwingscanError>(SeriesRequest::new(period, interval))
    };

    let settings = ScanSettings {
        primary: request("primary_period", "primary_interval", defaults.primary)?,
        higher: request("higher_period", "higher_interval", defaults.higher)?,
        min_primary_bars: config.get_usize("scan", "min_primary_bars", defaults.min_primary_bars)?,
        min_higher_bars: config.get_usize("scan", "min_higher_bars", defaults.min_higher_bars)?,
        rs_lookback: config.get_usize("scan", "rs_lookback", defaults.rs_lookback)?,
        max_instruments: config.get_usize("scan", "max_instruments", defaults.max_instruments)?,
        workers: config.get_usize("scan", "workers", defaults.workers)?,
        indicators: build_indicator_params(config)?,
        backtest: build_backtest_config(config)?,
    };
    validate_scan_settings(&settings)?;
    Ok(settings)
}

pub fn build_cache_ttl(config: &dyn ConfigPort) -> Result<Duration, SwingscanError> {
    let secs = config.get_usize("data", "cache_ttl_secs", DEFAULT_TTL.as_secs() as usize)?;
    Ok(Duration::from_secs(secs as u64))
}

/// Explicit symbol list: `--symbols` first, then `[scan] symbols`.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Option<Vec<String>>, SwingscanError> {
    let raw = match symbols_override {
        Some(s) => s.to_string(),
        None => match config.get_string("scan", "symbols") {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Ok(None),
        },
    };
    let symbols = parse_symbols(&raw).map_err(|e| SwingscanError::ConfigInvalid {
        section: "scan".into(),
        key: "symbols".into(),
        reason: e.to_string(),
    })?;
    Ok(Some(symbols.iter().map(|s| normalize_symbol(s)).collect()))
}

pub fn resolve_market(market_override: Option<&str>, config: &dyn ConfigPort) -> String {
    market_override
        .map(str::to_string)
        .or_else(|| config.get_string("scan", "market"))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MARKET.to_string())
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, SwingscanError> {
    let dir = required_path(config, "data", "dir")?;
    Ok(CsvAdapter::new(dir))
}

fn universe_adapter(config: &dyn ConfigPort) -> Result<CsvUniverseAdapter, SwingscanError> {
    let dir = required_path(config, "universe", "dir")?;
    Ok(CsvUniverseAdapter::new(dir))
}

fn required_path(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<PathBuf, SwingscanError> {
    config
        .get_string(section, key)
        .filter(|s| !s.trim().is_empty())
        .map(|s| PathBuf::from(s.trim()))
        .ok_or_else(|| SwingscanError::ConfigMissing {
            section: section.into(),
            key: key.into(),
        })
}

fn fmt_opt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", round2(v)))
        .unwrap_or_else(|| "-".into())
}

pub fn format_table(snapshots: &[TickerSnapshot]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<8} {:>5} {:>8} {:>8} {:>7} {:>6}  {}",
        "Rank", "Ticker", "Score", "RS%", "Win%", "Exp", "Trades", "Signal"
    );
    for (i, s) in snapshots.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>4}  {:<8} {:>5} {:>8} {:>8} {:>7} {:>6}  {}",
            i + 1,
            s.ticker,
            s.score,
            fmt_opt(s.relative_strength),
            fmt_opt(s.win_rate),
            fmt_opt(s.expectancy),
            s.trade_count,
            signal_label(s.signal_today)
        );
    }
    out
}

pub fn format_backtest(symbol: &str, profile: &ScoringProfile, report: &BacktestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== {} ({} entry rule) ===", symbol, profile.name);
    for predicate in &profile.entry_rule {
        let _ = writeln!(out, "  - {}", predicate);
    }
    let _ = writeln!(out, "Setups:      {}", report.setups());
    let _ = writeln!(
        out,
        "Trades:      {} ({} wins, {} losses, {} undecided)",
        report.trade_count(),
        report.wins,
        report.losses,
        report.undecided
    );
    let _ = writeln!(out, "Win Rate:    {}", fmt_opt(report.win_rate));
    let _ = writeln!(out, "Expectancy:  {}", fmt_opt(report.expectancy));

    if !report.trades.is_empty() {
        let _ = writeln!(
            out,
            "\n{:>6} {:>10} {:>10} {:>10}  {:<9} {:>5}",
            "Entry", "Price", "Stop", "Target", "Outcome", "Exit"
        );
        for t in &report.trades {
            let outcome = match t.outcome {
                TradeOutcome::Win => "win",
                TradeOutcome::Loss => "loss",
                TradeOutcome::Undecided => "undecided",
            };
            let exit = t
                .exit_index
                .map(|i| i.to_string())
                .unwrap_or_else(|| "-".into());
            let _ = writeln!(
                out,
                "{:>6} {:>10.2} {:>10.2} {:>10.2}  {:<9} {:>5}",
                t.entry_index, t.entry_price, t.stop_price, t.target_price, outcome, exit
            );
        }
    }
    out
}

fn describe_gate(gate: &SignalGate) -> String {
    match gate {
        SignalGate::AllOf(predicates) => predicates
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" AND "),
        SignalGate::ScoreAbove { threshold, confirm } => {
            format!("score > {} AND {}", threshold, confirm)
        }
    }
}

pub fn describe_profiles() -> String {
    let mut out = String::new();
    for profile in PRESET_NAMES.iter().filter_map(|n| ScoringProfile::preset(n)) {
        let _ = writeln!(
            out,
            "{} (max score {})",
            profile.name,
            profile.total_weight()
        );
        for rule in &profile.rules {
            let _ = writeln!(out, "  {:>3}  {:<18} {}", rule.weight, rule.name, rule.predicate);
        }
        let _ = writeln!(out, "  signal: {}", describe_gate(&profile.gate));
        out.push('\n');
    }
    out
}

pub fn describe_skip(reason: &SkipReason) -> String {
    match reason {
        SkipReason::Fetch(r) => format!("fetch failed: {}", r),
        SkipReason::InsufficientBars { bars, minimum } => {
            format!("{} bars, need {}", bars, minimum)
        }
        SkipReason::InvalidData(r) => format!("invalid data: {}", r),
        SkipReason::Failed(r) => format!("failed: {}", r),
    }
}

/// Summary line for a finished scan.
pub fn summarize(outcome: &ScanOutcome) -> String {
    let signals = outcome
        .snapshots
        .iter()
        .filter(|s| s.signal_today)
        .count();
    format!(
        "{} of {} instruments analysed, {} skipped, {} signalling today",
        outcome.snapshots.len(),
        outcome.total,
        outcome.skipped_count(),
        signals
    )
}
