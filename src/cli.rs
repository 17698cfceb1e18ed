//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_data_adapter::CsvDataAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestRunResult};
use crate::domain::config::{DcaConfig, RebalanceConfig, StrategyId, TradingConfig};
use crate::domain::config_validation::{
    dca_ladder, parse_pairs, roster_needs_riskmetric, rostered_strategies,
    validate_trading_config,
};
use crate::domain::error::CoinsimError;
use crate::domain::ohlcv::SampleInterval;
use crate::domain::panel::PricePanel;
use crate::domain::portfolio::Portfolio;
use crate::domain::riskmetric::{RiskMetricOptimizations, RiskMetricSeries};
use crate::domain::simulation::BTC_PAIR;
use crate::domain::strategies::{
    DcaRiskStrategy, DcaStrategy, ExtremaMode, ExtremaStrategy, HoldStrategy, RebalanceStrategy,
    RiskThresholdStrategy,
};
use crate::domain::strategy::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "coinsim", about = "Crypto strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest batch
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show the data range for each configured pair
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            dry_run,
        } => run_backtest(&config, output.as_ref(), dry_run),
        Command::Validate { config } => run_validate(&config),
        Command::Info { config } => run_info(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = CoinsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Materialize the `[trading]` and `[riskmetric]` sections. Assumes
/// [`validate_trading_config`] has already passed; re-checks nothing.
pub fn build_trading_config(adapter: &dyn ConfigPort) -> Result<TradingConfig, CoinsimError> {
    let pairs_raw = adapter
        .get_string("trading", "pairs")
        .ok_or_else(|| CoinsimError::ConfigMissing {
            section: "trading".into(),
            key: "pairs".into(),
        })?;
    let pairs = parse_pairs(&pairs_raw)?;

    let start_date = parse_config_date(adapter, "start_date")?;
    let end_date = parse_config_date(adapter, "end_date")?;

    let interval_raw = adapter
        .get_string("trading", "interval")
        .unwrap_or_else(|| "1d".to_string());
    let interval =
        SampleInterval::parse(&interval_raw).ok_or_else(|| CoinsimError::ConfigInvalid {
            section: "trading".into(),
            key: "interval".into(),
            reason: format!("unsupported interval '{}'", interval_raw),
        })?;

    let riskmetric_pair = adapter
        .get_string("riskmetric", "source_pair")
        .map(|p| p.trim().to_uppercase())
        .unwrap_or_else(|| BTC_PAIR.to_string());

    Ok(TradingConfig {
        pairs,
        start_date,
        end_date,
        interval,
        initial_cash: adapter.get_double("trading", "initial_cash", 10_000.0),
        data_dir: PathBuf::from(
            adapter
                .get_string("trading", "data_dir")
                .unwrap_or_else(|| "data".to_string()),
        ),
        optimizations: RiskMetricOptimizations {
            diminishing_returns: adapter.get_bool("riskmetric", "diminishing_returns", false),
            volume_correlation: adapter.get_bool("riskmetric", "volume_correlation", false),
        },
        riskmetric_pair,
    })
}

fn parse_config_date(adapter: &dyn ConfigPort, key: &str) -> Result<NaiveDate, CoinsimError> {
    let raw = adapter
        .get_string("trading", key)
        .ok_or_else(|| CoinsimError::ConfigMissing {
            section: "trading".into(),
            key: key.into(),
        })?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|_| CoinsimError::ConfigInvalid {
        section: "trading".into(),
        key: key.into(),
        reason: "invalid date format (expected YYYY-MM-DD)".into(),
    })
}

/// Fetch every pair's bars for the configured window and assemble the panel.
pub fn build_panel(
    data_port: &dyn DataPort,
    config: &TradingConfig,
) -> Result<PricePanel, CoinsimError> {
    let mut tracks = Vec::with_capacity(config.pairs.len());
    for pair in &config.pairs {
        let bars = data_port.fetch_ohlcv(
            pair,
            config.interval,
            config.start_time(),
            config.end_time(),
        )?;
        if bars.is_empty() {
            return Err(CoinsimError::NoData {
                pair: pair.clone(),
                interval: config.interval.as_str().to_string(),
            });
        }
        tracks.push((pair.clone(), bars));
    }
    PricePanel::from_bars(tracks, config.interval)
}

/// Compute the risk series over the source pair's FULL history, then slice
/// to the run window. The moving averages need the lead-in; computing only
/// over the window would distort every early score.
pub fn build_riskmetric(
    data_port: &dyn DataPort,
    config: &TradingConfig,
) -> Result<RiskMetricSeries, CoinsimError> {
    let range = data_port.data_range(&config.riskmetric_pair, SampleInterval::OneDay)?;
    let (first, _, _) = range.ok_or_else(|| CoinsimError::NoData {
        pair: config.riskmetric_pair.clone(),
        interval: SampleInterval::OneDay.as_str().to_string(),
    })?;

    let bars = data_port.fetch_ohlcv(
        &config.riskmetric_pair,
        SampleInterval::OneDay,
        first,
        config.end_time(),
    )?;
    let series = RiskMetricSeries::compute(&bars, config.optimizations)?;
    Ok(series.slice(config.start_time(), config.end_time()))
}

/// Instantiate the rostered strategies. `riskmetric` must be present when
/// any rostered strategy consumes it.
pub fn build_strategies(
    adapter: &dyn ConfigPort,
    riskmetric: Option<&RiskMetricSeries>,
) -> Result<Vec<Box<dyn Strategy>>, CoinsimError> {
    let require_riskmetric = || -> Result<RiskMetricSeries, CoinsimError> {
        riskmetric.cloned().ok_or_else(|| CoinsimError::Data {
            reason: "risk metric series required but not computed".into(),
        })
    };

    let mut strategies: Vec<Box<dyn Strategy>> = Vec::new();
    for id in rostered_strategies(adapter)? {
        match id {
            StrategyId::Hold => strategies.push(Box::new(HoldStrategy::new())),
            StrategyId::Rebalance => {
                let config = RebalanceConfig {
                    interval: adapter.get_int("strategy.rebalance", "interval", 1) as usize,
                };
                strategies.push(Box::new(RebalanceStrategy::new(config)));
            }
            StrategyId::Dca => {
                let config = DcaConfig {
                    interval: adapter.get_int("strategy.dca", "interval", 1) as usize,
                    base_amount: adapter.get_double("strategy.dca", "base_amount", 5.0),
                };
                match dca_ladder(adapter)? {
                    Some(ladder) => strategies.push(Box::new(DcaRiskStrategy::new(
                        config,
                        ladder,
                        require_riskmetric()?,
                    ))),
                    None => strategies.push(Box::new(DcaStrategy::new(config))),
                }
            }
            StrategyId::RiskThreshold => {
                strategies.push(Box::new(RiskThresholdStrategy::new(require_riskmetric()?)));
            }
            StrategyId::Extrema => {
                let mode = if adapter.get_bool("strategy.extrema", "confirmed", true) {
                    ExtremaMode::Confirmed
                } else {
                    ExtremaMode::Ideal
                };
                strategies.push(Box::new(ExtremaStrategy::new(require_riskmetric()?, mode)));
            }
        }
    }
    Ok(strategies)
}

fn run_backtest(config_path: &PathBuf, output: Option<&PathBuf>, dry_run: bool) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_trading_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let config = match build_trading_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvDataAdapter::new(config.data_dir.clone());

    // Stage 2: Fetch bars and assemble the panel
    eprintln!(
        "Fetching {} pairs, {} to {}",
        config.pairs.len(),
        config.start_date,
        config.end_date,
    );
    let panel = match build_panel(&data_port, &config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("  Panel: {} common timestamps", panel.len());

    // Stage 3: Risk metric, when any rostered strategy needs it
    let needs_riskmetric = match roster_needs_riskmetric(&adapter) {
        Ok(n) => n,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let riskmetric = if needs_riskmetric {
        eprintln!("Computing risk metric over {}", config.riskmetric_pair);
        match build_riskmetric(&data_port, &config) {
            Ok(series) => {
                eprintln!("  Risk metric: {} points in window", series.len());
                Some(series)
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    } else {
        None
    };

    if dry_run {
        eprintln!("\nDry run complete: configuration and data are valid");
        return ExitCode::SUCCESS;
    }

    // Stage 4: Build and run the batch
    let strategies = match build_strategies(&adapter, riskmetric.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Running {} strategies", strategies.len());

    let template = Portfolio::new(config.initial_cash, &config.pairs);
    let outcome = backtest_engine::run_backtest(&panel, &template, strategies);

    for failure in &outcome.failed {
        eprintln!("warning: {} failed: {}", failure.name, failure.error);
    }
    if outcome.results.is_empty() {
        let err = CoinsimError::AllStrategiesFailed {
            count: outcome.failed.len(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }

    print_summary(&outcome);

    // Stage 5: Write the report CSVs
    let output_dir = output.cloned().unwrap_or_else(|| PathBuf::from("."));
    if let Err(e) = write_reports(&output_dir, &panel, &outcome) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("\nReports written to {}", output_dir.display());
    ExitCode::SUCCESS
}

fn print_summary(outcome: &BacktestRunResult) {
    eprintln!("\n=== Results ===");
    for result in &outcome.results {
        let stats = &result.stats;
        let in_btc = stats
            .final_in_btc
            .map(|v| format!(", {:.6} BTC", v))
            .unwrap_or_default();
        eprintln!(
            "  {}: final ${:.2}, contributed ${:.2}, roi {:.3}, {} buys / {} sells{}",
            result.name,
            stats.final_valuation,
            stats.total_contributed,
            stats.roi,
            stats.buys,
            stats.sells,
            in_btc,
        );
    }
}

fn write_reports(
    output_dir: &PathBuf,
    panel: &PricePanel,
    outcome: &BacktestRunResult,
) -> Result<(), CoinsimError> {
    fs::create_dir_all(output_dir)?;
    let reporter = CsvReportAdapter::new();
    reporter.write_valuations(
        &output_dir.join("valuations.csv"),
        panel.timestamps(),
        &outcome.results,
    )?;
    reporter.write_trades(&output_dir.join("trades.csv"), &outcome.results)?;
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_trading_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let config = match build_trading_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let roster = match rostered_strategies(&adapter) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("  pairs:      {}", config.pairs.join(", "));
    eprintln!("  window:     {} to {}", config.start_date, config.end_date);
    eprintln!("  interval:   {}", config.interval.as_str());
    eprintln!(
        "  strategies: {}",
        roster
            .iter()
            .map(|id| id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_info(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_trading_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let config = match build_trading_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvDataAdapter::new(config.data_dir.clone());
    for pair in &config.pairs {
        match data_port.data_range(pair, config.interval) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} rows, {} to {}", pair, count, first, last);
            }
            Ok(None) => {
                eprintln!("{}: no data found", pair);
            }
            Err(e) => {
                eprintln!("error querying {}: {}", pair, e);
            }
        }
    }
    ExitCode::SUCCESS
}
