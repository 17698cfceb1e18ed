//! CLI orchestration tests: config materialization, strategy construction,
//! and the data-to-report pipeline with mock and on-disk CSV data ports.

mod common;

use common::*;
use coinsim::adapters::csv_data_adapter::CsvDataAdapter;
use coinsim::adapters::csv_report_adapter::CsvReportAdapter;
use coinsim::adapters::file_config_adapter::FileConfigAdapter;
use coinsim::cli;
use coinsim::domain::backtest::run_backtest;
use coinsim::domain::config_validation::validate_trading_config;
use coinsim::domain::error::CoinsimError;
use coinsim::domain::portfolio::Portfolio;
use coinsim::domain::riskmetric::{RiskMetricOptimizations, RiskMetricSeries, RiskPoint};
use coinsim::domain::strategy::Strategy;
use coinsim::ports::report_port::ReportPort;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[trading]
pairs = BTCUSDT,ETHUSDT
start_date = 2022-01-01
end_date = 2022-01-04
interval = 1d
initial_cash = 20.0
data_dir = data

[riskmetric]
source_pair = BTCUSDT
diminishing_returns = false
volume_correlation = false

[strategies]
run = hold,rebalance,dca

[strategy.rebalance]
interval = 2

[strategy.dca]
interval = 1
base_amount = 5.0
ladder = none
"#;

mod config_materialization {
    use super::*;

    #[test]
    fn builds_the_trading_config() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert!(validate_trading_config(&adapter).is_ok());

        let config = cli::build_trading_config(&adapter).unwrap();
        assert_eq!(config.pairs, vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(config.initial_cash, 20.0);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.riskmetric_pair, "BTCUSDT");
        assert!(!config.optimizations.diminishing_returns);
        assert_eq!(config.start_time(), datetime(2022, 1, 1));
    }

    #[test]
    fn source_pair_defaults_to_btc() {
        let adapter = FileConfigAdapter::from_string(
            "[trading]\npairs = ETHUSDT\nstart_date = 2022-01-01\nend_date = 2022-01-04\n",
        )
        .unwrap();
        let config = cli::build_trading_config(&adapter).unwrap();
        assert_eq!(config.riskmetric_pair, "BTCUSDT");
    }

    #[test]
    fn missing_pairs_is_a_config_error() {
        let adapter = FileConfigAdapter::from_string(
            "[trading]\nstart_date = 2022-01-01\nend_date = 2022-01-04\n",
        )
        .unwrap();
        let err = cli::build_trading_config(&adapter).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigMissing { key, .. } if key == "pairs"));
    }

    #[test]
    fn config_file_round_trip() {
        let file = write_temp_ini(VALID_INI);
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert!(validate_trading_config(&adapter).is_ok());
    }
}

mod strategy_construction {
    use super::*;

    fn scripted_series() -> RiskMetricSeries {
        RiskMetricSeries::from_points(vec![RiskPoint {
            timestamp: datetime(2022, 1, 1),
            score: 0.5,
            price: 10.0,
            local_min: false,
            local_max: false,
            confirmed_min: false,
            confirmed_max: false,
        }])
    }

    #[test]
    fn builds_the_rostered_strategies_in_order() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let strategies = cli::build_strategies(&adapter, None).unwrap();

        let names: Vec<String> = strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["hold", "rebalance{interval: 2}", "dca{interval: 1}"]);
    }

    #[test]
    fn laddered_dca_uses_the_risk_series() {
        let adapter = FileConfigAdapter::from_string(
            "[trading]\npairs = BTCUSDT\nstart_date = 2022-01-01\nend_date = 2022-01-04\n\n\
             [strategies]\nrun = dca\n\n[strategy.dca]\nladder = fibonacci\n",
        )
        .unwrap();

        let strategies = cli::build_strategies(&adapter, Some(&scripted_series())).unwrap();
        assert_eq!(strategies[0].name(), "dca-fibonacci{interval: 1}");
    }

    #[test]
    fn risk_strategy_without_series_errors() {
        let adapter = FileConfigAdapter::from_string(
            "[trading]\npairs = BTCUSDT\nstart_date = 2022-01-01\nend_date = 2022-01-04\n\n\
             [strategies]\nrun = risk-threshold\n",
        )
        .unwrap();

        let result = cli::build_strategies(&adapter, None);
        assert!(matches!(result, Err(CoinsimError::Data { .. })));
    }

    #[test]
    fn extrema_mode_follows_the_confirmed_flag() {
        let confirmed = FileConfigAdapter::from_string(
            "[trading]\npairs = BTCUSDT\nstart_date = 2022-01-01\nend_date = 2022-01-04\n\n\
             [strategies]\nrun = extrema\n\n[strategy.extrema]\nconfirmed = true\n",
        )
        .unwrap();
        let strategies = cli::build_strategies(&confirmed, Some(&scripted_series())).unwrap();
        assert_eq!(strategies[0].name(), "extrema-confirmed");

        let ideal = FileConfigAdapter::from_string(
            "[trading]\npairs = BTCUSDT\nstart_date = 2022-01-01\nend_date = 2022-01-04\n\n\
             [strategies]\nrun = extrema\n\n[strategy.extrema]\nconfirmed = false\n",
        )
        .unwrap();
        let strategies = cli::build_strategies(&ideal, Some(&scripted_series())).unwrap();
        assert_eq!(strategies[0].name(), "extrema-ideal");
    }
}

mod panel_assembly {
    use super::*;

    fn trading_config(data_dir: PathBuf) -> coinsim::domain::config::TradingConfig {
        coinsim::domain::config::TradingConfig {
            pairs: vec!["BTCUSDT".into(), "ETHUSDT".into()],
            start_date: chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            end_date: chrono::NaiveDate::from_ymd_opt(2022, 1, 3).unwrap(),
            interval: SampleInterval::OneDay,
            initial_cash: 20.0,
            data_dir,
            optimizations: RiskMetricOptimizations::default(),
            riskmetric_pair: "BTCUSDT".into(),
        }
    }

    #[test]
    fn mock_port_builds_a_panel() {
        let start = datetime(2022, 1, 1);
        let port = MockDataPort::new()
            .with_bars("BTCUSDT", daily_bars("BTCUSDT", start, &[10.0, 20.0, 30.0]))
            .with_bars("ETHUSDT", daily_bars("ETHUSDT", start, &[10.0, 10.0, 10.0]));

        let panel = cli::build_panel(&port, &trading_config(PathBuf::from("unused"))).unwrap();

        assert_eq!(panel.len(), 3);
        assert!(panel.tracks("BTCUSDT"));
        assert!(panel.tracks("ETHUSDT"));
    }

    #[test]
    fn missing_pair_data_is_a_no_data_error() {
        let start = datetime(2022, 1, 1);
        let port =
            MockDataPort::new().with_bars("BTCUSDT", daily_bars("BTCUSDT", start, &[10.0]));

        let result = cli::build_panel(&port, &trading_config(PathBuf::from("unused")));

        assert!(matches!(
            result,
            Err(CoinsimError::NoData { pair, .. }) if pair == "ETHUSDT"
        ));
    }

    #[test]
    fn riskmetric_needs_a_known_source_pair() {
        let port = MockDataPort::new();
        let result = cli::build_riskmetric(&port, &trading_config(PathBuf::from("unused")));
        assert!(matches!(result, Err(CoinsimError::NoData { .. })));
    }

    #[test]
    fn riskmetric_computes_over_full_history_then_slices() {
        // 120 days of history ending inside the run window; the slice keeps
        // only in-window points, but the scores depend on the lead-in.
        let start = datetime(2021, 10, 1);
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64) * 0.5 + if i % 2 == 0 { 5.0 } else { -5.0 })
            .collect();
        let port =
            MockDataPort::new().with_bars("BTCUSDT", daily_bars("BTCUSDT", start, &closes));

        let mut config = trading_config(PathBuf::from("unused"));
        config.start_date = chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        config.end_date = chrono::NaiveDate::from_ymd_opt(2022, 1, 28).unwrap();

        let series = cli::build_riskmetric(&port, &config).unwrap();

        assert!(!series.is_empty());
        for point in series.points() {
            assert!(point.timestamp >= config.start_time());
            assert!(point.timestamp <= config.end_time());
        }
    }
}

mod end_to_end {
    use super::*;

    /// Full pipeline over real CSV files: data adapter, panel, batch run,
    /// report CSVs.
    #[test]
    fn csv_to_reports() {
        let dir = tempfile::TempDir::new().unwrap();
        let data_dir = dir.path().join("data");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(
            data_dir.join("BTCUSDT_1d.csv"),
            "open_time,open,high,low,close,volume\n\
             2022-01-01 00:00:00,10,10,10,10,1000\n\
             2022-01-02 00:00:00,20,20,20,20,1000\n",
        )
        .unwrap();
        fs::write(
            data_dir.join("ETHUSDT_1d.csv"),
            "open_time,open,high,low,close,volume\n\
             2022-01-01 00:00:00,10,10,10,10,1000\n\
             2022-01-02 00:00:00,10,10,10,10,1000\n",
        )
        .unwrap();

        let ini = format!(
            "[trading]\npairs = BTCUSDT,ETHUSDT\nstart_date = 2022-01-01\n\
             end_date = 2022-01-02\ninitial_cash = 20.0\ndata_dir = {}\n\n\
             [strategies]\nrun = hold,rebalance\n\n[strategy.rebalance]\ninterval = 1\n",
            data_dir.display()
        );
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        validate_trading_config(&adapter).unwrap();
        let config = cli::build_trading_config(&adapter).unwrap();

        let data_port = CsvDataAdapter::new(config.data_dir.clone());
        let panel = cli::build_panel(&data_port, &config).unwrap();
        let strategies = cli::build_strategies(&adapter, None).unwrap();
        let template = Portfolio::new(config.initial_cash, &config.pairs);

        let outcome = run_backtest(&panel, &template, strategies);
        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.failed.is_empty());
        // Both start at 20; BTC doubling lifts every variant above it.
        for result in &outcome.results {
            assert!(result.stats.final_valuation > 20.0);
        }

        let reporter = CsvReportAdapter::new();
        let valuations_path = dir.path().join("valuations.csv");
        let trades_path = dir.path().join("trades.csv");
        reporter
            .write_valuations(&valuations_path, panel.timestamps(), &outcome.results)
            .unwrap();
        reporter.write_trades(&trades_path, &outcome.results).unwrap();

        let valuations = fs::read_to_string(&valuations_path).unwrap();
        assert!(valuations.starts_with("timestamp,hold,"));
        assert_eq!(valuations.lines().count(), 3);
        let trades = fs::read_to_string(&trades_path).unwrap();
        assert!(trades.contains("hold,2022-01-01 00:00:00,buy"));
    }
}
