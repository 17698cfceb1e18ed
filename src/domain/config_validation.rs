//! Fail-fast validation of the trading configuration.
//!
//! Everything here runs before any data is read or any step executes; a
//! strategy run never sees a half-valid config.

use crate::domain::config::StrategyId;
use crate::domain::error::CoinsimError;
use crate::domain::ohlcv::SampleInterval;
use crate::domain::strategies::DcaLadder;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    validate_pairs(config)?;
    validate_dates(config)?;
    validate_interval(config)?;
    validate_initial_cash(config)?;
    validate_strategy_roster(config)?;
    validate_rebalance(config)?;
    validate_dca(config)?;
    validate_risk_interval(config)?;
    Ok(())
}

/// Split, uppercase and deduplicate a comma-separated pair list. Empty
/// tokens (from `BTCUSDT,,ETHUSDT` or a trailing comma) are rejected rather
/// than silently dropped.
pub fn parse_pairs(raw: &str) -> Result<Vec<String>, CoinsimError> {
    let mut pairs: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let pair = token.trim().to_uppercase();
        if pair.is_empty() {
            return Err(CoinsimError::ConfigInvalid {
                section: "trading".to_string(),
                key: "pairs".to_string(),
                reason: "empty pair token in list".to_string(),
            });
        }
        if !pairs.contains(&pair) {
            pairs.push(pair);
        }
    }
    if pairs.is_empty() {
        return Err(CoinsimError::ConfigMissing {
            section: "trading".to_string(),
            key: "pairs".to_string(),
        });
    }
    Ok(pairs)
}

fn validate_pairs(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    match config.get_string("trading", "pairs") {
        Some(raw) if !raw.trim().is_empty() => parse_pairs(&raw).map(|_| ()),
        _ => Err(CoinsimError::ConfigMissing {
            section: "trading".to_string(),
            key: "pairs".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    let start = parse_date(config.get_string("trading", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("trading", "end_date").as_deref(), "end_date")?;
    if start >= end {
        return Err(CoinsimError::ConfigInvalid {
            section: "trading".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, CoinsimError> {
    match value {
        None => Err(CoinsimError::ConfigMissing {
            section: "trading".to_string(),
            key: field.to_string(),
        }),
        Some(s) => {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| CoinsimError::ConfigInvalid {
                section: "trading".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            })
        }
    }
}

fn validate_interval(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    let raw = config
        .get_string("trading", "interval")
        .unwrap_or_else(|| "1d".to_string());
    match SampleInterval::parse(&raw) {
        Some(_) => Ok(()),
        None => Err(CoinsimError::ConfigInvalid {
            section: "trading".to_string(),
            key: "interval".to_string(),
            reason: format!("unsupported interval '{}'", raw),
        }),
    }
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    let value = config.get_double("trading", "initial_cash", 0.0);
    if value < 0.0 {
        return Err(CoinsimError::ConfigInvalid {
            section: "trading".to_string(),
            key: "initial_cash".to_string(),
            reason: "initial_cash must be non-negative".to_string(),
        });
    }
    Ok(())
}

fn validate_strategy_roster(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    for id in rostered_strategies(config)? {
        let _ = id;
    }
    Ok(())
}

/// The parsed `[strategies] run` roster. Defaults to `hold` when the section
/// is absent.
pub fn rostered_strategies(config: &dyn ConfigPort) -> Result<Vec<StrategyId>, CoinsimError> {
    let raw = config
        .get_string("strategies", "run")
        .unwrap_or_else(|| "hold".to_string());
    let mut ids = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        match StrategyId::parse(token) {
            Some(id) => ids.push(id),
            None => {
                return Err(CoinsimError::ConfigInvalid {
                    section: "strategies".to_string(),
                    key: "run".to_string(),
                    reason: format!("unknown strategy '{}'", token),
                })
            }
        }
    }
    if ids.is_empty() {
        return Err(CoinsimError::ConfigMissing {
            section: "strategies".to_string(),
            key: "run".to_string(),
        });
    }
    Ok(ids)
}

fn validate_rebalance(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    let value = config.get_int("strategy.rebalance", "interval", 1);
    if value < 1 {
        return Err(CoinsimError::ConfigInvalid {
            section: "strategy.rebalance".to_string(),
            key: "interval".to_string(),
            reason: "interval must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dca(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    let interval = config.get_int("strategy.dca", "interval", 1);
    if interval < 1 {
        return Err(CoinsimError::ConfigInvalid {
            section: "strategy.dca".to_string(),
            key: "interval".to_string(),
            reason: "interval must be at least 1".to_string(),
        });
    }
    let base_amount = config.get_double("strategy.dca", "base_amount", 5.0);
    if base_amount <= 0.0 {
        return Err(CoinsimError::ConfigInvalid {
            section: "strategy.dca".to_string(),
            key: "base_amount".to_string(),
            reason: "base_amount must be positive".to_string(),
        });
    }
    let _ = dca_ladder(config)?;
    Ok(())
}

/// The `[strategy.dca] ladder` setting: `None` for plain DCA, `Some` for the
/// risk-scaled variant.
pub fn dca_ladder(config: &dyn ConfigPort) -> Result<Option<DcaLadder>, CoinsimError> {
    let raw = config
        .get_string("strategy.dca", "ladder")
        .unwrap_or_else(|| "none".to_string());
    if raw.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match DcaLadder::parse(&raw) {
        Some(ladder) => Ok(Some(ladder)),
        None => Err(CoinsimError::ConfigInvalid {
            section: "strategy.dca".to_string(),
            key: "ladder".to_string(),
            reason: format!("unknown ladder '{}'", raw),
        }),
    }
}

/// True when any rostered strategy consumes the risk metric series.
pub fn roster_needs_riskmetric(config: &dyn ConfigPort) -> Result<bool, CoinsimError> {
    let ids = rostered_strategies(config)?;
    if ids.contains(&StrategyId::RiskThreshold) || ids.contains(&StrategyId::Extrema) {
        return Ok(true);
    }
    Ok(ids.contains(&StrategyId::Dca) && dca_ladder(config)?.is_some())
}

// The risk pipeline's moving-average windows are denominated in days, so
// risk-driven strategies only make sense on daily bars.
fn validate_risk_interval(config: &dyn ConfigPort) -> Result<(), CoinsimError> {
    if !roster_needs_riskmetric(config)? {
        return Ok(());
    }
    let raw = config
        .get_string("trading", "interval")
        .unwrap_or_else(|| "1d".to_string());
    match SampleInterval::parse(&raw) {
        Some(SampleInterval::OneDay) => Ok(()),
        _ => Err(CoinsimError::ConfigInvalid {
            section: "trading".to_string(),
            key: "interval".to_string(),
            reason: "risk-driven strategies require a 1d interval".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const VALID: &str = r#"
[trading]
pairs = BTCUSDT,ETHUSDT
start_date = 2021-01-01
end_date = 2022-05-01
interval = 1d
initial_cash = 10000.0
data_dir = data

[strategies]
run = hold,rebalance,dca
"#;

    #[test]
    fn valid_config_passes() {
        let config = make_config(VALID);
        assert!(validate_trading_config(&config).is_ok());
    }

    #[test]
    fn parse_pairs_uppercases_and_dedupes() {
        let pairs = parse_pairs("btcusdt, ETHUSDT ,BtcUsdt").unwrap();
        assert_eq!(pairs, vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()]);
    }

    #[test]
    fn parse_pairs_rejects_empty_tokens() {
        let err = parse_pairs("BTCUSDT,,ETHUSDT").unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "pairs"));
        assert!(parse_pairs("BTCUSDT,").is_err());
    }

    #[test]
    fn missing_pairs_fails() {
        let config = make_config(
            "[trading]\nstart_date = 2021-01-01\nend_date = 2022-05-01\ninitial_cash = 100\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigMissing { key, .. } if key == "pairs"));
    }

    #[test]
    fn bad_date_format_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021/01/01\nend_date = 2022-05-01\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn missing_end_date_fails() {
        let config = make_config("[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\n");
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigMissing { key, .. } if key == "end_date"));
    }

    #[test]
    fn start_on_or_after_end_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2022-05-01\nend_date = 2022-05-01\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn unsupported_interval_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\ninterval = 3m\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "interval"));
    }

    #[test]
    fn negative_cash_fails_zero_passes() {
        let negative = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\ninitial_cash = -1\n",
        );
        let err = validate_trading_config(&negative).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "initial_cash"));

        let zero = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\ninitial_cash = 0\n",
        );
        assert!(validate_trading_config(&zero).is_ok());
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategies]\nrun = hold,momentum\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "run"));
    }

    #[test]
    fn roster_defaults_to_hold() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n",
        );
        assert_eq!(
            rostered_strategies(&config).unwrap(),
            vec![StrategyId::Hold]
        );
    }

    #[test]
    fn rebalance_interval_zero_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategy.rebalance]\ninterval = 0\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(
            err,
            CoinsimError::ConfigInvalid { section, key, .. }
                if section == "strategy.rebalance" && key == "interval"
        ));
    }

    #[test]
    fn dca_base_amount_zero_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategy.dca]\nbase_amount = 0\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "base_amount"));
    }

    #[test]
    fn bad_ladder_name_fails() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategy.dca]\nladder = martingale\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "ladder"));
    }

    #[test]
    fn ladder_none_means_plain_dca() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategy.dca]\nladder = none\n",
        );
        assert_eq!(dca_ladder(&config).unwrap(), None);
    }

    #[test]
    fn riskmetric_need_follows_the_roster() {
        let plain = make_config(VALID);
        assert!(!roster_needs_riskmetric(&plain).unwrap());

        let threshold = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategies]\nrun = risk-threshold\n",
        );
        assert!(roster_needs_riskmetric(&threshold).unwrap());

        let laddered = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\n\n[strategies]\nrun = dca\n\n[strategy.dca]\nladder = linear\n",
        );
        assert!(roster_needs_riskmetric(&laddered).unwrap());
    }

    #[test]
    fn risk_strategies_require_daily_bars() {
        let config = make_config(
            "[trading]\npairs = BTCUSDT\nstart_date = 2021-01-01\nend_date = 2022-05-01\ninterval = 1h\n\n[strategies]\nrun = extrema\n",
        );
        let err = validate_trading_config(&config).unwrap_err();
        assert!(matches!(err, CoinsimError::ConfigInvalid { key, .. } if key == "interval"));
    }
}
