//! Trading run configuration records.
//!
//! Everything the core needs reaches it through these flat structs; there is
//! no process-wide state. Per-strategy parameters get their own explicit
//! structs rather than a shared grab-bag.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;

use super::ohlcv::SampleInterval;
use super::riskmetric::RiskMetricOptimizations;

/// Parameters of one backtest run, validated fail-fast before any data is
/// read.
#[derive(Debug, Clone)]
pub struct TradingConfig {
    /// Uppercased, deduplicated pair roster; never empty.
    pub pairs: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: SampleInterval,
    pub initial_cash: f64,
    pub data_dir: PathBuf,
    pub optimizations: RiskMetricOptimizations,
    /// Pair whose price/volume history feeds the risk metric.
    pub riskmetric_pair: String,
}

impl TradingConfig {
    pub fn start_time(&self) -> NaiveDateTime {
        self.start_date.and_hms_opt(0, 0, 0).unwrap()
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.end_date.and_hms_opt(0, 0, 0).unwrap()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebalanceConfig {
    /// Steps between rebalances; at least 1.
    pub interval: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DcaConfig {
    /// Steps between injections; at least 1.
    pub interval: usize,
    /// USD injected per firing (before any ladder scaling).
    pub base_amount: f64,
}

/// Strategy roster entries accepted in the `[strategies]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyId {
    Hold,
    Rebalance,
    Dca,
    RiskThreshold,
    Extrema,
}

impl StrategyId {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "hold" => Some(StrategyId::Hold),
            "rebalance" => Some(StrategyId::Rebalance),
            "dca" => Some(StrategyId::Dca),
            "risk-threshold" => Some(StrategyId::RiskThreshold),
            "extrema" => Some(StrategyId::Extrema),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyId::Hold => "hold",
            StrategyId::Rebalance => "rebalance",
            StrategyId::Dca => "dca",
            StrategyId::RiskThreshold => "risk-threshold",
            StrategyId::Extrema => "extrema",
        }
    }
}
