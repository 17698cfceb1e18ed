//! Domain error types.

use chrono::NaiveDateTime;

/// Top-level error type for coinsim.
#[derive(Debug, thiserror::Error)]
pub enum CoinsimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {pair} at interval {interval}")]
    NoData { pair: String, interval: String },

    #[error("no price for {pair} at {timestamp}")]
    MissingPrice {
        pair: String,
        timestamp: NaiveDateTime,
    },

    #[error("no risk metric point at {timestamp}")]
    MissingRiskPoint { timestamp: NaiveDateTime },

    #[error("rebalance fraction {fraction} outside [0, 1]")]
    InvalidFraction { fraction: f64 },

    #[error("all {count} strategies failed")]
    AllStrategiesFailed { count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CoinsimError> for std::process::ExitCode {
    fn from(err: &CoinsimError) -> Self {
        let code: u8 = match err {
            CoinsimError::Io(_) => 1,
            CoinsimError::ConfigParse { .. }
            | CoinsimError::ConfigMissing { .. }
            | CoinsimError::ConfigInvalid { .. } => 2,
            CoinsimError::Data { .. } | CoinsimError::NoData { .. } => 3,
            CoinsimError::MissingPrice { .. }
            | CoinsimError::MissingRiskPoint { .. }
            | CoinsimError::InvalidFraction { .. } => 4,
            CoinsimError::AllStrategiesFailed { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
