//! Report output port trait.

use std::path::Path;

use crate::domain::backtest::StrategyRunResult;
use crate::domain::error::CoinsimError;
use chrono::NaiveDateTime;

/// Port for persisting batch results.
pub trait ReportPort {
    /// Valuation histories for every strategy over the shared timeline.
    fn write_valuations(
        &self,
        path: &Path,
        timestamps: &[NaiveDateTime],
        results: &[StrategyRunResult],
    ) -> Result<(), CoinsimError>;

    /// Every buy and sell event across the batch.
    fn write_trades(&self, path: &Path, results: &[StrategyRunResult]) -> Result<(), CoinsimError>;
}
