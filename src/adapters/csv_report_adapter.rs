//! CSV report adapter: valuation histories and trade logs.

use crate::domain::backtest::StrategyRunResult;
use crate::domain::error::CoinsimError;
use crate::ports::report_port::ReportPort;
use chrono::NaiveDateTime;
use std::path::Path;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    /// One wide table: a timestamp column plus one valuation column per
    /// strategy, aligned on the shared timeline.
    fn write_valuations(
        &self,
        path: &Path,
        timestamps: &[NaiveDateTime],
        results: &[StrategyRunResult],
    ) -> Result<(), CoinsimError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| CoinsimError::Data {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        let mut header = vec!["timestamp".to_string()];
        header.extend(results.iter().map(|r| r.name.clone()));
        wtr.write_record(&header)
            .map_err(|e| CoinsimError::Data {
                reason: format!("failed to write {}: {}", path.display(), e),
            })?;

        for (i, ts) in timestamps.iter().enumerate() {
            let mut row = vec![ts.format(TIME_FORMAT).to_string()];
            for result in results {
                let value = result
                    .valuations
                    .get(i)
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                row.push(value);
            }
            wtr.write_record(&row).map_err(|e| CoinsimError::Data {
                reason: format!("failed to write {}: {}", path.display(), e),
            })?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// One long table: `strategy,timestamp,side` for every trade event.
    fn write_trades(&self, path: &Path, results: &[StrategyRunResult]) -> Result<(), CoinsimError> {
        let mut wtr = csv::Writer::from_path(path).map_err(|e| CoinsimError::Data {
            reason: format!("failed to open {}: {}", path.display(), e),
        })?;

        wtr.write_record(["strategy", "timestamp", "side"])
            .map_err(|e| CoinsimError::Data {
                reason: format!("failed to write {}: {}", path.display(), e),
            })?;

        for result in results {
            for ts in &result.bought {
                wtr.write_record([
                    result.name.as_str(),
                    &ts.format(TIME_FORMAT).to_string(),
                    "buy",
                ])
                .map_err(|e| CoinsimError::Data {
                    reason: format!("failed to write {}: {}", path.display(), e),
                })?;
            }
            for ts in &result.sold {
                wtr.write_record([
                    result.name.as_str(),
                    &ts.format(TIME_FORMAT).to_string(),
                    "sell",
                ])
                .map_err(|e| CoinsimError::Data {
                    reason: format!("failed to write {}: {}", path.display(), e),
                })?;
            }
        }

        wtr.flush()?;
        Ok(())
    }
}
