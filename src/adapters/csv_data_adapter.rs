//! CSV kline-export data adapter.
//!
//! Expects one file per pair and interval at `<data_dir>/<PAIR>_<interval>.csv`
//! with header `open_time,open,high,low,close,volume` and `open_time` in
//! `%Y-%m-%d %H:%M:%S`.

use crate::domain::error::CoinsimError;
use crate::domain::ohlcv::{OhlcvBar, SampleInterval};
use crate::ports::data_port::DataPort;
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvDataAdapter {
    data_dir: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn csv_path(&self, pair: &str, interval: SampleInterval) -> PathBuf {
        self.data_dir
            .join(format!("{}_{}.csv", pair, interval.as_str()))
    }

    fn read_all(&self, pair: &str, interval: SampleInterval) -> Result<Vec<OhlcvBar>, CoinsimError> {
        let path = self.csv_path(pair, interval);
        let content = fs::read_to_string(&path).map_err(|e| CoinsimError::Data {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            // Header is row 0, first data row is line 2 in the file.
            let line = row + 2;
            let record = result.map_err(|e| CoinsimError::Data {
                reason: format!("{} line {}: {}", path.display(), line, e),
            })?;

            let open_time = parse_time(field(&record, 0, "open_time", &path, line)?)
                .map_err(|e| CoinsimError::Data {
                    reason: format!("{} line {}: invalid open_time: {}", path.display(), line, e),
                })?;
            let open = parse_f64(&record, 1, "open", &path, line)?;
            let high = parse_f64(&record, 2, "high", &path, line)?;
            let low = parse_f64(&record, 3, "low", &path, line)?;
            let close = parse_f64(&record, 4, "close", &path, line)?;
            let volume = parse_f64(&record, 5, "volume", &path, line)?;

            bars.push(OhlcvBar {
                pair: pair.to_string(),
                open_time,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        bars.sort_by_key(|b| b.open_time);
        Ok(bars)
    }
}

fn parse_time(s: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT)
}

fn field<'r>(
    record: &'r csv::StringRecord,
    index: usize,
    name: &str,
    path: &std::path::Path,
    line: usize,
) -> Result<&'r str, CoinsimError> {
    record.get(index).ok_or_else(|| CoinsimError::Data {
        reason: format!("{} line {}: missing {} column", path.display(), line, name),
    })
}

fn parse_f64(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    path: &std::path::Path,
    line: usize,
) -> Result<f64, CoinsimError> {
    field(record, index, name, path, line)?
        .parse()
        .map_err(|e| CoinsimError::Data {
            reason: format!("{} line {}: invalid {} value: {}", path.display(), line, name, e),
        })
}

impl DataPort for CsvDataAdapter {
    fn fetch_ohlcv(
        &self,
        pair: &str,
        interval: SampleInterval,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<OhlcvBar>, CoinsimError> {
        let bars = self.read_all(pair, interval)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.open_time >= start && b.open_time <= end)
            .collect())
    }

    fn list_pairs(&self) -> Result<Vec<String>, CoinsimError> {
        let entries = fs::read_dir(&self.data_dir).map_err(|e| CoinsimError::Data {
            reason: format!("failed to read directory {}: {}", self.data_dir.display(), e),
        })?;

        let mut pairs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoinsimError::Data {
                reason: format!("directory entry error: {}", e),
            })?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(stem) = name_str.strip_suffix(".csv") {
                if let Some((pair, _interval)) = stem.rsplit_once('_') {
                    if !pair.is_empty() && !pairs.contains(&pair.to_string()) {
                        pairs.push(pair.to_string());
                    }
                }
            }
        }

        pairs.sort();
        Ok(pairs)
    }

    fn data_range(
        &self,
        pair: &str,
        interval: SampleInterval,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, CoinsimError> {
        if !self.csv_path(pair, interval).exists() {
            return Ok(None);
        }
        let bars = self.read_all(pair, interval)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.open_time, last.open_time, bars.len()))),
            _ => Ok(None),
        }
    }
}
