#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use coinsim::domain::error::CoinsimError;
pub use coinsim::domain::ohlcv::{OhlcvBar, SampleInterval};
use coinsim::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, pair: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(pair.to_string(), bars);
        self
    }

    pub fn with_error(mut self, pair: &str, reason: &str) -> Self {
        self.errors.insert(pair.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        pair: &str,
        _interval: SampleInterval,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<OhlcvBar>, CoinsimError> {
        if let Some(reason) = self.errors.get(pair) {
            return Err(CoinsimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(pair)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| b.open_time >= start && b.open_time <= end)
            .collect())
    }

    fn list_pairs(&self) -> Result<Vec<String>, CoinsimError> {
        let mut pairs: Vec<String> = self.data.keys().cloned().collect();
        pairs.sort();
        Ok(pairs)
    }

    fn data_range(
        &self,
        pair: &str,
        _interval: SampleInterval,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, CoinsimError> {
        if let Some(reason) = self.errors.get(pair) {
            return Err(CoinsimError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(pair) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.open_time).min().unwrap();
                let max = bars.iter().map(|b| b.open_time).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(pair: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        pair: pair.to_string(),
        open_time: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close,
        low: close,
        close,
        volume: 1000.0,
    }
}

/// Daily bars for a pair starting at `start`, one close per element.
pub fn daily_bars(pair: &str, start: NaiveDateTime, closes: &[f64]) -> Vec<OhlcvBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            pair: pair.to_string(),
            open_time: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}
