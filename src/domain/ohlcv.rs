//! OHLCV kline representation and sampling intervals.

use chrono::{Duration, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub pair: String,
    pub open_time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Sampling interval of a kline series. Crypto markets trade continuously,
/// so intervals are fixed wall-clock durations rather than trading days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleInterval {
    OneDay,
    FourHours,
    OneHour,
    ThirtyMinutes,
    FifteenMinutes,
    FiveMinutes,
}

impl SampleInterval {
    /// Parse an interval name like `1d` or `5m`. Returns `None` for
    /// anything unsupported.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Some(SampleInterval::OneDay),
            "4h" => Some(SampleInterval::FourHours),
            "1h" => Some(SampleInterval::OneHour),
            "30m" => Some(SampleInterval::ThirtyMinutes),
            "15m" => Some(SampleInterval::FifteenMinutes),
            "5m" => Some(SampleInterval::FiveMinutes),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SampleInterval::OneDay => "1d",
            SampleInterval::FourHours => "4h",
            SampleInterval::OneHour => "1h",
            SampleInterval::ThirtyMinutes => "30m",
            SampleInterval::FifteenMinutes => "15m",
            SampleInterval::FiveMinutes => "5m",
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            SampleInterval::OneDay => Duration::days(1),
            SampleInterval::FourHours => Duration::hours(4),
            SampleInterval::OneHour => Duration::hours(1),
            SampleInterval::ThirtyMinutes => Duration::minutes(30),
            SampleInterval::FifteenMinutes => Duration::minutes(15),
            SampleInterval::FiveMinutes => Duration::minutes(5),
        }
    }
}

impl std::fmt::Display for SampleInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
