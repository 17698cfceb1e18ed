//! Data access port trait.

use crate::domain::error::CoinsimError;
use crate::domain::ohlcv::{OhlcvBar, SampleInterval};
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Bars for one pair within `[start, end]` inclusive, sorted ascending
    /// by open time.
    fn fetch_ohlcv(
        &self,
        pair: &str,
        interval: SampleInterval,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<OhlcvBar>, CoinsimError>;

    /// Pairs the backing store has any data for, at any interval.
    fn list_pairs(&self) -> Result<Vec<String>, CoinsimError>;

    /// `(first, last, row count)` for a pair at an interval, or `None` when
    /// the store has nothing for it.
    fn data_range(
        &self,
        pair: &str,
        interval: SampleInterval,
    ) -> Result<Option<(NaiveDateTime, NaiveDateTime, usize)>, CoinsimError>;
}
