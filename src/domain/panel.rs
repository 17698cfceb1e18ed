//! Gap-free multi-pair price panel.

use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use super::error::CoinsimError;
use super::ohlcv::{OhlcvBar, SampleInterval};

/// Normalized multi-pair OHLCV series sharing one timeline.
///
/// Invariant: every tracked pair holds exactly one bar for every timestamp on
/// the timeline, and the timeline is strictly increasing with uniform spacing
/// at the configured interval. Construction intersects the per-pair timelines
/// and rejects anything that would leave a hole, so price lookups during a
/// simulation can treat a miss as a programming error.
#[derive(Debug, Clone)]
pub struct PricePanel {
    pairs: Vec<String>,
    timestamps: Vec<NaiveDateTime>,
    interval: SampleInterval,
    series: HashMap<String, Vec<OhlcvBar>>,
    time_index: HashMap<NaiveDateTime, usize>,
}

impl PricePanel {
    /// Build a panel from per-pair bar series, in roster order.
    ///
    /// Timestamps not present in every series are trimmed (the count is
    /// logged per pair). Fails on an empty roster, a pair with no bars, no
    /// common timestamps, duplicate timestamps within one pair, or a common
    /// timeline whose spacing deviates from `interval`.
    pub fn from_bars(
        series: Vec<(String, Vec<OhlcvBar>)>,
        interval: SampleInterval,
    ) -> Result<Self, CoinsimError> {
        if series.is_empty() {
            return Err(CoinsimError::Data {
                reason: "price panel needs at least one pair".into(),
            });
        }

        for (pair, bars) in &series {
            if bars.is_empty() {
                return Err(CoinsimError::NoData {
                    pair: pair.clone(),
                    interval: interval.to_string(),
                });
            }
        }

        let mut common: BTreeSet<NaiveDateTime> =
            series[0].1.iter().map(|b| b.open_time).collect();
        for (_, bars) in series.iter().skip(1) {
            let times: BTreeSet<NaiveDateTime> = bars.iter().map(|b| b.open_time).collect();
            common.retain(|t| times.contains(t));
        }

        if common.is_empty() {
            return Err(CoinsimError::Data {
                reason: "no timestamps common to all pairs".into(),
            });
        }

        let timestamps: Vec<NaiveDateTime> = common.iter().copied().collect();
        let step = interval.duration();
        for window in timestamps.windows(2) {
            if window[1] - window[0] != step {
                return Err(CoinsimError::Data {
                    reason: format!(
                        "timeline gap between {} and {} (expected {} spacing)",
                        window[0], window[1], interval
                    ),
                });
            }
        }

        let mut pairs = Vec::with_capacity(series.len());
        let mut aligned: HashMap<String, Vec<OhlcvBar>> = HashMap::new();
        for (pair, bars) in series {
            if aligned.contains_key(&pair) {
                return Err(CoinsimError::Data {
                    reason: format!("duplicate pair {pair} in panel input"),
                });
            }

            let total = bars.len();
            let mut kept: Vec<OhlcvBar> = bars
                .into_iter()
                .filter(|b| common.contains(&b.open_time))
                .collect();
            kept.sort_by_key(|b| b.open_time);
            let in_common = kept.len();
            kept.dedup_by_key(|b| b.open_time);
            if kept.len() != in_common {
                return Err(CoinsimError::Data {
                    reason: format!("duplicate timestamps in {pair} series"),
                });
            }

            if total > kept.len() {
                debug!(pair = %pair, dropped = total - kept.len(), "trimmed rows not common to all pairs");
            }

            pairs.push(pair.clone());
            aligned.insert(pair, kept);
        }

        let time_index: HashMap<NaiveDateTime, usize> = timestamps
            .iter()
            .enumerate()
            .map(|(i, t)| (*t, i))
            .collect();

        Ok(PricePanel {
            pairs,
            timestamps,
            interval,
            series: aligned,
            time_index,
        })
    }

    pub fn pairs(&self) -> &[String] {
        &self.pairs
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn interval(&self) -> SampleInterval {
        self.interval
    }

    /// Number of timestamps on the timeline.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn tracks(&self, pair: &str) -> bool {
        self.series.contains_key(pair)
    }

    /// Full bar for a pair at a timestamp. A miss means the caller broke the
    /// panel invariant, so the error is a programming-error signal.
    pub fn bar(&self, pair: &str, timestamp: NaiveDateTime) -> Result<&OhlcvBar, CoinsimError> {
        let idx = self
            .time_index
            .get(&timestamp)
            .copied()
            .ok_or(CoinsimError::MissingPrice {
                pair: pair.to_string(),
                timestamp,
            })?;
        self.series
            .get(pair)
            .map(|bars| &bars[idx])
            .ok_or(CoinsimError::MissingPrice {
                pair: pair.to_string(),
                timestamp,
            })
    }

    /// Close price for a pair at a timestamp.
    pub fn close(&self, pair: &str, timestamp: NaiveDateTime) -> Result<f64, CoinsimError> {
        self.bar(pair, timestamp).map(|b| b.close)
    }
}
