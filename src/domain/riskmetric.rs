//! Risk metric engine: a bounded [0,1] overbought/oversold score derived
//! from moving-average ratios over a daily price series.
//!
//! The raw signal is the ratio of a short to a long rolling mean of the
//! close, optionally adjusted for diminishing returns and volume
//! correlation, then min-max normalized against the *running* cumulative
//! min/max. The normalization is causal: a score at time t never uses
//! information from later timestamps. Extrema detection is the one batch
//! step — candidate flags need the full series, and confirmed flags model
//! the lag before an extremum becomes knowable.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;

use super::error::CoinsimError;
use super::ohlcv::OhlcvBar;

/// Short rolling-mean window in days.
pub const SHORT_MA_DAYS: usize = 50;
/// Long rolling-mean window in days.
pub const LONG_MA_DAYS: usize = SHORT_MA_DAYS * 7;
/// Rolling-mean window for the volume-correlation adjustment.
pub const VOLUME_MA_DAYS: usize = 7;
/// Neighbors checked on each side for local extrema.
pub const EXTREMA_WINDOW: usize = 5;

/// First recorded bitcoin exchange activity, the reference epoch for the
/// diminishing-returns adjustment.
pub fn first_bitcoin_exchange() -> NaiveDate {
    NaiveDate::from_ymd_opt(2009, 1, 12).unwrap()
}

/// Independent toggles for the optional risk adjustments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RiskMetricOptimizations {
    /// Multiply raw risk by ln(days since the bitcoin epoch), dampening
    /// early-history noise. Deliberately unclamped; see the near-epoch
    /// tests for what happens at the boundary.
    pub diminishing_returns: bool,
    /// Shift risk by up to ±10% based on whether the 7-day volume mean is
    /// at a historical extreme.
    pub volume_correlation: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskPoint {
    pub timestamp: NaiveDateTime,
    /// Normalized risk score in [0,1].
    pub score: f64,
    /// The close the score was derived from.
    pub price: f64,
    /// Candidate local minimum: score ≤ every score within ±EXTREMA_WINDOW.
    /// Look-ahead; only usable for upper-bound experiments.
    pub local_min: bool,
    pub local_max: bool,
    /// Candidate flag shifted forward by EXTREMA_WINDOW steps: the earliest
    /// step at which the extremum is actually knowable.
    pub confirmed_min: bool,
    pub confirmed_max: bool,
}

/// Immutable, timestamp-indexed risk series. Computed once per run and
/// shared read-only by risk-based strategies.
#[derive(Debug, Clone)]
pub struct RiskMetricSeries {
    points: Vec<RiskPoint>,
    time_index: HashMap<NaiveDateTime, usize>,
}

impl RiskMetricSeries {
    /// Compute the series from a daily bar series, already sorted ascending.
    ///
    /// Points whose normalization is undefined are dropped: at least the
    /// first point (zero cumulative spread), the volume warmup when that
    /// adjustment is on, and anything poisoned by a non-finite adjustment.
    /// The returned series may therefore start later than `bars` does, or
    /// even be empty for degenerate input.
    pub fn compute(
        bars: &[OhlcvBar],
        optimizations: RiskMetricOptimizations,
    ) -> Result<Self, CoinsimError> {
        if bars.is_empty() {
            return Err(CoinsimError::Data {
                reason: "risk metric needs a non-empty bar series".into(),
            });
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let short_ma = rolling_mean_partial(&closes, SHORT_MA_DAYS);
        let long_ma = rolling_mean_partial(&closes, LONG_MA_DAYS);

        let mut risk: Vec<f64> = short_ma
            .iter()
            .zip(&long_ma)
            .map(|(s, l)| s / l)
            .collect();

        if optimizations.diminishing_returns {
            let epoch = first_bitcoin_exchange();
            for (r, bar) in risk.iter_mut().zip(bars) {
                let days = (bar.open_time.date() - epoch).num_days() as f64;
                *r *= days.ln();
            }
        }

        if optimizations.volume_correlation {
            let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
            let vol_ma = rolling_mean_full(&volumes, VOLUME_MA_DAYS);
            let vol_norm = running_minmax_normalize(&vol_ma);
            // Normalize risk first so the volume term moves it on the same
            // [0,1] scale, by at most ±0.1.
            let risk_norm = running_minmax_normalize(&risk);
            risk = risk_norm
                .iter()
                .zip(&vol_norm)
                .map(|(r, v)| r + (v - 0.5) * 0.2)
                .collect();
        }

        let scores = running_minmax_normalize(&risk);

        let kept: Vec<(usize, f64)> = scores
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .map(|(i, s)| (i, *s))
            .collect();

        let mut points: Vec<RiskPoint> = kept
            .iter()
            .map(|&(i, score)| RiskPoint {
                timestamp: bars[i].open_time,
                score,
                price: bars[i].close,
                local_min: false,
                local_max: false,
                confirmed_min: false,
                confirmed_max: false,
            })
            .collect();

        mark_extrema(&mut points);

        let time_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.timestamp, i))
            .collect();

        Ok(RiskMetricSeries { points, time_index })
    }

    /// Wrap an already-computed point series, e.g. scripted fixtures or a
    /// series precomputed by an external collaborator. Points must be sorted
    /// ascending with unique timestamps.
    pub fn from_points(points: Vec<RiskPoint>) -> Self {
        let time_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.timestamp, i))
            .collect();
        RiskMetricSeries { points, time_index }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[RiskPoint] {
        &self.points
    }

    /// Trim to `[start, end]` (inclusive), keeping the flags computed over
    /// the full history. Used to cut warmup history down to the simulated
    /// range.
    pub fn slice(&self, start: NaiveDateTime, end: NaiveDateTime) -> RiskMetricSeries {
        let points: Vec<RiskPoint> = self
            .points
            .iter()
            .filter(|p| p.timestamp >= start && p.timestamp <= end)
            .cloned()
            .collect();
        let time_index = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.timestamp, i))
            .collect();
        RiskMetricSeries { points, time_index }
    }

    /// Full point at a timestamp. A miss is fatal: risk strategies are only
    /// rostered when the series covers the simulated range, so a gap here is
    /// a wiring bug, same class as a missing price.
    pub fn point_at(&self, timestamp: NaiveDateTime) -> Result<&RiskPoint, CoinsimError> {
        self.time_index
            .get(&timestamp)
            .map(|&i| &self.points[i])
            .ok_or(CoinsimError::MissingRiskPoint { timestamp })
    }

    pub fn score_at(&self, timestamp: NaiveDateTime) -> Result<f64, CoinsimError> {
        self.point_at(timestamp).map(|p| p.score)
    }
}

/// Rolling mean allowing partial windows: the first elements average
/// whatever history exists so far.
fn rolling_mean_partial(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let lo = (i + 1).saturating_sub(window);
            let slice = &values[lo..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// Rolling mean requiring full windows: the first `window - 1` outputs are
/// NaN and drop out of the normalization later.
fn rolling_mean_full(values: &[f64], window: usize) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                f64::NAN
            } else {
                values[i + 1 - window..=i].iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}

/// Min-max normalize against the running cumulative min/max. NaN inputs stay
/// NaN without disturbing the running extremes; a zero spread (always at
/// least the first defined point) yields NaN.
fn running_minmax_normalize(values: &[f64]) -> Vec<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                return f64::NAN;
            }
            min = min.min(v);
            max = max.max(v);
            (v - min) / (max - min)
        })
        .collect()
}

/// Flag candidate extrema over a symmetric ±EXTREMA_WINDOW comparison, then
/// derive confirmed flags by shifting candidates forward EXTREMA_WINDOW
/// steps. A point qualifying as both min and max (locally constant series)
/// is flagged as neither, keeping the flags mutually exclusive.
fn mark_extrema(points: &mut [RiskPoint]) {
    let n = points.len();
    for i in 0..n {
        let lo = i.saturating_sub(EXTREMA_WINDOW);
        let hi = (i + EXTREMA_WINDOW).min(n.saturating_sub(1));
        let score = points[i].score;
        let is_min = points[lo..=hi].iter().all(|p| score <= p.score);
        let is_max = points[lo..=hi].iter().all(|p| score >= p.score);
        if is_min != is_max {
            points[i].local_min = is_min;
            points[i].local_max = is_max;
        }
    }
    for i in (EXTREMA_WINDOW..n).rev() {
        points[i].confirmed_min = points[i - EXTREMA_WINDOW].local_min;
        points[i].confirmed_max = points[i - EXTREMA_WINDOW].local_max;
    }
}
