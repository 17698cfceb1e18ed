//! Edge-triggered allocation driven by the risk-score bucket.

use tracing::debug;

use crate::domain::error::CoinsimError;
use crate::domain::riskmetric::RiskMetricSeries;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

/// The disjoint half-open risk tiers over [0,1], plus the terminal sell tier
/// for anything at or above 0.9. Each score falls in exactly one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBucket {
    UpTo10,
    UpTo20,
    UpTo30,
    UpTo40,
    UpTo50,
    UpTo60,
    UpTo70,
    UpTo80,
    UpTo90,
    Extreme,
}

impl RiskBucket {
    pub fn from_score(score: f64) -> Self {
        if score < 0.1 {
            RiskBucket::UpTo10
        } else if score < 0.2 {
            RiskBucket::UpTo20
        } else if score < 0.3 {
            RiskBucket::UpTo30
        } else if score < 0.4 {
            RiskBucket::UpTo40
        } else if score < 0.5 {
            RiskBucket::UpTo50
        } else if score < 0.6 {
            RiskBucket::UpTo60
        } else if score < 0.7 {
            RiskBucket::UpTo70
        } else if score < 0.8 {
            RiskBucket::UpTo80
        } else if score < 0.9 {
            RiskBucket::UpTo90
        } else {
            RiskBucket::Extreme
        }
    }

    /// Position in the ladder, lowest risk first.
    pub fn index(&self) -> usize {
        match self {
            RiskBucket::UpTo10 => 0,
            RiskBucket::UpTo20 => 1,
            RiskBucket::UpTo30 => 2,
            RiskBucket::UpTo40 => 3,
            RiskBucket::UpTo50 => 4,
            RiskBucket::UpTo60 => 5,
            RiskBucket::UpTo70 => 6,
            RiskBucket::UpTo80 => 7,
            RiskBucket::UpTo90 => 8,
            RiskBucket::Extreme => 9,
        }
    }

    /// Target coin fraction of total valuation for this bucket: fully
    /// invested through 0.7, tapering off above, everything to cash at the
    /// extreme.
    pub fn allocation(&self) -> f64 {
        match self {
            RiskBucket::UpTo80 => 0.6,
            RiskBucket::UpTo90 => 0.2,
            RiskBucket::Extreme => 0.0,
            _ => 1.0,
        }
    }
}

/// Fires a one-time allocation whenever the risk score moves into a
/// different bucket. Edge-triggered: staying inside the last triggered
/// bucket does nothing, however long the score lingers there.
pub struct RiskThresholdStrategy {
    riskmetric: RiskMetricSeries,
    last_bucket: Option<RiskBucket>,
}

impl RiskThresholdStrategy {
    pub fn new(riskmetric: RiskMetricSeries) -> Self {
        RiskThresholdStrategy {
            riskmetric,
            last_bucket: None,
        }
    }
}

impl Strategy for RiskThresholdStrategy {
    fn name(&self) -> String {
        "risk-threshold".to_string()
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        let score = self.riskmetric.score_at(sim.current_time())?;
        let bucket = RiskBucket::from_score(score);
        if self.last_bucket == Some(bucket) {
            debug!(step = sim.step(), ?bucket, "risk bucket unchanged");
            return Ok(());
        }
        self.last_bucket = Some(bucket);

        let allocation = bucket.allocation();
        if allocation == 0.0 {
            sim.sell()?;
        } else {
            sim.buy_fraction(allocation)?;
        }
        Ok(())
    }
}
