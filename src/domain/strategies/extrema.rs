//! Extrema-following: buy at local risk minima, sell at local maxima.

use crate::domain::error::CoinsimError;
use crate::domain::riskmetric::RiskMetricSeries;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

/// Which extrema flags to trade on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremaMode {
    /// Immediate candidate flags. These look ahead (a point is only a local
    /// minimum relative to its future neighbors), so this mode is an
    /// upper-bound experiment, not a realistic simulation.
    Ideal,
    /// Flags lagged by the detection window: trade when the extremum has
    /// actually become knowable.
    Confirmed,
}

pub struct ExtremaStrategy {
    riskmetric: RiskMetricSeries,
    mode: ExtremaMode,
}

impl ExtremaStrategy {
    pub fn new(riskmetric: RiskMetricSeries, mode: ExtremaMode) -> Self {
        ExtremaStrategy { riskmetric, mode }
    }
}

impl Strategy for ExtremaStrategy {
    fn name(&self) -> String {
        match self.mode {
            ExtremaMode::Ideal => "extrema-ideal".to_string(),
            ExtremaMode::Confirmed => "extrema-confirmed".to_string(),
        }
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        let point = self.riskmetric.point_at(sim.current_time())?;
        let (at_min, at_max) = match self.mode {
            ExtremaMode::Ideal => (point.local_min, point.local_max),
            ExtremaMode::Confirmed => (point.confirmed_min, point.confirmed_max),
        };
        if at_min {
            sim.buy()?;
        } else if at_max {
            sim.sell()?;
        }
        Ok(())
    }
}
