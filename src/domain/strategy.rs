//! The strategy capability: a pluggable per-step decision policy.

use super::error::CoinsimError;
use super::simulation::Simulation;

/// A concrete trading policy, invoked once per panel timestamp by
/// [`Simulation::run`](super::simulation::Simulation::run).
///
/// Strategies act on the portfolio only through the simulation's trade API;
/// all shared behavior (valuation, event recording, contribution tracking)
/// lives there. A strategy keeps only its own decision state, e.g. a
/// rebalance countdown or the last triggered risk bucket.
pub trait Strategy {
    fn name(&self) -> String;

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError>;
}
