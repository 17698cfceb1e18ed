//! Periodic rebalancing: a full even re-split across pairs every N steps.

use crate::domain::config::RebalanceConfig;
use crate::domain::error::CoinsimError;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

/// Buys everything at the first step, then re-splits the full valuation
/// evenly across pairs every `interval` steps. The re-split captures
/// mean-reversion gains; it is bookkeeping rather than a signal, so it
/// records no trade events.
#[derive(Debug)]
pub struct RebalanceStrategy {
    config: RebalanceConfig,
    countdown: usize,
}

impl RebalanceStrategy {
    pub fn new(config: RebalanceConfig) -> Self {
        debug_assert!(config.interval >= 1, "interval must be at least 1");
        let countdown = config.interval;
        RebalanceStrategy { config, countdown }
    }
}

impl Strategy for RebalanceStrategy {
    fn name(&self) -> String {
        format!("rebalance{{interval: {}}}", self.config.interval)
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        if sim.step() == 0 {
            sim.buy()?;
        }
        self.countdown -= 1;
        if self.countdown == 0 {
            sim.rebalance()?;
            self.countdown = self.config.interval;
        }
        Ok(())
    }
}
