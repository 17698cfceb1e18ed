//! Dollar-cost averaging: a fixed cash injection every N steps.

use crate::domain::config::DcaConfig;
use crate::domain::error::CoinsimError;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

/// Injects `base_amount` USD of fresh capital every `interval` steps,
/// regardless of price. The contribution counter in the simulation keeps the
/// ROI honest against the growing invested total.
#[derive(Debug)]
pub struct DcaStrategy {
    config: DcaConfig,
    countdown: usize,
}

impl DcaStrategy {
    pub fn new(config: DcaConfig) -> Self {
        debug_assert!(config.interval >= 1, "interval must be at least 1");
        let countdown = config.interval;
        DcaStrategy { config, countdown }
    }
}

impl Strategy for DcaStrategy {
    fn name(&self) -> String {
        format!("dca{{interval: {}}}", self.config.interval)
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        self.countdown -= 1;
        if self.countdown == 0 {
            sim.buy_additional(self.config.base_amount)?;
            self.countdown = self.config.interval;
        }
        Ok(())
    }
}
