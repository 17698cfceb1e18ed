//! Buy-and-hold: all in at the first timestamp, never trade again.

use crate::domain::error::CoinsimError;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

#[derive(Debug, Default)]
pub struct HoldStrategy;

impl HoldStrategy {
    pub fn new() -> Self {
        HoldStrategy
    }
}

impl Strategy for HoldStrategy {
    fn name(&self) -> String {
        "hold".to_string()
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        if sim.step() == 0 {
            sim.buy()?;
        }
        Ok(())
    }
}
