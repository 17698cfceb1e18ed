//! Composite strategy: several policies sharing one portfolio.

use crate::domain::error::CoinsimError;
use crate::domain::simulation::Simulation;
use crate::domain::strategy::Strategy;

/// Runs every child's `execute_step` in declaration order against the one
/// shared simulation each step. Useful for combined-signal experiments,
/// e.g. DCA contributions plus risk-threshold exits.
pub struct CombinedStrategy {
    children: Vec<Box<dyn Strategy>>,
}

impl CombinedStrategy {
    pub fn new(children: Vec<Box<dyn Strategy>>) -> Self {
        CombinedStrategy { children }
    }
}

impl Strategy for CombinedStrategy {
    fn name(&self) -> String {
        let names: Vec<String> = self.children.iter().map(|c| c.name()).collect();
        format!("merged:{}", names.join("+"))
    }

    fn execute_step(&mut self, sim: &mut Simulation) -> Result<(), CoinsimError> {
        for child in &mut self.children {
            child.execute_step(sim)?;
        }
        Ok(())
    }
}
