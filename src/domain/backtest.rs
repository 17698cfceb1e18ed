//! Run orchestrator: one batch of strategies over a shared panel.

use tracing::{info, warn};

use super::error::CoinsimError;
use super::panel::PricePanel;
use super::portfolio::Portfolio;
use super::simulation::{RunStats, Simulation};
use super::strategy::Strategy;
use chrono::NaiveDateTime;

/// Everything the reporting side needs about one completed strategy run.
#[derive(Debug, Clone)]
pub struct StrategyRunResult {
    pub name: String,
    /// One valuation per panel timestamp, recorded after each step's trades.
    pub valuations: Vec<f64>,
    pub bought: Vec<NaiveDateTime>,
    pub sold: Vec<NaiveDateTime>,
    pub stats: RunStats,
}

#[derive(Debug)]
pub struct FailedStrategy {
    pub name: String,
    pub error: CoinsimError,
}

#[derive(Debug)]
pub struct BacktestRunResult {
    pub results: Vec<StrategyRunResult>,
    pub failed: Vec<FailedStrategy>,
}

/// Run every strategy to completion over `panel`, each against its own clone
/// of `template` so no run can see another's mutations. A failing strategy
/// is collected and the batch continues; the caller decides whether an
/// all-failed batch is an error.
pub fn run_backtest(
    panel: &PricePanel,
    template: &Portfolio,
    strategies: Vec<Box<dyn Strategy>>,
) -> BacktestRunResult {
    let mut results = Vec::with_capacity(strategies.len());
    let mut failed = Vec::new();

    for mut strategy in strategies {
        let name = strategy.name();
        let mut sim = Simulation::new(panel, template.clone());
        match sim.run(strategy.as_mut()) {
            Ok(()) => {
                let stats = sim.stats();
                info!(
                    strategy = %name,
                    final_valuation = stats.final_valuation,
                    roi = stats.roi,
                    "strategy run complete"
                );
                results.push(StrategyRunResult {
                    name,
                    valuations: sim.valuations().to_vec(),
                    bought: sim.bought().to_vec(),
                    sold: sim.sold().to_vec(),
                    stats,
                });
            }
            Err(error) => {
                warn!(strategy = %name, %error, "strategy run failed, continuing batch");
                failed.push(FailedStrategy { name, error });
            }
        }
    }

    BacktestRunResult { results, failed }
}
