//! Stepwise strategy simulation state machine.
//!
//! A [`Simulation`] walks the price panel's timeline in order, invoking a
//! strategy hook once per timestamp and recording the portfolio valuation
//! after that step's trades. Strategies drive the portfolio only through the
//! trade API here, which also records buy/sell events and the running total
//! of contributed cash.

use chrono::NaiveDateTime;
use tracing::debug;

use super::error::CoinsimError;
use super::panel::PricePanel;
use super::portfolio::{Portfolio, TradeOutcome};
use super::strategy::Strategy;

pub const BTC_PAIR: &str = "BTCUSDT";

/// Summary of a finished (or in-flight) run. Pure read; two calls without an
/// intervening step return identical values.
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub final_valuation: f64,
    /// Final valuation denominated in BTC, when the panel tracks BTCUSDT.
    pub final_in_btc: Option<f64>,
    pub total_contributed: f64,
    /// Final valuation over total contributed cash; 0 when nothing was ever
    /// contributed.
    pub roi: f64,
    pub buys: usize,
    pub sells: usize,
}

/// One strategy run over a price panel: step index, current timestamp, the
/// portfolio, and the per-step recording arrays.
///
/// The step loop is strictly sequential. No timestamp is skipped or
/// reordered, so strategy state only ever observes monotonically increasing
/// time.
pub struct Simulation<'a> {
    panel: &'a PricePanel,
    portfolio: Portfolio,
    step: usize,
    current_time: NaiveDateTime,
    valuations: Vec<f64>,
    bought: Vec<NaiveDateTime>,
    sold: Vec<NaiveDateTime>,
    total_contributed: f64,
}

impl<'a> Simulation<'a> {
    /// Start a run at the panel's first timestamp. The portfolio's starting
    /// cash counts as contributed capital.
    pub fn new(panel: &'a PricePanel, portfolio: Portfolio) -> Self {
        let total_contributed = portfolio.cash;
        Simulation {
            panel,
            portfolio,
            step: 0,
            current_time: panel.timestamps()[0],
            valuations: Vec::with_capacity(panel.len()),
            bought: Vec::new(),
            sold: Vec::new(),
            total_contributed,
        }
    }

    /// Advance through every remaining timestamp. Per step: invoke the
    /// strategy, then record the valuation, then move on. Recording happens
    /// strictly after the step's trades, so the history reflects the state
    /// the step left behind.
    pub fn run(&mut self, strategy: &mut dyn Strategy) -> Result<(), CoinsimError> {
        while !self.is_done() {
            self.step_once(strategy)?;
        }
        Ok(())
    }

    /// Execute exactly one step. A no-op once the run is done.
    pub fn step_once(&mut self, strategy: &mut dyn Strategy) -> Result<(), CoinsimError> {
        if self.is_done() {
            return Ok(());
        }
        self.current_time = self.panel.timestamps()[self.step];
        strategy.execute_step(self)?;
        let valuation = self.portfolio.valuation(self.panel, self.current_time)?;
        self.valuations.push(valuation);
        self.step += 1;
        Ok(())
    }

    pub fn is_done(&self) -> bool {
        self.step == self.panel.len()
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current_time(&self) -> NaiveDateTime {
        self.current_time
    }

    pub fn panel(&self) -> &PricePanel {
        self.panel
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn valuations(&self) -> &[f64] {
        &self.valuations
    }

    pub fn bought(&self) -> &[NaiveDateTime] {
        &self.bought
    }

    pub fn sold(&self) -> &[NaiveDateTime] {
        &self.sold
    }

    pub fn total_contributed(&self) -> f64 {
        self.total_contributed
    }

    /// Spend all cash on an even split across the panel's pairs. With no
    /// cash this is a routine no-op: no event, `NoCash` sentinel.
    pub fn buy(&mut self) -> Result<TradeOutcome, CoinsimError> {
        if self.portfolio.cash == 0.0 {
            debug!(step = self.step, timestamp = %self.current_time, "buy requested with no cash");
            return Ok(TradeOutcome::NoCash);
        }
        let cash = self.portfolio.cash;
        self.portfolio
            .allocate_equal(cash, self.panel, self.current_time)?;
        self.bought.push(self.current_time);
        Ok(TradeOutcome::Executed)
    }

    /// Liquidate every holding to cash. With nothing held this is a routine
    /// no-op: no event, `NothingToSell` sentinel.
    pub fn sell(&mut self) -> Result<TradeOutcome, CoinsimError> {
        match self.portfolio.liquidate_all(self.panel, self.current_time)? {
            TradeOutcome::NothingToSell => Ok(TradeOutcome::NothingToSell),
            _ => {
                self.sold.push(self.current_time);
                Ok(TradeOutcome::Executed)
            }
        }
    }

    /// Rebalance so that `fraction` of the total valuation is held in coins
    /// and the rest in cash. Records a buy event for a positive fraction and
    /// a sell event for zero, since zero is a full exit.
    pub fn buy_fraction(&mut self, fraction: f64) -> Result<TradeOutcome, CoinsimError> {
        self.portfolio
            .partial_rebalance(fraction, self.panel, self.current_time)?;
        if fraction > 0.0 {
            self.bought.push(self.current_time);
        } else {
            self.sold.push(self.current_time);
        }
        Ok(TradeOutcome::Executed)
    }

    /// Inverse of [`buy_fraction`](Self::buy_fraction): keep `fraction` of
    /// the total valuation in cash.
    pub fn sell_fraction(&mut self, fraction: f64) -> Result<TradeOutcome, CoinsimError> {
        self.buy_fraction(1.0 - fraction)
    }

    /// Re-split the full valuation evenly across pairs without recording any
    /// event. Periodic rebalancing is bookkeeping, not a trade signal.
    pub fn rebalance(&mut self) -> Result<(), CoinsimError> {
        self.portfolio
            .partial_rebalance(1.0, self.panel, self.current_time)?;
        Ok(())
    }

    /// Inject fresh external cash straight into holdings and count it toward
    /// the contribution total. A zero amount is skipped entirely; a no-op
    /// should not look like a trade in the event stream.
    pub fn buy_additional(&mut self, usd: f64) -> Result<(), CoinsimError> {
        if usd == 0.0 {
            debug!(step = self.step, timestamp = %self.current_time, "zero-sized injection skipped");
            return Ok(());
        }
        self.portfolio
            .buy_additional(usd, self.panel, self.current_time)?;
        self.total_contributed += usd;
        self.bought.push(self.current_time);
        Ok(())
    }

    pub fn stats(&self) -> RunStats {
        let final_valuation = self.valuations.last().copied().unwrap_or(0.0);
        let final_in_btc = if self.panel.tracks(BTC_PAIR) {
            self.panel
                .close(BTC_PAIR, self.current_time)
                .ok()
                .map(|close| final_valuation / close)
        } else {
            None
        };
        let roi = if self.total_contributed == 0.0 {
            0.0
        } else {
            final_valuation / self.total_contributed
        };
        RunStats {
            final_valuation,
            final_in_btc,
            total_contributed: self.total_contributed,
            roi,
            buys: self.bought.len(),
            sells: self.sold.len(),
        }
    }
}
