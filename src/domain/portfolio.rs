//! Portfolio ledger: cash plus per-pair holdings.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use tracing::debug;

use super::error::CoinsimError;
use super::panel::PricePanel;

/// Outcome of a trade operation. Routine no-ops (nothing to sell, no cash
/// to spend) are reported here so the simulation can continue; they are
/// never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeOutcome {
    Executed,
    NoCash,
    NothingToSell,
}

/// Cash in USD plus per-pair quantities. Quantities and cash never go
/// negative: every operation either spends what is there or converts
/// holdings at the current close.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub holdings: HashMap<String, f64>,
}

impl Portfolio {
    /// A portfolio tracking `pairs`, all quantities zero.
    pub fn new(cash: f64, pairs: &[String]) -> Self {
        Portfolio {
            cash,
            holdings: pairs.iter().map(|p| (p.clone(), 0.0)).collect(),
        }
    }

    pub fn quantity(&self, pair: &str) -> f64 {
        self.holdings.get(pair).copied().unwrap_or(0.0)
    }

    pub fn has_holdings(&self) -> bool {
        self.holdings.values().any(|&q| q > 0.0)
    }

    /// Implied USD value: cash + Σ holdings × close. Pure.
    pub fn valuation(&self, panel: &PricePanel, t: NaiveDateTime) -> Result<f64, CoinsimError> {
        let mut total = self.cash;
        for (pair, qty) in &self.holdings {
            if *qty > 0.0 {
                total += qty * panel.close(pair, t)?;
            }
        }
        Ok(total)
    }

    /// Convert every positive holding to cash at the current close.
    pub fn liquidate_all(
        &mut self,
        panel: &PricePanel,
        t: NaiveDateTime,
    ) -> Result<TradeOutcome, CoinsimError> {
        if !self.has_holdings() {
            debug!(timestamp = %t, "liquidate requested with no holdings");
            return Ok(TradeOutcome::NothingToSell);
        }
        for (pair, qty) in self.holdings.iter_mut() {
            if *qty > 0.0 {
                self.cash += *qty * panel.close(pair, t)?;
                *qty = 0.0;
            }
        }
        Ok(TradeOutcome::Executed)
    }

    /// Spend `cash_to_spend` evenly across all tracked pairs, converting to
    /// units at each pair's close, and deduct it from cash.
    pub fn allocate_equal(
        &mut self,
        cash_to_spend: f64,
        panel: &PricePanel,
        t: NaiveDateTime,
    ) -> Result<(), CoinsimError> {
        let n = self.holdings.len();
        if n == 0 {
            return Err(CoinsimError::Data {
                reason: "portfolio tracks no pairs".into(),
            });
        }
        let per_pair = cash_to_spend / n as f64;
        for (pair, qty) in self.holdings.iter_mut() {
            *qty += per_pair / panel.close(pair, t)?;
        }
        self.cash -= cash_to_spend;
        Ok(())
    }

    /// Liquidate everything, then re-allocate `fraction` of the total
    /// valuation evenly across pairs, leaving the rest in cash.
    ///
    /// Always re-derives from total valuation, never from prior holdings, so
    /// repeating the call with the same fraction and timestamp reproduces the
    /// same split. Buy, sell, and every partial are derived from this one
    /// operation.
    pub fn partial_rebalance(
        &mut self,
        fraction: f64,
        panel: &PricePanel,
        t: NaiveDateTime,
    ) -> Result<(), CoinsimError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(CoinsimError::InvalidFraction { fraction });
        }
        self.liquidate_all(panel, t)?;
        let to_spend = self.cash * fraction;
        self.allocate_equal(to_spend, panel, t)
    }

    /// Inject fresh external cash straight into holdings, split evenly. The
    /// amount never passes through `cash`; tracking the contribution total is
    /// the caller's job.
    pub fn buy_additional(
        &mut self,
        cash_amount: f64,
        panel: &PricePanel,
        t: NaiveDateTime,
    ) -> Result<(), CoinsimError> {
        let n = self.holdings.len();
        if n == 0 {
            return Err(CoinsimError::Data {
                reason: "portfolio tracks no pairs".into(),
            });
        }
        let per_pair = cash_amount / n as f64;
        for (pair, qty) in self.holdings.iter_mut() {
            *qty += per_pair / panel.close(pair, t)?;
        }
        Ok(())
    }
}
