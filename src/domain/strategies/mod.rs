//! Concrete strategy variants, each a small decision policy layered on the
//! simulation's trade API.

pub mod hold;
pub mod rebalance;
pub mod dca;
pub mod dca_risk;
pub mod risk_threshold;
pub mod extrema;
pub mod combined;

pub use combined::CombinedStrategy;
pub use dca::DcaStrategy;
pub use dca_risk::{DcaLadder, DcaRiskStrategy};
pub use extrema::{ExtremaMode, ExtremaStrategy};
pub use hold::HoldStrategy;
pub use rebalance::RebalanceStrategy;
pub use risk_threshold::{RiskBucket, RiskThresholdStrategy};
