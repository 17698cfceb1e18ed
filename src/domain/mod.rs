//! Core domain types and logic.

pub mod ohlcv;
pub mod panel;
pub mod portfolio;
pub mod simulation;
pub mod strategy;
pub mod strategies;
pub mod riskmetric;
pub mod backtest;
pub mod config;
pub mod config_validation;
pub mod error;
