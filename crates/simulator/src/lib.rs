//! Position ledger and trade simulator.
//!
//! This crate provides:
//! - [`TradeSimulator`]: side selection, guarded simulated execution, bulk exit
//! - [`Position`] / [`ExitSummary`]: the records it produces
//! - [`FillModel`]: the injected sampling source for entry price and P&L

pub mod fill;
pub mod position;
pub mod simulator;

pub use fill::{Fill, FillModel, ScriptedFillModel, UniformFillModel};
pub use position::{ExitSummary, PnlOutcome, Position, Side};
pub use simulator::{PendingTrade, SimulatorStats, TradeError, TradeSimulator};
