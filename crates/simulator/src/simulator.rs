//! Trade simulator: open positions, simulated executions and bulk exit.
//!
//! There is no venue behind this module. A trade is validated and marked
//! in flight synchronously, then settles after a fixed delay with a sampled
//! fill. While a trade is in flight, new submissions are rejected rather
//! than queued.
//!
//! # Example
//!
//! ```
//! use arcadia_core::SimulatorConfig;
//! use arcadia_simulator::{Side, TradeSimulator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), arcadia_simulator::TradeError> {
//!     let config = SimulatorConfig::with_seed(1).settlement_delay_ms(0);
//!     let simulator = TradeSimulator::new(config)?;
//!
//!     simulator.select_side(Side::Buy);
//!     let position = simulator.execute_trade(2.5).await?;
//!     assert_eq!(position.amount, 2.5);
//!
//!     let summary = simulator.exit_all();
//!     assert_eq!(summary.closed, 1);
//!     Ok(())
//! }
//! ```

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use arcadia_core::{Notification, SimulatorConfig};

use crate::fill::{FillModel, UniformFillModel};
use crate::position::{ExitSummary, PnlOutcome, Position, Side};

/// Buffered notifications per subscriber before the oldest are dropped.
const NOTIFICATION_CAPACITY: usize = 64;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TradeError {
    #[error("Please enter a valid amount: {0}")]
    InvalidAmount(String),

    #[error("Select buy or sell before trading")]
    NoSideSelected,

    #[error("A trade is already being processed")]
    AlreadyProcessing,

    #[error("Invalid simulator configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Default)]
struct SimState {
    positions: Vec<Position>,
    pending_side: Option<Side>,
    pending_amount: Option<f64>,
    processing: bool,
    realized_pnl: f64,
    trades_executed: u64,
}

struct Inner {
    config: SimulatorConfig,
    state: RwLock<SimState>,
    fills: Mutex<Box<dyn FillModel>>,
    notifications: broadcast::Sender<Notification>,
}

impl Inner {
    fn notify(&self, notification: Notification) {
        let notification = notification.with_image(self.config.notification_image.clone());
        // No subscribers is fine.
        let _ = self.notifications.send(notification);
    }
}

/// Session statistics for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorStats {
    pub open_positions: usize,
    pub trades_executed: u64,
    pub unrealized_pnl: f64,
    pub realized_pnl: f64,
}

/// Clears `processing` if a pending trade is dropped before settling.
struct ProcessingGuard {
    inner: Arc<Inner>,
    armed: bool,
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!("Pending trade dropped before settlement");
            self.inner.state.write().processing = false;
        }
    }
}

// =============================================================================
// Pending Trade
// =============================================================================

/// A validated trade waiting for its settlement delay.
///
/// The simulator stays in `processing` until this is settled or dropped.
#[must_use = "a pending trade does nothing until settled"]
pub struct PendingTrade {
    side: Side,
    amount: f64,
    guard: ProcessingGuard,
}

impl PendingTrade {
    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Waits for the settlement delay, records the position and returns it.
    pub async fn settle(mut self) -> Position {
        let inner = Arc::clone(&self.guard.inner);
        tokio::time::sleep(Duration::from_millis(inner.config.settlement_delay_ms)).await;

        let fill = inner.fills.lock().next_fill(self.side, self.amount);
        let position = Position::new(self.side, self.amount, fill.entry_price, fill.pnl);

        {
            let mut state = inner.state.write();
            state.positions.push(position.clone());
            state.pending_amount = None;
            state.trades_executed += 1;
            state.processing = false;
            self.guard.armed = false;
        }

        debug!(
            side = %position.side,
            amount = position.amount,
            entry_price = position.entry_price,
            pnl = position.pnl,
            "Simulated trade settled"
        );
        inner.notify(Notification::info(format!(
            "{} {} ${} at {:.4}",
            position.side.verb(),
            position.amount,
            inner.config.ticker,
            position.entry_price
        )));

        position
    }
}

impl std::fmt::Debug for PendingTrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTrade")
            .field("side", &self.side)
            .field("amount", &self.amount)
            .finish()
    }
}

// =============================================================================
// Trade Simulator
// =============================================================================

/// Handle to one session's simulated trading venue. Clones share state.
#[derive(Clone)]
pub struct TradeSimulator {
    inner: Arc<Inner>,
}

impl TradeSimulator {
    /// Creates a simulator sampling fills from the configured ranges.
    ///
    /// # Errors
    ///
    /// Returns [`TradeError::InvalidConfig`] if a sampling range is invalid.
    pub fn new(config: SimulatorConfig) -> Result<Self, TradeError> {
        let fills = UniformFillModel::from_config(&config).map_err(TradeError::InvalidConfig)?;
        Ok(Self::with_fill_model(config, Box::new(fills)))
    }

    /// Creates a simulator with an explicit fill source.
    #[must_use]
    pub fn with_fill_model(config: SimulatorConfig, fills: Box<dyn FillModel>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                config,
                state: RwLock::new(SimState::default()),
                fills: Mutex::new(fills),
                notifications,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SimulatorConfig {
        &self.inner.config
    }

    /// Receives every notification emitted after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifications.subscribe()
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    /// Snapshot of open positions in execution order.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        self.inner.state.read().positions.clone()
    }

    #[must_use]
    pub fn pending_side(&self) -> Option<Side> {
        self.inner.state.read().pending_side
    }

    #[must_use]
    pub fn pending_amount(&self) -> Option<f64> {
        self.inner.state.read().pending_amount
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.inner.state.read().processing
    }

    /// Sum of `pnl` over open positions.
    #[must_use]
    pub fn unrealized_pnl(&self) -> f64 {
        self.inner.state.read().positions.iter().map(|p| p.pnl).sum()
    }

    /// P&L accumulated by every `exit_all` so far.
    #[must_use]
    pub fn realized_pnl(&self) -> f64 {
        self.inner.state.read().realized_pnl
    }

    #[must_use]
    pub fn stats(&self) -> SimulatorStats {
        let state = self.inner.state.read();
        SimulatorStats {
            open_positions: state.positions.len(),
            trades_executed: state.trades_executed,
            unrealized_pnl: state.positions.iter().map(|p| p.pnl).sum(),
            realized_pnl: state.realized_pnl,
        }
    }

    // -------------------------------------------------------------------------
    // Mutators
    // -------------------------------------------------------------------------

    pub fn select_side(&self, side: Side) {
        self.inner.state.write().pending_side = Some(side);
    }

    /// Stores the amount typed by the user for a later [`Self::execute_pending`].
    pub fn stage_amount(&self, amount: f64) {
        self.inner.state.write().pending_amount = Some(amount);
    }

    /// Validates a trade and marks the simulator as processing.
    ///
    /// Everything here happens before the first suspension point, so a
    /// second submission is rejected for the whole settlement window.
    ///
    /// # Errors
    ///
    /// - [`TradeError::InvalidAmount`] unless `amount` is finite and positive
    /// - [`TradeError::NoSideSelected`] if no side was selected
    /// - [`TradeError::AlreadyProcessing`] while another trade is in flight
    pub fn begin_trade(&self, amount: f64) -> Result<PendingTrade, TradeError> {
        let admitted = {
            let mut state = self.inner.state.write();
            let checked = validate(&state, amount);
            if checked.is_ok() {
                state.processing = true;
            }
            checked
        };

        match admitted {
            Ok(side) => {
                info!(side = %side, amount, "Simulated trade submitted");
                Ok(PendingTrade {
                    side,
                    amount,
                    guard: ProcessingGuard {
                        inner: Arc::clone(&self.inner),
                        armed: true,
                    },
                })
            }
            Err(e) => Err(self.reject(e)),
        }
    }

    /// Validates, waits for settlement, and records a new position.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_trade`].
    pub async fn execute_trade(&self, amount: f64) -> Result<Position, TradeError> {
        let pending = self.begin_trade(amount)?;
        Ok(pending.settle().await)
    }

    /// Executes with the staged amount.
    ///
    /// # Errors
    ///
    /// [`TradeError::InvalidAmount`] if nothing is staged, otherwise as [`Self::execute_trade`].
    pub async fn execute_pending(&self) -> Result<Position, TradeError> {
        let staged = self.pending_amount();
        match staged {
            Some(amount) => self.execute_trade(amount).await,
            None => Err(self.reject(TradeError::InvalidAmount("no amount entered".to_string()))),
        }
    }

    /// Closes every open position and reports the aggregate P&L.
    ///
    /// No-op with a zero, `Flat` summary when nothing is open.
    pub fn exit_all(&self) -> ExitSummary {
        let summary = {
            let mut state = self.inner.state.write();
            if state.positions.is_empty() {
                return ExitSummary::empty();
            }
            let aggregate: f64 = state.positions.iter().map(|p| p.pnl).sum();
            let closed = state.positions.len();
            state.positions.clear();
            state.realized_pnl += aggregate;
            ExitSummary::new(aggregate, closed)
        };

        info!(
            closed = summary.closed,
            aggregate_pnl = summary.aggregate_pnl,
            outcome = %summary.outcome,
            "Exited all positions"
        );

        let notification = match summary.outcome {
            PnlOutcome::Profit => Notification::info(format!(
                "Exited {} positions with a profit of {:.2}",
                summary.closed, summary.aggregate_pnl
            )),
            PnlOutcome::Loss => Notification::warning(format!(
                "Exited {} positions with a loss of {:.2}",
                summary.closed,
                summary.aggregate_pnl.abs()
            )),
            PnlOutcome::Flat => {
                Notification::info(format!("Exited {} positions at break-even", summary.closed))
            }
        };
        self.inner.notify(notification);

        summary
    }

    fn reject(&self, error: TradeError) -> TradeError {
        warn!(error = %error, "Simulated trade rejected");
        self.inner.notify(Notification::error(error.to_string()));
        error
    }
}

impl std::fmt::Debug for TradeSimulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TradeSimulator")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.read())
            .finish_non_exhaustive()
    }
}

fn validate(state: &SimState, amount: f64) -> Result<Side, TradeError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(TradeError::InvalidAmount(amount.to_string()));
    }
    let side = state.pending_side.ok_or(TradeError::NoSideSelected)?;
    if state.processing {
        return Err(TradeError::AlreadyProcessing);
    }
    Ok(side)
}

// =============================================================================
// Tests
// =============================================================================
