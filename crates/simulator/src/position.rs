use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Past-tense verb for notifications.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Side::Buy => "Bought",
            Side::Sell => "Sold",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// A simulated open trade. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub side: Side,
    pub amount: f64,
    pub entry_price: f64,
    /// Simulation-only profit/loss, fixed at creation.
    pub pnl: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    #[must_use]
    pub fn new(side: Side, amount: f64, entry_price: f64, pnl: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            side,
            amount,
            entry_price,
            pnl,
            opened_at: Utc::now(),
        }
    }

    /// Notional value at entry.
    #[must_use]
    pub fn notional(&self) -> f64 {
        self.amount * self.entry_price
    }
}

/// Sign classification of an aggregate P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PnlOutcome {
    Profit,
    Loss,
    Flat,
}

impl PnlOutcome {
    #[must_use]
    pub fn from_pnl(pnl: f64) -> Self {
        if pnl > 0.0 {
            PnlOutcome::Profit
        } else if pnl < 0.0 {
            PnlOutcome::Loss
        } else {
            PnlOutcome::Flat
        }
    }
}

impl std::fmt::Display for PnlOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PnlOutcome::Profit => write!(f, "PROFIT"),
            PnlOutcome::Loss => write!(f, "LOSS"),
            PnlOutcome::Flat => write!(f, "FLAT"),
        }
    }
}

/// Result of closing every open position at once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExitSummary {
    /// Sum of `pnl` across the closed positions.
    pub aggregate_pnl: f64,
    pub closed: usize,
    pub outcome: PnlOutcome,
}

impl ExitSummary {
    #[must_use]
    pub fn new(aggregate_pnl: f64, closed: usize) -> Self {
        Self {
            aggregate_pnl,
            closed,
            outcome: PnlOutcome::from_pnl(aggregate_pnl),
        }
    }

    /// Summary of exiting with nothing open.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(0.0, 0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closed == 0
    }
}
