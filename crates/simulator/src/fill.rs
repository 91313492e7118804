//! Fill generation for simulated trades.
//!
//! There is no price feed: entry price and P&L are sampled. The sampling
//! source is injected so sessions can be reproduced from a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

use arcadia_core::SimulatorConfig;

use crate::position::Side;

/// Parameters of one simulated execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub entry_price: f64,
    pub pnl: f64,
}

pub trait FillModel: Send {
    fn next_fill(&mut self, side: Side, amount: f64) -> Fill;
}

/// Draws entry price and P&L uniformly from the configured ranges.
#[derive(Debug)]
pub struct UniformFillModel {
    rng: StdRng,
    entry_price: (f64, f64),
    pnl: (f64, f64),
}

impl UniformFillModel {
    /// Builds the model from config, seeding from `random_seed` or from entropy.
    ///
    /// # Errors
    ///
    /// Returns an error if either sampling range is empty or not finite.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self, String> {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(config, rng)
    }

    /// # Errors
    ///
    /// Returns an error if either sampling range is empty or not finite.
    pub fn with_rng(config: &SimulatorConfig, rng: StdRng) -> Result<Self, String> {
        config.validate()?;
        Ok(Self {
            rng,
            entry_price: (config.entry_price_min, config.entry_price_max),
            pnl: (config.pnl_min, config.pnl_max),
        })
    }
}

impl FillModel for UniformFillModel {
    fn next_fill(&mut self, _side: Side, _amount: f64) -> Fill {
        Fill {
            entry_price: self.rng.gen_range(self.entry_price.0..self.entry_price.1),
            pnl: self.rng.gen_range(self.pnl.0..self.pnl.1),
        }
    }
}

/// Replays a fixed list of fills, repeating the last one once exhausted.
///
/// An empty script yields zero-valued fills.
#[derive(Debug, Clone)]
pub struct ScriptedFillModel {
    fills: VecDeque<Fill>,
    last: Fill,
}

impl ScriptedFillModel {
    #[must_use]
    pub fn new(fills: impl IntoIterator<Item = Fill>) -> Self {
        let fills: VecDeque<Fill> = fills.into_iter().collect();
        let last = fills.back().copied().unwrap_or(Fill {
            entry_price: 0.0,
            pnl: 0.0,
        });
        Self { fills, last }
    }

    /// Fills with the given P&L values at a constant entry price.
    #[must_use]
    pub fn with_pnls(entry_price: f64, pnls: &[f64]) -> Self {
        Self::new(pnls.iter().map(|&pnl| Fill { entry_price, pnl }))
    }
}

impl FillModel for ScriptedFillModel {
    fn next_fill(&mut self, _side: Side, _amount: f64) -> Fill {
        self.fills.pop_front().unwrap_or(self.last)
    }
}
