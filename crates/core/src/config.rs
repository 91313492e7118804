use serde::{Deserialize, Serialize};

/// Default artificial latency before a simulated trade is recorded.
pub const DEFAULT_SETTLEMENT_DELAY_MS: u64 = 2_000;

/// Default time-to-live of a transient notification.
pub const DEFAULT_NOTIFICATION_TTL_SECS: u64 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub wallet: WalletConfig,
    pub simulator: SimulatorConfig,
    pub notifications: NotificationConfig,
}

/// Network the wallet providers are expected to be pointed at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Devnet => write!(f, "devnet"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub network: Network,
    /// Probe injected providers for an already-authorized account on startup.
    pub auto_detect: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            auto_detect: true,
        }
    }
}

/// Fill model for the trade simulator.
///
/// Entry prices and P&L are drawn uniformly from `[min, max)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Ticker shown in trade notifications.
    pub ticker: String,
    pub settlement_delay_ms: u64,
    pub entry_price_min: f64,
    pub entry_price_max: f64,
    pub pnl_min: f64,
    pub pnl_max: f64,
    /// Fixed seed for reproducible sessions. `None` seeds from entropy.
    pub random_seed: Option<u64>,
    /// Illustrative image attached to trade notifications.
    pub notification_image: Option<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ticker: "ARC".to_string(),
            settlement_delay_ms: DEFAULT_SETTLEMENT_DELAY_MS,
            entry_price_min: 10.0,
            entry_price_max: 100.0,
            pnl_min: -50.0,
            pnl_max: 50.0,
            random_seed: None,
            notification_image: Some("/arcadia-meme.gif".to_string()),
        }
    }
}

impl SimulatorConfig {
    /// Creates a config with a specific random seed for reproducible runs.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            random_seed: Some(seed),
            ..Default::default()
        }
    }

    /// Sets the settlement delay.
    #[must_use]
    pub fn settlement_delay_ms(mut self, ms: u64) -> Self {
        self.settlement_delay_ms = ms;
        self
    }

    /// Sets the ticker.
    #[must_use]
    pub fn ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = ticker.into();
        self
    }

    /// Checks that both sampling ranges are finite, non-empty, and have a finite width.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid range.
    pub fn validate(&self) -> Result<(), String> {
        check_range("entry price", self.entry_price_min, self.entry_price_max)?;
        check_range("pnl", self.pnl_min, self.pnl_max)
    }
}

fn check_range(name: &str, min: f64, max: f64) -> Result<(), String> {
    if !min.is_finite() || !max.is_finite() {
        return Err(format!("{name} range must be finite, got [{min}, {max})"));
    }
    if min >= max {
        return Err(format!("{name} range is empty: [{min}, {max})"));
    }
    if !(max - min).is_finite() {
        return Err(format!("{name} range is too wide to sample: [{min}, {max})"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub ttl_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_NOTIFICATION_TTL_SECS,
        }
    }
}
