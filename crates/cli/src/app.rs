//! Collaborator wiring for the CLI.
//!
//! Builds a wallet session over simulated injected providers and a trade
//! simulator from configuration, gates trading on a connected wallet, and
//! renders notifications the way a page would: onto a board that expires them.

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::Args;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

use arcadia_core::{AppConfig, Notification, NotificationBoard};
use arcadia_simulator::TradeSimulator;
use arcadia_wallet::{
    short_address, ConnectOutcome, ProviderName, ProviderRegistry, SimulatedWallet, WalletSession,
};

/// Wallet environment to simulate.
#[derive(Args, Debug, Clone)]
pub struct WalletArgs {
    /// Wallet extensions present in the simulated browser (comma separated)
    #[arg(long, value_delimiter = ',', default_value = "petra,martian")]
    pub install: Vec<String>,

    /// Provider to connect when no existing authorization is found
    #[arg(long, default_value = "petra")]
    pub provider: String,

    /// Provider that has already authorized this site
    #[arg(long)]
    pub preauthorized: Option<String>,

    /// Make every installed wallet decline connection requests
    #[arg(long)]
    pub reject: bool,
}

pub struct App {
    pub wallet: Arc<WalletSession>,
    pub simulator: TradeSimulator,
    auto_detect: bool,
    notifications: broadcast::Receiver<Notification>,
    board: NotificationBoard,
}

impl App {
    /// Builds both cores from configuration and the simulated wallet environment.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown provider names or an invalid simulator config.
    pub fn build(config: &AppConfig, args: &WalletArgs) -> Result<Self> {
        let mut rng = match config.simulator.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let preauthorized = args
            .preauthorized
            .as_deref()
            .map(ProviderName::from_str)
            .transpose()
            .context("invalid --preauthorized provider")?;

        let registry = Arc::new(ProviderRegistry::new());
        for name in &args.install {
            let name = ProviderName::from_str(name).context("invalid --install provider")?;
            let mut wallet = SimulatedWallet::random(&mut rng);
            if preauthorized == Some(name) {
                wallet = wallet.authorized();
            }
            if args.reject {
                wallet = wallet.rejecting_connect("User rejected the request");
            }
            registry.inject(name, Arc::new(wallet));
        }

        let wallet = Arc::new(WalletSession::with_config(registry, &config.wallet));
        let simulator = TradeSimulator::new(config.simulator.clone())?;
        let notifications = simulator.subscribe();

        Ok(Self {
            wallet,
            simulator,
            auto_detect: config.wallet.auto_detect,
            notifications,
            board: NotificationBoard::new(config.notifications.ttl_secs),
        })
    }

    /// Trading is only offered with a connected wallet.
    ///
    /// Adopts an existing authorization when auto-detect is on, otherwise
    /// shows the connect prompt and connects to `provider`.
    ///
    /// # Errors
    ///
    /// Returns the wallet error if the connection fails.
    pub async fn ensure_connected(&self, provider: &str) -> Result<String> {
        if self.auto_detect {
            if let Some(name) = self.wallet.detect_existing_connection().await {
                println!("Restored existing {name} connection");
            }
        }

        if let Some(address) = self.wallet.address() {
            return Ok(address);
        }

        if self.wallet.should_prompt() {
            print_connect_prompt(&self.wallet);
        }

        match self.wallet.connect_by_name(provider).await? {
            ConnectOutcome::Connected { provider, account } => {
                println!(
                    "Connected {} wallet {}",
                    provider,
                    short_address(&account.address)
                );
                Ok(account.address)
            }
            ConnectOutcome::InFlight => bail!("a wallet connection is already in progress"),
        }
    }

    /// Moves newly emitted notifications onto the board, prints them, and expires old ones.
    pub fn flush_notifications(&mut self) {
        loop {
            match self.notifications.try_recv() {
                Ok(notification) => {
                    println!("  {notification}");
                    self.board.push(notification);
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification consumer lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        let expired = self.board.prune_expired(Utc::now());
        if expired > 0 {
            tracing::debug!(expired, "Dismissed expired notifications");
        }
    }

    #[must_use]
    pub fn board(&self) -> &NotificationBoard {
        &self.board
    }
}

fn print_connect_prompt(session: &WalletSession) {
    println!("Wallet Not Connected");
    println!("  Please connect your wallet to start trading memecoins.");
    for name in ProviderName::PROBE_ORDER {
        let status = if session.registry().is_installed(name) {
            "installed".to_string()
        } else {
            format!("install from {}", name.install_url())
        };
        println!("  - {name}: {status}");
    }
}

/// Parses a CLI amount, keeping garbage input as NaN so the simulator rejects it.
#[must_use]
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}

/// Fails with the last wallet error when a step left the session disconnected.
///
/// # Errors
///
/// Returns an error if the session is not connected.
pub fn require_connected(session: &WalletSession) -> Result<String> {
    session.address().ok_or_else(|| {
        anyhow!(
            "wallet not connected: {}",
            session
                .last_error()
                .unwrap_or_else(|| "no provider connected".to_string())
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcadia_core::SimulatorConfig;

    fn args() -> WalletArgs {
        WalletArgs {
            install: vec!["petra".to_string(), "martian".to_string()],
            provider: "martian".to_string(),
            preauthorized: None,
            reject: false,
        }
    }

    fn config() -> AppConfig {
        AppConfig {
            simulator: SimulatorConfig::with_seed(5).settlement_delay_ms(0),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_amount() {
        assert!((parse_amount(" 2.5 ") - 2.5).abs() < f64::EPSILON);
        assert!(parse_amount("abc").is_nan());
    }

    #[test]
    fn test_unknown_install_rejected() {
        let mut args = args();
        args.install.push("dogecoin".to_string());
        assert!(App::build(&config(), &args).is_err());
    }

    #[tokio::test]
    async fn test_connects_requested_provider() {
        let app = App::build(&config(), &args()).unwrap();
        let address = app.ensure_connected("martian").await.unwrap();
        assert_eq!(app.wallet.provider(), Some(ProviderName::Martian));
        assert_eq!(require_connected(&app.wallet).unwrap(), address);
    }

    #[tokio::test]
    async fn test_preauthorized_wallet_is_restored() {
        let mut args = args();
        args.preauthorized = Some("petra".to_string());
        let app = App::build(&config(), &args).unwrap();

        app.ensure_connected("martian").await.unwrap();
        assert_eq!(app.wallet.provider(), Some(ProviderName::Petra));
    }

    #[tokio::test]
    async fn test_rejecting_wallet_fails_gate() {
        let mut args = args();
        args.reject = true;
        let app = App::build(&config(), &args).unwrap();

        assert!(app.ensure_connected("petra").await.is_err());
        let err = require_connected(&app.wallet).unwrap_err();
        assert!(err.to_string().contains("User rejected the request"));
    }
}
