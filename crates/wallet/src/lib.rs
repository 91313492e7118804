//! Wallet session manager.
//!
//! This crate provides:
//! - [`WalletProvider`]: the capability every injected wallet exposes
//! - [`ProviderRegistry`]: explicit name → provider lookup, resolved at call time
//! - [`WalletSession`]: connect / sign / disconnect over whichever provider is active
//! - [`SimulatedWallet`]: an in-memory provider for demos and tests
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use arcadia_wallet::{ProviderName, ProviderRegistry, SimulatedWallet, WalletSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), arcadia_wallet::WalletError> {
//!     let registry = Arc::new(ProviderRegistry::new());
//!     registry.inject(ProviderName::Petra, Arc::new(SimulatedWallet::new("0x1")));
//!
//!     let session = WalletSession::new(registry);
//!     session.connect(ProviderName::Petra).await?;
//!     assert_eq!(session.address().as_deref(), Some("0x1"));
//!     Ok(())
//! }
//! ```

pub mod provider;
pub mod registry;
pub mod session;
pub mod simulated;

pub use provider::{
    PendingTransaction, ProviderError, ProviderName, TransactionPayload, WalletAccount,
    WalletProvider,
};
pub use registry::ProviderRegistry;
pub use session::{short_address, ConnectOutcome, WalletError, WalletSession, WalletSnapshot};
pub use simulated::SimulatedWallet;
