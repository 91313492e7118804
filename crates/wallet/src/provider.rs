//! Capability interface for browser-injected wallet providers.
//!
//! Each wallet extension (Petra, Martian) exposes the same four calls. The
//! session only ever talks to a provider through [`WalletProvider`], so a
//! real extension bridge and the in-memory [`crate::SimulatedWallet`] are
//! interchangeable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::session::WalletError;

// =============================================================================
// Provider Names
// =============================================================================

/// Known wallet providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderName {
    Petra,
    Martian,
}

impl ProviderName {
    /// Order in which providers are probed for an existing authorization.
    pub const PROBE_ORDER: [ProviderName; 2] = [ProviderName::Petra, ProviderName::Martian];

    /// Where the user can install the extension.
    #[must_use]
    pub const fn install_url(self) -> &'static str {
        match self {
            ProviderName::Petra => "https://petra.app",
            ProviderName::Martian => "https://martianwallet.xyz",
        }
    }

    /// User-facing message for a provider that is not injected.
    #[must_use]
    pub fn not_found_message(self) -> String {
        format!("{self} wallet not found! Please install it first.")
    }
}

impl std::fmt::Display for ProviderName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderName::Petra => write!(f, "Petra"),
            ProviderName::Martian => write!(f, "Martian"),
        }
    }
}

impl FromStr for ProviderName {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "petra" => Ok(ProviderName::Petra),
            "martian" => Ok(ProviderName::Martian),
            _ => Err(WalletError::UnsupportedProvider(s.to_string())),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Account returned by `account()` and `connect()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub address: String,
    /// Public key, when the provider reports one.
    pub public_key: Option<String>,
}

impl WalletAccount {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            public_key: None,
        }
    }
}

/// Entry-function transaction payload handed to the provider for signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    /// Fully qualified function, e.g. `0x1::coin::transfer`.
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
}

impl TransactionPayload {
    #[must_use]
    pub fn entry_function(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            type_arguments: Vec::new(),
            arguments: Vec::new(),
        }
    }

    #[must_use]
    pub fn type_argument(mut self, type_argument: impl Into<String>) -> Self {
        self.type_arguments.push(type_argument.into());
        self
    }

    #[must_use]
    pub fn argument(mut self, argument: impl Into<serde_json::Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }
}

/// Provider acknowledgement of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
}

// =============================================================================
// Errors
// =============================================================================

/// Errors raised by a provider implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The user declined the request in the extension.
    #[error("{0}")]
    Rejected(String),

    /// The extension is present but cannot serve the request.
    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

// =============================================================================
// Capability Trait
// =============================================================================

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Returns the already-authorized account, if any, without prompting the user.
    async fn account(&self) -> Result<Option<WalletAccount>, ProviderError>;

    /// Requests account access from the user.
    async fn connect(&self) -> Result<WalletAccount, ProviderError>;

    async fn disconnect(&self) -> Result<(), ProviderError>;

    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> Result<PendingTransaction, ProviderError>;
}
