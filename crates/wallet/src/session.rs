//! Wallet session: the single source of truth for which wallet, if any, is connected.
//!
//! The session normalizes every provider behind [`WalletProvider`] and keeps
//! four collaborator-visible fields: `address`, `provider`, `connecting` and
//! `last_error`.
//!
//! # State machine
//!
//! ```text
//! Disconnected --connect ok--> Connected(provider) --disconnect | revoke--> Disconnected
//! ```
//!
//! Switching providers is not a direct transition: `connect` while connected
//! fails with [`WalletError::AlreadyConnected`].
//!
//! # Failure recording
//!
//! `last_error` is cleared when an operation starts. Every failure is written
//! to `last_error` *and* returned to the caller.
//!
//! # Disconnect policy
//!
//! Local state is cleared even when the provider's `disconnect()` fails. The
//! failure is still recorded and returned as [`WalletError::DisconnectFailed`].

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use arcadia_core::{Network, WalletConfig};

use crate::provider::{ProviderName, TransactionPayload, WalletAccount};
use crate::registry::ProviderRegistry;

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    /// The named provider is not injected.
    #[error("{} wallet not found! Please install it first.", .0)]
    ProviderNotFound(ProviderName),

    #[error("Unsupported wallet provider: {0}")]
    UnsupportedProvider(String),

    /// The provider's own connect call failed or was declined.
    #[error("{message}")]
    ProviderRejected {
        provider: ProviderName,
        message: String,
    },

    #[error("{0}")]
    SigningFailed(String),

    #[error("Wallet not connected")]
    NotConnected,

    #[error("Already connected to {0}; disconnect first")]
    AlreadyConnected(ProviderName),

    /// The provider's disconnect hook failed. Local state was still cleared.
    #[error("Failed to disconnect {provider} wallet: {message}")]
    DisconnectFailed {
        provider: ProviderName,
        message: String,
    },
}

// =============================================================================
// Session Types
// =============================================================================

/// Result of a [`WalletSession::connect`] call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected {
        provider: ProviderName,
        account: WalletAccount,
    },
    /// Another connect attempt was already in flight; nothing was done.
    InFlight,
}

/// Read-only copy of the session for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: Option<String>,
    pub provider: Option<ProviderName>,
    pub connecting: bool,
    pub last_error: Option<String>,
    pub network: Network,
}

#[derive(Debug, Default)]
struct SessionState {
    address: Option<String>,
    provider: Option<ProviderName>,
    connecting: bool,
    last_error: Option<String>,
    prompt_dismissed: bool,
}

impl SessionState {
    fn set_connected(&mut self, provider: ProviderName, address: String) {
        self.address = Some(address);
        self.provider = Some(provider);
        self.check_invariant();
    }

    fn clear_connection(&mut self) {
        self.address = None;
        self.provider = None;
        self.prompt_dismissed = false;
        self.check_invariant();
    }

    fn check_invariant(&self) {
        debug_assert_eq!(
            self.address.is_some(),
            self.provider.is_some(),
            "address and provider must be set together"
        );
    }
}

/// Resets `connecting` when the attempt finishes, including when the future is dropped.
struct ConnectingGuard<'a> {
    state: &'a RwLock<SessionState>,
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.state.write().connecting = false;
    }
}

// =============================================================================
// Wallet Session
// =============================================================================

/// Connection state for one application instance.
///
/// Construct one per application and share it by `Arc`; there is no global
/// instance.
pub struct WalletSession {
    registry: Arc<ProviderRegistry>,
    network: Network,
    state: RwLock<SessionState>,
}

impl WalletSession {
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self::with_config(registry, &WalletConfig::default())
    }

    #[must_use]
    pub fn with_config(registry: Arc<ProviderRegistry>, config: &WalletConfig) -> Self {
        Self {
            registry,
            network: config.network,
            state: RwLock::new(SessionState::default()),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    // -------------------------------------------------------------------------
    // Read side
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn address(&self) -> Option<String> {
        self.state.read().address.clone()
    }

    #[must_use]
    pub fn provider(&self) -> Option<ProviderName> {
        self.state.read().provider
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.read().address.is_some()
    }

    #[must_use]
    pub fn is_connecting(&self) -> bool {
        self.state.read().connecting
    }

    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> WalletSnapshot {
        let state = self.state.read();
        WalletSnapshot {
            address: state.address.clone(),
            provider: state.provider,
            connecting: state.connecting,
            last_error: state.last_error.clone(),
            network: self.network,
        }
    }

    /// Whether the "wallet not connected" prompt should be shown.
    ///
    /// The prompt persists while disconnected until the user dismisses it.
    #[must_use]
    pub fn should_prompt(&self) -> bool {
        let state = self.state.read();
        state.address.is_none() && !state.prompt_dismissed
    }

    pub fn dismiss_prompt(&self) {
        self.state.write().prompt_dismissed = true;
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Adopts an account a provider has already authorized, if any.
    ///
    /// Providers are probed in [`ProviderName::PROBE_ORDER`]; the first one
    /// reporting a non-empty account wins. Probe failures are logged and
    /// skipped. Returns the adopted provider.
    pub async fn detect_existing_connection(&self) -> Option<ProviderName> {
        let Some(_guard) = self.begin_connect() else {
            debug!("Connect in flight, skipping existing-connection probe");
            return None;
        };

        if let Some(active) = self.provider() {
            return Some(active);
        }

        for name in ProviderName::PROBE_ORDER {
            let Some(provider) = self.registry.get(name) else {
                continue;
            };

            match provider.account().await {
                Ok(Some(account)) if !account.address.is_empty() => {
                    info!(provider = %name, address = %account.address, "Restored existing wallet connection");
                    self.state.write().set_connected(name, account.address);
                    return Some(name);
                }
                Ok(_) => debug!(provider = %name, "No authorized account"),
                Err(e) => warn!(provider = %name, error = %e, "Wallet connection check failed"),
            }
        }

        None
    }

    /// Parses a provider name and connects to it.
    ///
    /// Returns [`ConnectOutcome::InFlight`] before parsing while another
    /// attempt is pending, so the in-flight attempt keeps its `last_error`.
    ///
    /// # Errors
    ///
    /// [`WalletError::UnsupportedProvider`] for unknown names, otherwise as [`Self::connect`].
    pub async fn connect_by_name(&self, name: &str) -> Result<ConnectOutcome, WalletError> {
        if self.is_connecting() {
            debug!(provider = name, "Connect already in flight, ignoring");
            return Ok(ConnectOutcome::InFlight);
        }
        match ProviderName::from_str(name) {
            Ok(provider) => self.connect(provider).await,
            Err(e) => Err(self.record(e)),
        }
    }

    /// Requests account access from `name`.
    ///
    /// A call made while another attempt is in flight returns
    /// [`ConnectOutcome::InFlight`] without contacting any provider.
    ///
    /// # Errors
    ///
    /// - [`WalletError::AlreadyConnected`] if a provider is already active
    /// - [`WalletError::ProviderNotFound`] if `name` is not injected
    /// - [`WalletError::ProviderRejected`] if the provider's connect call fails
    pub async fn connect(&self, name: ProviderName) -> Result<ConnectOutcome, WalletError> {
        let Some(_guard) = self.begin_connect() else {
            debug!(provider = %name, "Connect already in flight, ignoring");
            return Ok(ConnectOutcome::InFlight);
        };

        if let Some(active) = self.provider() {
            return Err(self.record(WalletError::AlreadyConnected(active)));
        }

        let Some(provider) = self.registry.get(name) else {
            return Err(self.record(WalletError::ProviderNotFound(name)));
        };

        info!(provider = %name, "Connecting wallet");
        match provider.connect().await {
            Ok(account) if !account.address.is_empty() => {
                self.state
                    .write()
                    .set_connected(name, account.address.clone());
                info!(provider = %name, address = %account.address, "Wallet connected");
                Ok(ConnectOutcome::Connected {
                    provider: name,
                    account,
                })
            }
            Ok(_) => Err(self.record(WalletError::ProviderRejected {
                provider: name,
                message: "Provider returned an empty address".to_string(),
            })),
            Err(e) => Err(self.record(WalletError::ProviderRejected {
                provider: name,
                message: e.to_string(),
            })),
        }
    }

    /// Ends the active connection. No-op when disconnected.
    ///
    /// Local state is only cleared if the session still holds the connection
    /// this call started with; a connection made while the provider's
    /// disconnect was pending is left intact.
    ///
    /// # Errors
    ///
    /// [`WalletError::DisconnectFailed`] if the provider's hook fails; the
    /// local session is cleared regardless.
    pub async fn disconnect(&self) -> Result<(), WalletError> {
        let active = {
            let mut state = self.state.write();
            state.last_error = None;
            state.provider.zip(state.address.clone())
        };
        let Some((name, address)) = active else {
            return Ok(());
        };

        let remote = match self.registry.get(name) {
            Some(provider) => provider.disconnect().await,
            None => {
                debug!(provider = %name, "Provider no longer injected, clearing locally");
                Ok(())
            }
        };

        {
            let mut state = self.state.write();
            if state.provider == Some(name) && state.address.as_deref() == Some(address.as_str()) {
                state.clear_connection();
            } else {
                debug!(provider = %name, "Session changed during disconnect, keeping current connection");
            }
        }

        match remote {
            Ok(()) => {
                info!(provider = %name, "Wallet disconnected");
                Ok(())
            }
            Err(e) => Err(self.record(WalletError::DisconnectFailed {
                provider: name,
                message: e.to_string(),
            })),
        }
    }

    /// The active provider revoked access (account removed or switched in the extension).
    ///
    /// Returns the provider that was active.
    pub fn revoke(&self) -> Option<ProviderName> {
        let mut state = self.state.write();
        let previous = state.provider;
        if let Some(name) = previous {
            info!(provider = %name, "Wallet access revoked by provider");
            state.clear_connection();
        }
        previous
    }

    /// Signs and submits `payload` through the active provider and returns the transaction hash.
    ///
    /// # Errors
    ///
    /// - [`WalletError::NotConnected`] when no wallet is connected
    /// - [`WalletError::ProviderNotFound`] if the active provider disappeared
    /// - [`WalletError::SigningFailed`] if the provider call fails
    pub async fn sign_and_submit(&self, payload: &TransactionPayload) -> Result<String, WalletError> {
        let active = {
            let mut state = self.state.write();
            state.last_error = None;
            state.address.as_ref().and(state.provider)
        };
        let Some(name) = active else {
            return Err(self.record(WalletError::NotConnected));
        };

        let Some(provider) = self.registry.get(name) else {
            return Err(self.record(WalletError::ProviderNotFound(name)));
        };

        match provider.sign_and_submit_transaction(payload).await {
            Ok(pending) if !pending.hash.is_empty() => {
                info!(provider = %name, function = %payload.function, hash = %pending.hash, "Transaction submitted");
                Ok(pending.hash)
            }
            Ok(_) => Err(self.record(WalletError::SigningFailed(
                "Provider returned an empty transaction hash".to_string(),
            ))),
            Err(e) => Err(self.record(WalletError::SigningFailed(e.to_string()))),
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn begin_connect(&self) -> Option<ConnectingGuard<'_>> {
        let mut state = self.state.write();
        if state.connecting {
            return None;
        }
        state.connecting = true;
        state.last_error = None;
        Some(ConnectingGuard { state: &self.state })
    }

    fn record(&self, error: WalletError) -> WalletError {
        warn!(error = %error, "Wallet operation failed");
        self.state.write().last_error = Some(error.to_string());
        error
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("snapshot", &self.snapshot())
            .field("registry", &self.registry)
            .finish()
    }
}

/// Shortens an address for display: `0x1234...abcd`.
#[must_use]
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

// =============================================================================
// Tests
// =============================================================================
