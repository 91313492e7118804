//! In-memory wallet provider for demos and tests.
//!
//! Behaves like an injected extension: it remembers whether the account has
//! been authorized, can be told to reject or fail specific calls, and produces
//! deterministic transaction hashes (Keccak-256 over the payload JSON and a
//! per-wallet sequence number). Nothing leaves the process.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use sha3::{Digest, Keccak256};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use crate::provider::{
    PendingTransaction, ProviderError, TransactionPayload, WalletAccount, WalletProvider,
};

/// Length in bytes of an account address.
const ADDRESS_BYTES: usize = 32;

#[derive(Debug, Default)]
struct Behavior {
    reject_connect: Option<String>,
    fail_probe: Option<String>,
    fail_sign: Option<String>,
    fail_disconnect: Option<String>,
    connect_latency: Option<Duration>,
    disconnect_latency: Option<Duration>,
}

pub struct SimulatedWallet {
    account: WalletAccount,
    authorized: AtomicBool,
    behavior: Mutex<Behavior>,
    connect_calls: AtomicU64,
    sign_calls: AtomicU64,
    sequence: AtomicU64,
}

impl SimulatedWallet {
    /// Creates a wallet that has not yet authorized this site.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            account: WalletAccount::new(address),
            authorized: AtomicBool::new(false),
            behavior: Mutex::new(Behavior::default()),
            connect_calls: AtomicU64::new(0),
            sign_calls: AtomicU64::new(0),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates a wallet with a random 32-byte hex address.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; ADDRESS_BYTES];
        rng.fill(&mut bytes[..]);
        Self::new(format!("0x{}", hex::encode(bytes)))
    }

    /// Marks the account as already authorized, so `account()` reports it.
    #[must_use]
    pub fn authorized(self) -> Self {
        self.authorized.store(true, Ordering::SeqCst);
        self
    }

    /// Makes every `connect()` fail as if the user declined.
    #[must_use]
    pub fn rejecting_connect(self, message: impl Into<String>) -> Self {
        self.behavior.lock().reject_connect = Some(message.into());
        self
    }

    /// Makes `account()` fail.
    #[must_use]
    pub fn failing_probe(self, message: impl Into<String>) -> Self {
        self.behavior.lock().fail_probe = Some(message.into());
        self
    }

    #[must_use]
    pub fn failing_sign(self, message: impl Into<String>) -> Self {
        self.behavior.lock().fail_sign = Some(message.into());
        self
    }

    #[must_use]
    pub fn failing_disconnect(self, message: impl Into<String>) -> Self {
        self.behavior.lock().fail_disconnect = Some(message.into());
        self
    }

    /// Delays `connect()` to model the extension's approval popup.
    #[must_use]
    pub fn with_connect_latency(self, latency: Duration) -> Self {
        self.behavior.lock().connect_latency = Some(latency);
        self
    }

    #[must_use]
    pub fn with_disconnect_latency(self, latency: Duration) -> Self {
        self.behavior.lock().disconnect_latency = Some(latency);
        self
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.account.address
    }

    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorized.load(Ordering::SeqCst)
    }

    /// Number of `connect()` requests received.
    #[must_use]
    pub fn connect_calls(&self) -> u64 {
        self.connect_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn sign_calls(&self) -> u64 {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn transaction_hash(&self, payload: &TransactionPayload) -> Result<String, ProviderError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ProviderError::Internal(format!("Invalid payload: {e}")))?;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut hasher = Keccak256::new();
        hasher.update(self.account.address.as_bytes());
        hasher.update(&body);
        hasher.update(sequence.to_be_bytes());
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

impl std::fmt::Debug for SimulatedWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedWallet")
            .field("address", &self.account.address)
            .field("authorized", &self.is_authorized())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WalletProvider for SimulatedWallet {
    async fn account(&self) -> Result<Option<WalletAccount>, ProviderError> {
        if let Some(message) = self.behavior.lock().fail_probe.clone() {
            return Err(ProviderError::Unavailable(message));
        }
        Ok(self.is_authorized().then(|| self.account.clone()))
    }

    async fn connect(&self) -> Result<WalletAccount, ProviderError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.behavior.lock().connect_latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.behavior.lock().reject_connect.clone() {
            return Err(ProviderError::Rejected(message));
        }

        self.authorized.store(true, Ordering::SeqCst);
        debug!(address = %self.account.address, "Simulated wallet authorized");
        Ok(self.account.clone())
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        let latency = self.behavior.lock().disconnect_latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = self.behavior.lock().fail_disconnect.clone() {
            return Err(ProviderError::Internal(message));
        }
        self.authorized.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> Result<PendingTransaction, ProviderError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.behavior.lock().fail_sign.clone() {
            return Err(ProviderError::Rejected(message));
        }
        if !self.is_authorized() {
            return Err(ProviderError::Rejected("Account not authorized".to_string()));
        }

        let hash = self.transaction_hash(payload)?;
        debug!(function = %payload.function, hash = %hash, "Simulated transaction submitted");
        Ok(PendingTransaction { hash })
    }
}
