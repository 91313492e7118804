//! Explicit mapping from provider name to provider implementation.
//!
//! Extensions can inject themselves after startup, so lookups are made at
//! call time and never cached by callers.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::provider::{ProviderName, WalletProvider};

#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<ProviderName, Arc<dyn WalletProvider>>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a provider available, replacing any previous injection under the same name.
    pub fn inject(&self, name: ProviderName, provider: Arc<dyn WalletProvider>) {
        info!(provider = %name, "Wallet provider injected");
        self.providers.write().insert(name, provider);
    }

    /// Removes a provider (extension uninstalled or disabled).
    pub fn remove(&self, name: ProviderName) -> Option<Arc<dyn WalletProvider>> {
        let removed = self.providers.write().remove(&name);
        if removed.is_some() {
            info!(provider = %name, "Wallet provider removed");
        }
        removed
    }

    #[must_use]
    pub fn get(&self, name: ProviderName) -> Option<Arc<dyn WalletProvider>> {
        self.providers.read().get(&name).cloned()
    }

    #[must_use]
    pub fn is_installed(&self, name: ProviderName) -> bool {
        self.providers.read().contains_key(&name)
    }

    /// Installed providers, in probe order.
    #[must_use]
    pub fn installed(&self) -> Vec<ProviderName> {
        let providers = self.providers.read();
        ProviderName::PROBE_ORDER
            .into_iter()
            .filter(|name| providers.contains_key(name))
            .collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("installed", &self.installed())
            .finish()
    }
}
