//! Integration tests for the wallet session.
//!
//! These tests drive `WalletSession` through `SimulatedWallet` providers and cover:
//! - Existing-connection detection order and failure swallowing
//! - The in-flight connect guard
//! - Late provider injection
//! - End-to-end connect → sign → disconnect
//! - Disconnect racing a newer connection

use std::sync::Arc;
use std::time::Duration;

use arcadia_wallet::{
    ConnectOutcome, ProviderName, ProviderRegistry, SimulatedWallet, TransactionPayload,
    WalletError, WalletSession,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn empty_session() -> (Arc<ProviderRegistry>, WalletSession) {
    let registry = Arc::new(ProviderRegistry::new());
    let session = WalletSession::new(Arc::clone(&registry));
    (registry, session)
}

fn transfer_payload() -> TransactionPayload {
    TransactionPayload::entry_function("0x1::aptos_account::transfer")
        .argument("0x42")
        .argument(1_000)
}

// =============================================================================
// Detection
// =============================================================================

#[tokio::test]
async fn detect_prefers_petra_over_martian() {
    let (registry, session) = empty_session();
    registry.inject(ProviderName::Martian, Arc::new(SimulatedWallet::new("0xm").authorized()));
    registry.inject(ProviderName::Petra, Arc::new(SimulatedWallet::new("0xp").authorized()));

    assert_eq!(session.detect_existing_connection().await, Some(ProviderName::Petra));
    assert_eq!(session.address().as_deref(), Some("0xp"));
}

#[tokio::test]
async fn detect_swallows_probe_failure_and_continues() {
    let (registry, session) = empty_session();
    registry.inject(
        ProviderName::Petra,
        Arc::new(SimulatedWallet::new("0xp").authorized().failing_probe("extension locked")),
    );
    registry.inject(ProviderName::Martian, Arc::new(SimulatedWallet::new("0xm").authorized()));

    assert_eq!(session.detect_existing_connection().await, Some(ProviderName::Martian));
    assert_eq!(session.address().as_deref(), Some("0xm"));
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn detect_without_authorized_account_stays_disconnected() {
    let (registry, session) = empty_session();
    registry.inject(ProviderName::Petra, Arc::new(SimulatedWallet::new("0xp")));

    assert_eq!(session.detect_existing_connection().await, None);
    let snapshot = session.snapshot();
    assert!(snapshot.address.is_none());
    assert!(snapshot.provider.is_none());
    assert!(snapshot.last_error.is_none());
    assert!(!snapshot.connecting);
}

#[tokio::test]
async fn detect_with_no_providers_is_quiet() {
    let (_registry, session) = empty_session();
    assert_eq!(session.detect_existing_connection().await, None);
    assert!(session.last_error().is_none());
}

// =============================================================================
// Connect
// =============================================================================

#[tokio::test]
async fn connect_missing_petra_reports_not_found() {
    let (_registry, session) = empty_session();

    let err = session.connect_by_name("Petra").await.unwrap_err();
    assert_eq!(err, WalletError::ProviderNotFound(ProviderName::Petra));
    assert!(session.address().is_none());
    assert!(session.provider().is_none());
    assert_eq!(
        session.last_error().as_deref(),
        Some("Petra wallet not found! Please install it first.")
    );
}

#[tokio::test]
async fn connect_unknown_provider_is_unsupported() {
    let (registry, session) = empty_session();
    registry.inject(ProviderName::Petra, Arc::new(SimulatedWallet::new("0xp")));

    let err = session.connect_by_name("Dogecoin").await.unwrap_err();
    assert_eq!(err, WalletError::UnsupportedProvider("Dogecoin".to_string()));
    assert!(session.address().is_none());
    assert!(session.provider().is_none());
    assert!(!session.is_connecting());
}

#[tokio::test(start_paused = true)]
async fn second_connect_while_in_flight_is_noop() {
    let (registry, session) = empty_session();
    let wallet = Arc::new(
        SimulatedWallet::new("0xp").with_connect_latency(Duration::from_secs(3)),
    );
    registry.inject(ProviderName::Petra, wallet.clone());
    let session = Arc::new(session);

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.connect(ProviderName::Petra).await })
    };
    while !session.is_connecting() {
        tokio::task::yield_now().await;
    }

    let before = session.snapshot();
    let second = session.connect(ProviderName::Petra).await.unwrap();
    assert_eq!(second, ConnectOutcome::InFlight);
    assert_eq!(session.snapshot(), before);
    assert_eq!(session.detect_existing_connection().await, None);

    let outcome = first.await.unwrap().unwrap();
    assert!(matches!(outcome, ConnectOutcome::Connected { .. }));
    assert_eq!(wallet.connect_calls(), 1);
    assert!(!session.is_connecting());
}

#[tokio::test(start_paused = true)]
async fn unknown_name_during_in_flight_connect_keeps_error_state() {
    let (registry, session) = empty_session();
    registry.inject(
        ProviderName::Petra,
        Arc::new(SimulatedWallet::new("0xp").with_connect_latency(Duration::from_secs(3))),
    );
    let session = Arc::new(session);

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.connect(ProviderName::Petra).await })
    };
    while !session.is_connecting() {
        tokio::task::yield_now().await;
    }

    let outcome = session.connect_by_name("Dogecoin").await.unwrap();
    assert_eq!(outcome, ConnectOutcome::InFlight);
    assert!(session.last_error().is_none());

    first.await.unwrap().unwrap();
    assert_eq!(session.provider(), Some(ProviderName::Petra));
    assert!(session.last_error().is_none());
}

#[tokio::test]
async fn late_injection_is_observed_on_next_connect() {
    let (registry, session) = empty_session();

    let err = session.connect(ProviderName::Martian).await.unwrap_err();
    assert_eq!(err, WalletError::ProviderNotFound(ProviderName::Martian));

    registry.inject(ProviderName::Martian, Arc::new(SimulatedWallet::new("0xm")));
    session.connect(ProviderName::Martian).await.unwrap();
    assert_eq!(session.provider(), Some(ProviderName::Martian));
}

// =============================================================================
// Full Session
// =============================================================================

#[tokio::test]
async fn connect_sign_disconnect_round() {
    let (registry, session) = empty_session();
    let wallet = Arc::new(SimulatedWallet::new("0xp"));
    registry.inject(ProviderName::Petra, wallet.clone());

    let err = session.sign_and_submit(&transfer_payload()).await.unwrap_err();
    assert_eq!(err, WalletError::NotConnected);
    assert_eq!(wallet.sign_calls(), 0);

    session.connect(ProviderName::Petra).await.unwrap();
    let hash = session.sign_and_submit(&transfer_payload()).await.unwrap();
    assert!(hash.starts_with("0x"));
    assert_eq!(wallet.sign_calls(), 1);

    session.disconnect().await.unwrap();
    assert!(session.address().is_none());
    assert!(session.provider().is_none());
    assert!(session.last_error().is_none());
    assert!(!wallet.is_authorized());
}

#[tokio::test]
async fn disconnect_after_provider_removed_clears_locally() {
    let (registry, session) = empty_session();
    registry.inject(ProviderName::Petra, Arc::new(SimulatedWallet::new("0xp")));
    session.connect(ProviderName::Petra).await.unwrap();

    registry.remove(ProviderName::Petra);
    session.disconnect().await.unwrap();
    assert!(!session.is_connected());
}

#[tokio::test(start_paused = true)]
async fn slow_disconnect_does_not_clear_newer_connection() {
    let (registry, session) = empty_session();
    let petra =
        Arc::new(SimulatedWallet::new("0xp").with_disconnect_latency(Duration::from_secs(3)));
    let martian = Arc::new(SimulatedWallet::new("0xm"));
    registry.inject(ProviderName::Petra, petra.clone());
    registry.inject(ProviderName::Martian, martian.clone());
    let session = Arc::new(session);

    session.connect(ProviderName::Petra).await.unwrap();
    let pending = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.disconnect().await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(session.revoke(), Some(ProviderName::Petra));
    session.connect(ProviderName::Martian).await.unwrap();
    assert_eq!(session.provider(), Some(ProviderName::Martian));

    pending.await.unwrap().unwrap();
    assert_eq!(session.provider(), Some(ProviderName::Martian));
    assert_eq!(session.address().as_deref(), Some("0xm"));
    assert!(martian.is_authorized());
    assert!(!petra.is_authorized());
}
