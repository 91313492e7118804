//! Integration tests for the trade simulator.
//!
//! These tests run with a paused tokio clock so the real settlement delay is
//! exercised without slowing the suite. They cover:
//! - Trade settlement and the recorded position
//! - The re-entrancy guard during the settlement window
//! - Bulk exit aggregation and classification
//! - Seeded reproducibility

use std::sync::Arc;
use std::time::Duration;

use arcadia_core::SimulatorConfig;
use arcadia_simulator::{PnlOutcome, ScriptedFillModel, Side, TradeError, TradeSimulator};
use tokio::time::Instant;

// =============================================================================
// Helper Functions
// =============================================================================

fn seeded(seed: u64) -> TradeSimulator {
    TradeSimulator::new(SimulatorConfig::with_seed(seed)).unwrap()
}

fn scripted(pnls: &[f64]) -> TradeSimulator {
    TradeSimulator::with_fill_model(
        SimulatorConfig::with_seed(1),
        Box::new(ScriptedFillModel::with_pnls(42.0, pnls)),
    )
}

// =============================================================================
// Execution
// =============================================================================

#[tokio::test(start_paused = true)]
async fn buy_settles_into_single_position() {
    let sim = seeded(3);
    sim.select_side(Side::Buy);

    let position = sim.execute_trade(2.5).await.unwrap();

    let positions = sim.positions();
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0], position);
    assert_eq!(positions[0].side, Side::Buy);
    assert!((positions[0].amount - 2.5).abs() < f64::EPSILON);
    assert!(!sim.is_processing());
}

#[tokio::test(start_paused = true)]
async fn settlement_waits_for_configured_delay() {
    let sim = seeded(3);
    sim.select_side(Side::Sell);

    let started = Instant::now();
    sim.execute_trade(1.0).await.unwrap();
    let delay = Duration::from_millis(sim.config().settlement_delay_ms);
    assert!(started.elapsed() >= delay);
}

#[tokio::test(start_paused = true)]
async fn second_trade_rejected_while_processing() {
    let sim = seeded(5);
    sim.select_side(Side::Buy);

    let pending = sim.begin_trade(1.0).unwrap();
    assert!(sim.is_processing());

    let err = sim.execute_trade(4.0).await.unwrap_err();
    assert_eq!(err, TradeError::AlreadyProcessing);

    pending.settle().await;
    let positions = sim.positions();
    assert_eq!(positions.len(), 1);
    assert!((positions[0].amount - 1.0).abs() < f64::EPSILON);

    sim.execute_trade(4.0).await.unwrap();
    assert_eq!(sim.positions().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_submissions_from_tasks_record_one_position() {
    let sim = Arc::new(seeded(9));
    sim.select_side(Side::Buy);

    let first = {
        let sim = Arc::clone(&sim);
        tokio::spawn(async move { sim.execute_trade(1.5).await })
    };
    while !sim.is_processing() {
        tokio::task::yield_now().await;
    }

    assert_eq!(sim.execute_trade(2.0).await, Err(TradeError::AlreadyProcessing));
    first.await.unwrap().unwrap();
    assert_eq!(sim.positions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn invalid_amounts_leave_positions_unchanged() {
    let sim = seeded(1);
    sim.select_side(Side::Buy);
    sim.execute_trade(1.0).await.unwrap();

    for amount in [0.0, -3.0, f64::NAN] {
        let err = sim.execute_trade(amount).await.unwrap_err();
        assert!(matches!(err, TradeError::InvalidAmount(_)));
    }
    assert_eq!(sim.positions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn trade_without_side_fails() {
    let sim = seeded(1);
    assert_eq!(sim.execute_trade(1.0).await, Err(TradeError::NoSideSelected));
    assert!(sim.positions().is_empty());
}

// =============================================================================
// Exit All
// =============================================================================

#[tokio::test(start_paused = true)]
async fn exit_all_aggregates_signed_pnl() {
    let sim = scripted(&[40.0, -15.0]);
    sim.select_side(Side::Buy);
    sim.execute_trade(1.0).await.unwrap();
    sim.select_side(Side::Sell);
    sim.execute_trade(2.0).await.unwrap();

    let summary = sim.exit_all();
    assert!((summary.aggregate_pnl - 25.0).abs() < 1e-9);
    assert_eq!(summary.outcome, PnlOutcome::Profit);
    assert_eq!(summary.closed, 2);
    assert!(sim.positions().is_empty());
}

#[test]
fn exit_all_on_empty_is_noop() {
    let sim = seeded(1);

    let summary = sim.exit_all();
    assert!(summary.aggregate_pnl.abs() < f64::EPSILON);
    assert_eq!(summary.outcome, PnlOutcome::Flat);
    assert!(sim.positions().is_empty());
    assert!(sim.realized_pnl().abs() < f64::EPSILON);

    let again = sim.exit_all();
    assert_eq!(again, summary);
}

// =============================================================================
// Reproducibility
// =============================================================================

#[tokio::test(start_paused = true)]
async fn same_seed_reproduces_fills() {
    let a = seeded(2024);
    let b = seeded(2024);
    a.select_side(Side::Buy);
    b.select_side(Side::Buy);

    for _ in 0..3 {
        let pa = a.execute_trade(1.0).await.unwrap();
        let pb = b.execute_trade(1.0).await.unwrap();
        assert!((pa.entry_price - pb.entry_price).abs() < f64::EPSILON);
        assert!((pa.pnl - pb.pnl).abs() < f64::EPSILON);
    }
}
