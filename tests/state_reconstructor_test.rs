mod common;

use chrono::{TimeZone, Utc};
use serde_json::json;

use common::*;
use pool_risk_monitor::error::SkipReason;
use pool_risk_monitor::models::RawRow;
use pool_risk_monitor::services::{
    create_snapshot, reconstruct, RiskMetrics, RiskScorer, StateReconstructor, StressTestEngine,
};
use pool_risk_monitor::RiskError;

fn reconstructor() -> StateReconstructor {
    StateReconstructor::new(pool_config(), &prices()).unwrap()
}

#[test]
fn test_reconstruct_positions_from_raw_units() {
    let report = reconstructor().reconstruct_positions(&positions_rows(), &collateral_rows());

    assert!(report.skipped.is_empty());
    assert_eq!(report.positions.len(), 2);

    let first = &report.positions[0];
    assert_eq!(first.borrower(), "0x111");
    assert_eq!(first.market_id(), "0xabc123");
    assert_eq!(first.collateral_amount(), 25_000.0);
    assert_eq!(first.collateral_value_usd(), 25_000.0);
    assert_eq!(first.debt_value_usd(), 10_000.0);
    assert!((first.health_factor() - 2.15).abs() < 1e-9);
    assert_eq!(first.timestamp(), Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());

    let second = &report.positions[1];
    assert!(!second.is_healthy());
}

#[test]
fn test_missing_collateral_defaults_to_zero() {
    let collateral = vec![collateral_rows().remove(0)];
    let positions = reconstruct(&pool_config(), &prices(), &positions_rows(), &collateral).unwrap();

    assert_eq!(positions.len(), 2);
    let uncollateralized = positions.iter().find(|p| p.borrower() == "0x222").unwrap();
    assert_eq!(uncollateralized.collateral_amount(), 0.0);
    assert_eq!(uncollateralized.health_factor(), 0.0);
}

#[test]
fn test_zero_debt_is_infinite_health_factor() {
    let rows = vec![RawRow::new()
        .with("market_id", "0xabc123")
        .with("borrower", "0x111")
        .with("active_borrow_assets", 0)];
    let positions = reconstruct(&pool_config(), &prices(), &rows, &collateral_rows()).unwrap();

    assert_eq!(positions.len(), 1);
    assert!(positions[0].health_factor().is_infinite());
    assert!(positions[0].is_healthy());
}

#[test]
fn test_malformed_rows_are_skipped_not_fatal() {
    let mut rows = positions_rows();
    rows.push(RawRow::new().with("market_id", "0xabc123").with("borrower", "0x333"));
    rows.push(
        RawRow::new()
            .with("market_id", "0xabc123")
            .with("borrower", "0x444")
            .with("active_borrow_assets", "lots"),
    );
    rows.push(RawRow::new().with("market_id", "0xabc123").with("active_borrow_assets", 1));

    let report = reconstructor().reconstruct_positions(&rows, &collateral_rows());

    assert_eq!(report.positions.len(), 2);
    assert_eq!(report.num_skipped(), 3);
    assert!(matches!(report.skipped[0].reason, SkipReason::MissingField(_)));
    assert_eq!(report.skipped[0].borrower.as_deref(), Some("0x333"));
    assert!(matches!(report.skipped[1].reason, SkipReason::NonNumeric { .. }));
    assert_eq!(report.skipped[2].reason, SkipReason::MissingBorrower);
}

#[test]
fn test_overflowing_debt_rows_are_skipped() {
    let mut rows = positions_rows();
    rows.push(
        RawRow::new()
            .with("market_id", "0xabc123")
            .with("borrower", "0x555")
            .with("active_borrow_assets", "1e400"),
    );
    rows.push(
        RawRow::new()
            .with("market_id", "0xabc123")
            .with("borrower", "0x666")
            .with("active_borrow_assets", "inf"),
    );

    let (snapshot, skipped) =
        reconstructor().create_snapshot_with_report(&rows, &collateral_rows(), &pool_state_rows(), None);

    assert_eq!(skipped.len(), 2);
    assert!(skipped.iter().all(|s| matches!(s.reason, SkipReason::NonNumeric { .. })));
    assert_eq!(snapshot.num_positions(), 2);
    assert_eq!(snapshot.total_debt_usd(), 15_000.0);

    let scorer = RiskScorer::new(RiskMetrics::new(&snapshot), Some(StressTestEngine::new(&snapshot)));
    let composite = scorer.calculate_composite_score();
    assert!((0.0..=100.0).contains(&composite), "composite {composite}");
}

#[test]
fn test_borrow_shares_used_when_assets_absent() {
    let rows = vec![RawRow::new()
        .with("market_id", "0xabc123")
        .with("borrower", "0x111")
        .with("active_borrow_shares", "2000000000")];
    let positions = reconstruct(&pool_config(), &prices(), &rows, &[]).unwrap();
    assert_eq!(positions[0].debt_value_usd(), 2_000.0);
}

#[test]
fn test_missing_timestamp_defaults_to_now() {
    let before = Utc::now();
    let rows = vec![RawRow::new()
        .with("market_id", "0xabc123")
        .with("borrower", "0x111")
        .with("active_borrow_assets", 1_000_000)
        .with("last_borrow_time", json!(null))];
    let positions = reconstruct(&pool_config(), &prices(), &rows, &[]).unwrap();
    assert!(positions[0].timestamp() >= before);
}

#[test]
fn test_missing_loan_price_values_at_zero() {
    let positions = reconstruct(
        &pool_config(),
        &Default::default(),
        &positions_rows(),
        &collateral_rows(),
    )
    .unwrap();

    assert_eq!(positions.len(), 2);
    assert!(positions.iter().all(|p| p.debt_value_usd() == 0.0));
    assert!(positions.iter().all(|p| p.health_factor().is_infinite()));
}

#[test]
fn test_empty_input_gives_empty_snapshot() {
    let snapshot = reconstructor().create_snapshot(&[], &[], &[], None);
    assert_eq!(snapshot.num_positions(), 0);
    assert_eq!(snapshot.total_supply(), 0.0);
    assert_eq!(snapshot.utilization(), 0.0);
}

#[test]
fn test_snapshot_uses_latest_pool_state() {
    let timestamp = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
    let snapshot = create_snapshot(
        &pool_config(),
        &prices(),
        &positions_rows(),
        &collateral_rows(),
        &pool_state_rows(),
        Some(timestamp),
    )
    .unwrap();

    assert_eq!(snapshot.market_id(), "0xabc123");
    assert_eq!(snapshot.pool_name(), "wstETH/USDC");
    assert_eq!(snapshot.timestamp(), timestamp);
    assert_eq!(snapshot.num_positions(), 2);
    assert_eq!(snapshot.total_supply(), 100_000.0);
    assert_eq!(snapshot.total_borrow(), 50_000.0);
    assert_eq!(snapshot.utilization(), 0.5);
    assert_eq!(snapshot.lltv(), 0.86);
}

#[test]
fn test_snapshot_falls_back_to_position_totals() {
    let snapshot = reconstructor().create_snapshot(&positions_rows(), &collateral_rows(), &[], None);

    assert_eq!(snapshot.total_supply(), 30_500.0);
    assert_eq!(snapshot.total_borrow(), 15_000.0);
    assert!((snapshot.utilization() - 15_000.0 / 30_500.0).abs() < 1e-12);
}

#[test]
fn test_missing_required_config_is_fatal() {
    let mut pool = pool_config();
    pool.market_id.clear();

    let err = reconstruct(&pool, &prices(), &positions_rows(), &collateral_rows()).unwrap_err();
    assert!(matches!(err, RiskError::MissingConfig { ref field } if field == "market_id"));
    assert!(err.is_configuration_error());
}
