mod common;

use std::fs;

use common::*;
use pool_risk_monitor::config::{PoolConfig, Settings};
use pool_risk_monitor::models::RiskLevel;
use pool_risk_monitor::services::{analyze_pool, InputLoader, SnapshotStore};

fn write_inputs(root: &std::path::Path, pool: &PoolConfig) {
    let dir = root.join(&pool.market_id);
    fs::create_dir_all(&dir).unwrap();

    fs::write(dir.join("positions.json"), serde_json::to_string(&positions_rows()).unwrap()).unwrap();
    fs::write(dir.join("collateral.json"), serde_json::to_string(&collateral_rows()).unwrap()).unwrap();
    fs::write(dir.join("pool_state.json"), serde_json::to_string(&pool_state_rows()).unwrap()).unwrap();
    fs::write(dir.join("prices.json"), serde_json::to_string(&prices()).unwrap()).unwrap();
}

#[test]
fn test_full_pool_analysis_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool_config();
    write_inputs(dir.path(), &pool);

    let inputs = InputLoader::new(dir.path()).load(&pool.market_id).unwrap();
    let report = analyze_pool(&pool, &inputs, &Settings::default()).unwrap();

    assert_eq!(report.snapshot.num_positions(), 2);
    assert_eq!(report.snapshot.utilization(), 0.5);
    assert!(report.skipped_rows.is_empty());
    assert_eq!(report.metrics.total_debt_usd, 15_000.0);
    assert_eq!(report.scenarios.len(), 7);

    // 0x222 is already below 1.0, so every scenario has 1/3 of debt at risk or more
    assert!(report.scenarios.iter().all(|row| row.pct_pool_affected >= 100.0 / 3.0 - 1e-9));
    assert_eq!(report.liquidation_threshold_pct, Some(-5.0));

    assert!((0.0..=100.0).contains(&report.composite_score));
    assert_eq!(report.risk_level, RiskLevel::from_score(report.composite_score));
    assert!(report.score_report.contains("wstETH/USDC"));
    assert!(report.metrics_summary.contains("Total Positions: 2"));
    assert!(report.stress_summary.contains("Stress Test Summary"));
}

#[test]
fn test_pipeline_snapshot_survives_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool_config();
    write_inputs(dir.path(), &pool);

    let inputs = InputLoader::new(dir.path()).load(&pool.market_id).unwrap();
    let report = analyze_pool(&pool, &inputs, &Settings::default()).unwrap();

    let store = SnapshotStore::new(dir.path().join("snapshots"));
    let path = store.store(&report.snapshot).unwrap();
    let loaded = SnapshotStore::load(&path).unwrap();

    for (before, after) in report.snapshot.positions().iter().zip(loaded.positions()) {
        assert_eq!(before.borrower(), after.borrower());
        assert_eq!(before.health_factor(), after.health_factor());
        assert_eq!(before.debt_value_usd(), after.debt_value_usd());
    }
}

#[test]
fn test_missing_inputs_degrade_gracefully() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool_config();

    let inputs = InputLoader::new(dir.path()).load(&pool.market_id).unwrap();
    let report = analyze_pool(&pool, &inputs, &Settings::default()).unwrap();

    assert_eq!(report.snapshot.num_positions(), 0);
    assert!(report.scenarios.iter().all(|row| row.pct_pool_affected == 0.0));
    assert!(report.cliff_points.is_empty());
    assert_eq!(report.liquidation_threshold_pct, None);
}

#[test]
fn test_bad_pool_config_fails_only_that_pool() {
    let dir = tempfile::tempdir().unwrap();
    let good = pool_config();
    write_inputs(dir.path(), &good);

    let mut bad = pool_config();
    bad.lltv = 1.5;

    let loader = InputLoader::new(dir.path());
    let settings = Settings::default();

    let bad_result = analyze_pool(&bad, &loader.load(&bad.market_id).unwrap(), &settings);
    assert!(bad_result.unwrap_err().is_configuration_error());

    let good_result = analyze_pool(&good, &loader.load(&good.market_id).unwrap(), &settings);
    assert!(good_result.is_ok());
}

#[test]
fn test_custom_stress_settings_are_used() {
    let dir = tempfile::tempdir().unwrap();
    let pool = pool_config();
    write_inputs(dir.path(), &pool);

    let mut settings = Settings::default();
    settings.stress.scenarios = vec![-0.25];

    let inputs = InputLoader::new(dir.path()).load(&pool.market_id).unwrap();
    let report = analyze_pool(&pool, &inputs, &settings).unwrap();

    assert_eq!(report.scenarios.len(), 1);
    assert_eq!(report.scenarios[0].price_shock_pct, -25.0);
}
