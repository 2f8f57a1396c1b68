#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::collections::HashMap;

use pool_risk_monitor::config::PoolConfig;
use pool_risk_monitor::models::{CreatePoolSnapshot, CreatePosition, PoolSnapshot, Position, RawRow};

pub const WSTETH: &str = "0x7f39C581F595B53c5cb19bD0b3f8dA6c935E2Ca0";
pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

pub fn pool_config() -> PoolConfig {
    PoolConfig {
        name: "wstETH/USDC".to_string(),
        market_id: "0xabc123".to_string(),
        lltv: 0.86,
        collateral: "wstETH".to_string(),
        collateral_address: WSTETH.to_string(),
        loan: "USDC".to_string(),
        loan_address: USDC.to_string(),
        decimals: 6,
    }
}

pub fn prices() -> HashMap<String, f64> {
    HashMap::from([
        (WSTETH.to_lowercase(), 2500.0),
        (USDC.to_lowercase(), 1.0),
    ])
}

pub fn position(borrower: &str, collateral_value: f64, debt_value: f64, lltv: f64) -> Position {
    Position::new(CreatePosition {
        borrower: borrower.to_string(),
        market_id: "0xmarket1".to_string(),
        collateral_amount: collateral_value / 100.0,
        collateral_value_usd: collateral_value,
        debt_amount: debt_value / 100.0,
        debt_value_usd: debt_value,
        lltv,
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
    })
}

pub fn snapshot(positions: Vec<Position>, total_supply: f64, total_borrow: f64) -> PoolSnapshot {
    PoolSnapshot::new(CreatePoolSnapshot {
        market_id: "0xmarket1".to_string(),
        pool_name: "Test Pool".to_string(),
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        positions,
        total_supply,
        total_borrow,
        lltv: 0.86,
    })
}

/// Five positions with debts 5000/4000/2000/1000/40000 and
/// health factors 1.72/1.075/1.29/1.72/1.075
pub fn sample_snapshot() -> PoolSnapshot {
    snapshot(
        vec![
            position("0x1111", 10_000.0, 5_000.0, 0.86),
            position("0x2222", 5_000.0, 4_000.0, 0.86),
            position("0x3333", 3_000.0, 2_000.0, 0.86),
            position("0x4444", 2_000.0, 1_000.0, 0.86),
            position("0x5555", 50_000.0, 40_000.0, 0.86),
        ],
        100_000.0,
        52_000.0,
    )
}

/// Twenty equal borrowers, all comfortably collateralized
pub fn healthy_snapshot() -> PoolSnapshot {
    let positions = (0..20)
        .map(|i| position(&format!("0x{:04}", i), 30_000.0, 10_000.0, 0.86))
        .collect();
    snapshot(positions, 1_000_000.0, 200_000.0)
}

/// Few borrowers sitting just above liquidation in a highly utilized pool
pub fn risky_snapshot() -> PoolSnapshot {
    snapshot(
        vec![
            position("0xaaaa", 120_000.0, 100_000.0, 0.86),
            position("0xbbbb", 60_000.0, 50_000.0, 0.86),
            position("0xcccc", 25_000.0, 20_000.0, 0.86),
        ],
        180_000.0,
        170_000.0,
    )
}

/// Raw rows in on-chain units (6 decimals) for the wstETH/USDC fixture pool
pub fn positions_rows() -> Vec<RawRow> {
    vec![
        RawRow::new()
            .with("id", "0xabc123")
            .with("borrower", "0x111")
            .with("active_borrow_assets", "10000000000")
            .with("last_borrow_time", "2024-01-01 12:00:00.000 UTC"),
        RawRow::new()
            .with("id", "0xabc123")
            .with("borrower", "0x222")
            .with("active_borrow_assets", 5_000_000_000u64)
            .with("last_borrow_time", "2024-01-02 12:00:00.000 UTC"),
    ]
}

pub fn collateral_rows() -> Vec<RawRow> {
    vec![
        RawRow::new()
            .with("id", "0xabc123")
            .with("borrower", "0x111")
            .with("collateral", "25000000000")
            .with("block_time", "2024-01-01 12:00:00.000 UTC"),
        RawRow::new()
            .with("id", "0xabc123")
            .with("borrower", "0x222")
            .with("collateral", "5500000000")
            .with("block_time", "2024-01-02 12:00:00.000 UTC"),
    ]
}

pub fn pool_state_rows() -> Vec<RawRow> {
    vec![
        RawRow::new()
            .with("call_block_time", "2024-01-01 00:00:00.000 UTC")
            .with("output_totalSupplyAssets", "90000000000")
            .with("output_totalBorrowAssets", "10000000000"),
        RawRow::new()
            .with("call_block_time", "2024-01-02 00:00:00.000 UTC")
            .with("output_totalSupplyAssets", "100000000000")
            .with("output_totalBorrowAssets", "50000000000"),
    ]
}
