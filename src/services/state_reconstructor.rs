use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, info_span, warn, Span};

use crate::config::PoolConfig;
use crate::error::{Result, SkipReason};
use crate::models::{
    left_join, CreatePoolSnapshot, CreatePosition, PoolSnapshot, Position, RawRow,
};
use crate::utils::time::now_utc;

const JOIN_KEYS: [&str; 2] = ["market_id", "borrower"];
const JOIN_SUFFIXES: (&str, &str) = ("_borrow", "_collateral");

/// Debt columns in order of preference
const DEBT_FIELDS: [&str; 2] = ["active_borrow_assets", "active_borrow_shares"];

/// Columns a position timestamp is read from, in order of preference
const TIMESTAMP_FIELDS: [&str; 4] = [
    "last_borrow_time",
    "block_time",
    "block_time_borrow",
    "block_time_collateral",
];

/// Columns pool state rows are ordered by, newest first
const POOL_STATE_TIME_FIELDS: [&str; 2] = ["call_block_time", "block_time"];

/// A merged row that could not be turned into a position
#[derive(Debug, Clone, PartialEq)]
pub struct RowSkip {
    pub index: usize,
    pub borrower: Option<String>,
    pub reason: SkipReason,
}

/// Positions rebuilt from raw rows plus the rows that were dropped
#[derive(Debug, Clone, Default)]
pub struct ReconstructionReport {
    pub positions: Vec<Position>,
    pub skipped: Vec<RowSkip>,
}

impl ReconstructionReport {
    pub fn num_skipped(&self) -> usize {
        self.skipped.len()
    }
}

/// Turns raw position, collateral and pool state rows into a [`PoolSnapshot`]
pub struct StateReconstructor {
    pool: PoolConfig,
    prices: HashMap<String, f64>,
    span: Span,
}

impl StateReconstructor {
    /// Fails only when the pool definition is missing required settings.
    /// Price keys are matched case-insensitively.
    pub fn new(pool: PoolConfig, prices: &HashMap<String, f64>) -> Result<Self> {
        pool.validate()?;

        let prices = prices
            .iter()
            .map(|(address, price)| (address.to_lowercase(), *price))
            .collect();
        let span = info_span!("reconstructor", pool = %pool.display_name());

        info!(
            parent: &span,
            decimals = pool.decimals,
            "Initialized reconstructor for {}",
            pool.display_name()
        );

        Ok(Self { pool, prices, span })
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn pool(&self) -> &PoolConfig {
        &self.pool
    }

    /// USD price of a token; an unknown token prices at 0
    pub fn token_price(&self, address: &str) -> f64 {
        let address = address.to_lowercase();
        match self.prices.get(&address) {
            Some(price) => *price,
            None => {
                warn!(parent: &self.span, token = %address, "Price not found, using 0");
                0.0
            }
        }
    }

    /// Join positions to collateral and rebuild every position with its health factor.
    ///
    /// Malformed rows are skipped and listed in the report; they never fail the batch.
    pub fn reconstruct_positions(
        &self,
        positions_rows: &[RawRow],
        collateral_rows: &[RawRow],
    ) -> ReconstructionReport {
        let _enter = self.span.enter();
        info!("Reconstructing positions...");

        if positions_rows.is_empty() {
            warn!("No positions data available");
            return ReconstructionReport::default();
        }

        let positions_rows = normalize_rows(positions_rows, false);
        let collateral_rows = normalize_rows(collateral_rows, true);
        let merged = left_join(&positions_rows, &collateral_rows, &JOIN_KEYS, JOIN_SUFFIXES);

        let loan_price = self.token_price(&self.pool.loan_address);
        info!("Using {} price: ${:.2}", self.pool.loan, loan_price);

        let mut report = ReconstructionReport::default();

        for (index, row) in merged.iter().enumerate() {
            match self.position_from_row(row, loan_price) {
                Ok(position) => report.positions.push(position),
                Err(reason) => {
                    let borrower = row.get_str("borrower").map(str::to_string);
                    warn!(
                        row = index,
                        borrower = borrower.as_deref().unwrap_or("<unknown>"),
                        "Skipping position row: {}",
                        reason
                    );
                    report.skipped.push(RowSkip { index, borrower, reason });
                }
            }
        }

        info!(
            skipped = report.num_skipped(),
            "Reconstructed {} positions",
            report.positions.len()
        );
        log_health_factor_stats(&report.positions);

        report
    }

    fn position_from_row(
        &self,
        row: &RawRow,
        loan_price: f64,
    ) -> std::result::Result<Position, SkipReason> {
        let borrower = row
            .get_str("borrower")
            .filter(|b| !b.is_empty())
            .ok_or(SkipReason::MissingBorrower)?;
        let market_id = row
            .get_str("market_id")
            .ok_or_else(|| SkipReason::MissingField("market_id".to_string()))?;

        let collateral_raw = match row.get_f64("collateral_assets") {
            Ok(value) => value,
            Err(SkipReason::MissingField(_)) => 0.0,
            Err(other) => return Err(other),
        };
        let debt_raw = debt_amount(row)?;

        // Both collateral and debt are denominated in the loan token
        let scale = self.pool.unit_scale();
        let collateral_amount = collateral_raw / scale;
        let debt_amount = debt_raw / scale;

        let timestamp = row.get_timestamp(&TIMESTAMP_FIELDS).unwrap_or_else(now_utc);

        Ok(Position::new(CreatePosition {
            borrower: borrower.to_string(),
            market_id: market_id.to_string(),
            collateral_amount,
            collateral_value_usd: collateral_amount * loan_price,
            debt_amount,
            debt_value_usd: debt_amount * loan_price,
            lltv: self.pool.lltv,
            timestamp,
        }))
    }

    /// Build the full snapshot. Without pool state rows, supply and borrow fall
    /// back to the summed collateral and debt of the reconstructed positions.
    pub fn create_snapshot(
        &self,
        positions_rows: &[RawRow],
        collateral_rows: &[RawRow],
        pool_state_rows: &[RawRow],
        timestamp: Option<DateTime<Utc>>,
    ) -> PoolSnapshot {
        self.create_snapshot_with_report(positions_rows, collateral_rows, pool_state_rows, timestamp)
            .0
    }

    /// Same as [`create_snapshot`](Self::create_snapshot), also returning the skipped rows
    pub fn create_snapshot_with_report(
        &self,
        positions_rows: &[RawRow],
        collateral_rows: &[RawRow],
        pool_state_rows: &[RawRow],
        timestamp: Option<DateTime<Utc>>,
    ) -> (PoolSnapshot, Vec<RowSkip>) {
        let ReconstructionReport { positions, skipped } =
            self.reconstruct_positions(positions_rows, collateral_rows);

        let _enter = self.span.enter();
        info!("Creating snapshot for {}...", self.pool.display_name());

        let (total_supply, total_borrow) = match latest_pool_state(pool_state_rows) {
            Some(state) => {
                let scale = self.pool.unit_scale();
                let loan_price = self.token_price(&self.pool.loan_address);
                let supply = pool_state_amount(state, "output_totalSupplyAssets");
                let borrow = pool_state_amount(state, "output_totalBorrowAssets");
                (supply / scale * loan_price, borrow / scale * loan_price)
            }
            None => {
                warn!("No pool state data, using aggregated values");
                (
                    positions.iter().map(|p| p.collateral_value_usd()).sum(),
                    positions.iter().map(|p| p.debt_value_usd()).sum(),
                )
            }
        };

        let snapshot = PoolSnapshot::new(CreatePoolSnapshot {
            market_id: self.pool.market_id.clone(),
            pool_name: self.pool.name.clone(),
            timestamp: timestamp.unwrap_or_else(now_utc),
            positions,
            total_supply,
            total_borrow,
            lltv: self.pool.lltv,
        });

        info!(
            "Snapshot created: {} positions, utilization={:.1}%",
            snapshot.num_positions(),
            snapshot.utilization() * 100.0
        );

        (snapshot, skipped)
    }
}

/// Rebuild positions for `pool` from raw rows
pub fn reconstruct(
    pool: &PoolConfig,
    prices: &HashMap<String, f64>,
    positions_rows: &[RawRow],
    collateral_rows: &[RawRow],
) -> Result<Vec<Position>> {
    let reconstructor = StateReconstructor::new(pool.clone(), prices)?;
    Ok(reconstructor
        .reconstruct_positions(positions_rows, collateral_rows)
        .positions)
}

/// Build a snapshot for `pool` from raw rows
pub fn create_snapshot(
    pool: &PoolConfig,
    prices: &HashMap<String, f64>,
    positions_rows: &[RawRow],
    collateral_rows: &[RawRow],
    pool_state_rows: &[RawRow],
    timestamp: Option<DateTime<Utc>>,
) -> Result<PoolSnapshot> {
    let reconstructor = StateReconstructor::new(pool.clone(), prices)?;
    Ok(reconstructor.create_snapshot(positions_rows, collateral_rows, pool_state_rows, timestamp))
}

fn normalize_rows(rows: &[RawRow], collateral: bool) -> Vec<RawRow> {
    rows.iter()
        .cloned()
        .map(|mut row| {
            row.normalize_alias("id", "market_id");
            if collateral {
                row.normalize_alias("collateral", "collateral_assets");
            }
            row
        })
        .collect()
}

/// Raw debt of a merged row. Only a row with neither debt column is skipped.
fn debt_amount(row: &RawRow) -> std::result::Result<f64, SkipReason> {
    for field in DEBT_FIELDS {
        match row.get_f64(field) {
            Ok(value) => return Ok(value),
            Err(SkipReason::MissingField(_)) => continue,
            Err(other) => return Err(other),
        }
    }
    Err(SkipReason::MissingField(DEBT_FIELDS.join("|")))
}

fn latest_pool_state(rows: &[RawRow]) -> Option<&RawRow> {
    // Rows without a timestamp sort last; ties keep the first row
    rows.iter().enumerate().min_by(|(ia, a), (ib, b)| {
        let ta = a.get_timestamp(&POOL_STATE_TIME_FIELDS);
        let tb = b.get_timestamp(&POOL_STATE_TIME_FIELDS);
        tb.cmp(&ta).then(ia.cmp(ib))
    })
    .map(|(_, row)| row)
}

fn pool_state_amount(row: &RawRow, field: &str) -> f64 {
    match row.get_f64(field) {
        Ok(value) => value,
        Err(SkipReason::MissingField(_)) => 0.0,
        Err(reason) => {
            warn!("Pool state {}, using 0", reason);
            0.0
        }
    }
}

fn log_health_factor_stats(positions: &[Position]) {
    if positions.is_empty() {
        return;
    }

    let healthy = positions.iter().filter(|p| p.is_healthy()).count();
    info!(
        "  Healthy positions: {}/{} ({:.1}%)",
        healthy,
        positions.len(),
        healthy as f64 / positions.len() as f64 * 100.0
    );

    let finite: Vec<f64> = positions
        .iter()
        .map(|p| p.health_factor())
        .filter(|hf| hf.is_finite())
        .collect();
    if finite.is_empty() {
        return;
    }

    let avg = finite.iter().sum::<f64>() / finite.len() as f64;
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    debug!(avg, min, max, "health factor stats");
    info!("  Health factors: avg={:.2}, min={:.2}, max={:.2}", avg, min, max);
}
