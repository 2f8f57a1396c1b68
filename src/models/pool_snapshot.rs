use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::position::{Position, PositionRecord};

/// A pool's full state at one instant.
///
/// The snapshot exclusively owns its positions and exposes them read-only;
/// aggregate figures are recomputed from the positions on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolSnapshot {
    market_id: String,
    pool_name: String,
    timestamp: DateTime<Utc>,
    positions: Vec<Position>,
    total_supply: f64,
    total_borrow: f64,
    utilization: f64,
    lltv: f64,
}

#[derive(Debug, Clone)]
pub struct CreatePoolSnapshot {
    pub market_id: String,
    pub pool_name: String,
    pub timestamp: DateTime<Utc>,
    pub positions: Vec<Position>,
    pub total_supply: f64,
    pub total_borrow: f64,
    pub lltv: f64,
}

/// Serialized form of a [`PoolSnapshot`] header, without the positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub market_id: String,
    pub pool_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub num_positions: usize,
    pub total_supply: f64,
    pub total_borrow: f64,
    pub utilization: f64,
    pub lltv: f64,
    #[serde(default)]
    pub total_collateral_usd: f64,
    #[serde(default)]
    pub total_debt_usd: f64,
    #[serde(default, with = "crate::utils::float_serde")]
    pub avg_health_factor: f64,
    #[serde(default, with = "crate::utils::float_serde")]
    pub weighted_avg_health_factor: f64,
    #[serde(default)]
    pub num_healthy_positions: usize,
    #[serde(default)]
    pub num_unhealthy_positions: usize,
}

/// Persisted document: snapshot header plus every position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub snapshot: SnapshotRecord,
    pub positions: Vec<PositionRecord>,
}

/// `borrow / supply`, 0 when there is no supply
pub fn utilization(total_supply: f64, total_borrow: f64) -> f64 {
    if total_supply > 0.0 {
        total_borrow / total_supply
    } else {
        0.0
    }
}

impl PoolSnapshot {
    pub fn new(create_snapshot: CreatePoolSnapshot) -> Self {
        Self {
            market_id: create_snapshot.market_id,
            pool_name: create_snapshot.pool_name,
            timestamp: create_snapshot.timestamp,
            positions: create_snapshot.positions,
            total_supply: create_snapshot.total_supply,
            total_borrow: create_snapshot.total_borrow,
            utilization: utilization(create_snapshot.total_supply, create_snapshot.total_borrow),
            lltv: create_snapshot.lltv,
        }
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn total_supply(&self) -> f64 {
        self.total_supply
    }

    pub fn total_borrow(&self) -> f64 {
        self.total_borrow
    }

    pub fn utilization(&self) -> f64 {
        self.utilization
    }

    pub fn lltv(&self) -> f64 {
        self.lltv
    }

    pub fn total_collateral_usd(&self) -> f64 {
        self.positions.iter().map(|p| p.collateral_value_usd()).sum()
    }

    pub fn total_debt_usd(&self) -> f64 {
        self.positions.iter().map(|p| p.debt_value_usd()).sum()
    }

    pub fn num_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn num_healthy_positions(&self) -> usize {
        self.positions.iter().filter(|p| p.is_healthy()).count()
    }

    pub fn num_unhealthy_positions(&self) -> usize {
        self.positions.iter().filter(|p| !p.is_healthy()).count()
    }

    /// Simple mean of the finite health factors; infinite when there are none
    pub fn avg_health_factor(&self) -> f64 {
        let finite: Vec<f64> = self
            .positions
            .iter()
            .map(|p| p.health_factor())
            .filter(|hf| hf.is_finite())
            .collect();

        if finite.is_empty() {
            return f64::INFINITY;
        }

        finite.iter().sum::<f64>() / finite.len() as f64
    }

    /// Debt-weighted health factor over finite-HF positions; infinite without debt
    pub fn weighted_avg_health_factor(&self) -> f64 {
        if self.positions.is_empty() {
            return f64::INFINITY;
        }

        let total_debt = self.total_debt_usd();
        if total_debt == 0.0 {
            return f64::INFINITY;
        }

        let weighted_sum: f64 = self
            .positions
            .iter()
            .filter(|p| p.has_debt())
            .map(|p| p.health_factor() * p.debt_value_usd())
            .sum();

        weighted_sum / total_debt
    }

    /// Positions whose health factor lies in `[min_hf, max_hf]`; either bound may be open
    pub fn get_positions_by_health_factor(
        &self,
        min_hf: Option<f64>,
        max_hf: Option<f64>,
    ) -> Vec<&Position> {
        self.positions
            .iter()
            .filter(|p| min_hf.map_or(true, |min| p.health_factor() >= min))
            .filter(|p| max_hf.map_or(true, |max| p.health_factor() <= max))
            .collect()
    }

    /// Largest `n` borrowers by debt value; ties keep snapshot order
    pub fn get_top_borrowers(&self, n: usize) -> Vec<&Position> {
        let mut sorted: Vec<&Position> = self.positions.iter().collect();
        sorted.sort_by(|a, b| b.debt_value_usd().total_cmp(&a.debt_value_usd()));
        sorted.truncate(n);
        sorted
    }

    pub fn to_record(&self) -> SnapshotRecord {
        SnapshotRecord {
            market_id: self.market_id.clone(),
            pool_name: self.pool_name.clone(),
            timestamp: self.timestamp,
            num_positions: self.num_positions(),
            total_supply: self.total_supply,
            total_borrow: self.total_borrow,
            utilization: self.utilization,
            lltv: self.lltv,
            total_collateral_usd: self.total_collateral_usd(),
            total_debt_usd: self.total_debt_usd(),
            avg_health_factor: self.avg_health_factor(),
            weighted_avg_health_factor: self.weighted_avg_health_factor(),
            num_healthy_positions: self.num_healthy_positions(),
            num_unhealthy_positions: self.num_unhealthy_positions(),
        }
    }

    pub fn to_document(&self) -> SnapshotDocument {
        SnapshotDocument {
            snapshot: self.to_record(),
            positions: self.positions.iter().map(Position::to_record).collect(),
        }
    }

    /// Rebuild a snapshot from a persisted document. Aggregates stored in the
    /// header are ignored and recomputed from the positions.
    pub fn from_document(document: SnapshotDocument) -> Self {
        let positions = document
            .positions
            .into_iter()
            .map(Position::from_record)
            .collect();

        PoolSnapshot::new(CreatePoolSnapshot {
            market_id: document.snapshot.market_id,
            pool_name: document.snapshot.pool_name,
            timestamp: document.snapshot.timestamp,
            positions,
            total_supply: document.snapshot.total_supply,
            total_borrow: document.snapshot.total_borrow,
            lltv: document.snapshot.lltv,
        })
    }
}
