use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One borrower's state in one market at one instant.
///
/// The health factor is derived at construction from the collateral value, debt
/// value and LLTV and cannot drift from them afterwards: fields are read-only.
/// A position without debt has an infinite health factor.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    borrower: String,
    market_id: String,
    collateral_amount: f64,
    collateral_value_usd: f64,
    debt_amount: f64,
    debt_value_usd: f64,
    health_factor: f64,
    lltv: f64,
    timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePosition {
    pub borrower: String,
    pub market_id: String,
    pub collateral_amount: f64,
    pub collateral_value_usd: f64,
    pub debt_amount: f64,
    pub debt_value_usd: f64,
    pub lltv: f64,
    pub timestamp: DateTime<Utc>,
}

/// Serialized form of a [`Position`], including its derived quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub borrower: String,
    pub market_id: String,
    pub collateral_amount: f64,
    pub collateral_value_usd: f64,
    pub debt_amount: f64,
    pub debt_value_usd: f64,
    #[serde(with = "crate::utils::float_serde")]
    pub health_factor: f64,
    pub lltv: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub liquidation_price: f64,
    #[serde(default)]
    pub is_healthy: bool,
    #[serde(default, with = "crate::utils::float_serde")]
    pub liquidation_buffer: f64,
}

/// `(collateral_value * lltv) / debt_value`, infinite without debt
pub fn health_factor(collateral_value_usd: f64, debt_value_usd: f64, lltv: f64) -> f64 {
    if debt_value_usd > 0.0 {
        (collateral_value_usd * lltv) / debt_value_usd
    } else {
        f64::INFINITY
    }
}

impl Position {
    pub fn new(create_position: CreatePosition) -> Self {
        let health_factor = health_factor(
            create_position.collateral_value_usd,
            create_position.debt_value_usd,
            create_position.lltv,
        );

        Self {
            borrower: create_position.borrower,
            market_id: create_position.market_id,
            collateral_amount: create_position.collateral_amount,
            collateral_value_usd: create_position.collateral_value_usd,
            debt_amount: create_position.debt_amount,
            debt_value_usd: create_position.debt_value_usd,
            health_factor,
            lltv: create_position.lltv,
            timestamp: create_position.timestamp,
        }
    }

    pub fn borrower(&self) -> &str {
        &self.borrower
    }

    pub fn market_id(&self) -> &str {
        &self.market_id
    }

    pub fn collateral_amount(&self) -> f64 {
        self.collateral_amount
    }

    pub fn collateral_value_usd(&self) -> f64 {
        self.collateral_value_usd
    }

    pub fn debt_amount(&self) -> f64 {
        self.debt_amount
    }

    pub fn debt_value_usd(&self) -> f64 {
        self.debt_value_usd
    }

    pub fn health_factor(&self) -> f64 {
        self.health_factor
    }

    pub fn lltv(&self) -> f64 {
        self.lltv
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn has_debt(&self) -> bool {
        self.health_factor.is_finite()
    }

    /// Above the liquidation boundary (HF > 1.0)
    pub fn is_healthy(&self) -> bool {
        self.health_factor > 1.0
    }

    /// Collateral price at which the health factor reaches 1.0, 0 without collateral
    pub fn liquidation_price(&self) -> f64 {
        if self.collateral_amount == 0.0 {
            return 0.0;
        }

        self.debt_value_usd / (self.collateral_amount * self.lltv)
    }

    /// Health factor headroom above 1.0 (0.15 means 15% above liquidation)
    pub fn liquidation_buffer(&self) -> f64 {
        if self.health_factor.is_infinite() {
            return f64::INFINITY;
        }

        self.health_factor - 1.0
    }

    /// Health factor after a uniform collateral price move, e.g. `-0.10` for a 10% drop
    pub fn health_factor_after_shock(&self, price_shock: f64) -> f64 {
        let shocked_collateral = self.collateral_value_usd * (1.0 + price_shock);
        health_factor(shocked_collateral, self.debt_value_usd, self.lltv)
    }

    /// Fractional collateral price drop that brings the health factor to 1.0.
    /// Zero for debt-free positions and positions already at or below the boundary.
    pub fn liquidation_price_drop_pct(&self) -> f64 {
        if self.health_factor.is_infinite() || self.health_factor <= 1.0 {
            return 0.0;
        }

        1.0 - (1.0 / self.health_factor)
    }

    pub fn to_record(&self) -> PositionRecord {
        PositionRecord {
            borrower: self.borrower.clone(),
            market_id: self.market_id.clone(),
            collateral_amount: self.collateral_amount,
            collateral_value_usd: self.collateral_value_usd,
            debt_amount: self.debt_amount,
            debt_value_usd: self.debt_value_usd,
            health_factor: self.health_factor,
            lltv: self.lltv,
            timestamp: self.timestamp,
            liquidation_price: self.liquidation_price(),
            is_healthy: self.is_healthy(),
            liquidation_buffer: self.liquidation_buffer(),
        }
    }

    /// Rebuild a position from its serialized form; derived fields are recomputed
    pub fn from_record(record: PositionRecord) -> Self {
        Position::new(CreatePosition {
            borrower: record.borrower,
            market_id: record.market_id,
            collateral_amount: record.collateral_amount,
            collateral_value_usd: record.collateral_value_usd,
            debt_amount: record.debt_amount,
            debt_value_usd: record.debt_value_usd,
            lltv: record.lltv,
            timestamp: record.timestamp,
        })
    }
}

impl From<&Position> for PositionRecord {
    fn from(position: &Position) -> Self {
        position.to_record()
    }
}

impl From<PositionRecord> for Position {
    fn from(record: PositionRecord) -> Self {
        Position::from_record(record)
    }
}
