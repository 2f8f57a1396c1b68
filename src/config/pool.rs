use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, RiskError};

/// Keys a pool definition cannot do without
const REQUIRED_KEYS: [&str; 4] = ["market_id", "lltv", "collateral_address", "loan_address"];

/// A uint256 amount has at most 78 digits
pub const MAX_DECIMALS: u32 = 77;

fn default_decimals() -> u32 {
    18
}

/// Definition of one isolated lending market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default)]
    pub name: String,
    pub market_id: String,
    pub lltv: f64,
    #[serde(default)]
    pub collateral: String,
    pub collateral_address: String,
    #[serde(default)]
    pub loan: String,
    pub loan_address: String,
    /// Loan token precision; collateral and debt amounts are both stored in loan token units
    #[serde(default = "default_decimals")]
    pub decimals: u32,
}

impl PoolConfig {
    /// Build a pool definition from an untyped record, reporting the first absent required key
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| RiskError::invalid_config("pool", "expected a table of pool settings"))?;

        for key in REQUIRED_KEYS {
            match object.get(key) {
                None | Some(Value::Null) => return Err(RiskError::missing_config(key)),
                Some(_) => {}
            }
        }

        let pool: PoolConfig = serde_json::from_value(value)?;
        pool.validate()?;
        Ok(pool)
    }

    pub fn validate(&self) -> Result<()> {
        if self.market_id.trim().is_empty() {
            return Err(RiskError::missing_config("market_id"));
        }
        if self.collateral_address.trim().is_empty() {
            return Err(RiskError::missing_config("collateral_address"));
        }
        if self.loan_address.trim().is_empty() {
            return Err(RiskError::missing_config("loan_address"));
        }
        if !self.lltv.is_finite() || self.lltv <= 0.0 || self.lltv > 1.0 {
            return Err(RiskError::invalid_config(
                "lltv",
                format!("must be in (0, 1], got {}", self.lltv),
            ));
        }
        if self.decimals > MAX_DECIMALS {
            return Err(RiskError::invalid_config(
                "decimals",
                format!("must be at most {}, got {}", MAX_DECIMALS, self.decimals),
            ));
        }
        Ok(())
    }

    /// Name used in logs and reports, falling back to the market id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.market_id
        } else {
            &self.name
        }
    }

    /// Divisor taking raw on-chain amounts to token units
    pub fn unit_scale(&self) -> f64 {
        10f64.powi(self.decimals.min(MAX_DECIMALS) as i32)
    }
}
