use serde::{Deserialize, Serialize};

use crate::utils::format::format_usd;

/// A position that crosses the liquidation boundary under a price shock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidatedPosition {
    pub borrower: String,
    #[serde(with = "crate::utils::float_serde")]
    pub original_hf: f64,
    pub new_hf: f64,
    /// Collateral value after the shock
    pub collateral_value: f64,
    pub debt_value: f64,
    /// Debt not covered by the shocked collateral
    pub shortfall: f64,
    pub liquidation_penalty: f64,
}

/// Outcome of applying one price shock to one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub scenario_name: String,
    /// Shock in percent, e.g. `-10.0`
    pub price_shock_pct: f64,
    pub liquidatable_positions: usize,
    pub total_collateral_at_risk_usd: f64,
    pub total_debt_at_risk_usd: f64,
    pub bad_debt_potential_usd: f64,
    pub pct_pool_affected: f64,
    pub positions_details: Vec<LiquidatedPosition>,
}

/// One row of the liquidation curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub price_shock_pct: f64,
    pub liquidatable_positions: usize,
    pub collateral_at_risk_usd: f64,
    pub debt_at_risk_usd: f64,
    pub bad_debt_potential_usd: f64,
    pub pct_pool_affected: f64,
}

/// A disproportionate jump in pool debt at risk between adjacent scenarios
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CliffPoint {
    pub from_shock_pct: f64,
    pub to_shock_pct: f64,
    /// Relative increase in percent; infinite when rising from zero
    #[serde(with = "crate::utils::float_serde")]
    pub risk_jump_pct: f64,
    pub from_pool_affected: f64,
    pub to_pool_affected: f64,
    /// Increase in percentage points
    pub absolute_increase: f64,
    pub new_liquidations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadingRisk {
    pub cliff_points_count: usize,
    pub avg_risk_increase_per_scenario: f64,
    pub max_risk_increase_per_scenario: f64,
    pub has_severe_cliffs: bool,
    pub worst_cliff: Option<CliffPoint>,
}

impl StressResult {
    pub fn positions_count(&self) -> usize {
        self.positions_details.len()
    }

    pub fn to_row(&self) -> ScenarioRow {
        ScenarioRow {
            price_shock_pct: self.price_shock_pct,
            liquidatable_positions: self.liquidatable_positions,
            collateral_at_risk_usd: self.total_collateral_at_risk_usd,
            debt_at_risk_usd: self.total_debt_at_risk_usd,
            bad_debt_potential_usd: self.bad_debt_potential_usd,
            pct_pool_affected: self.pct_pool_affected,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Stress Test: {}\n\
             ----------------------------------------\n\
             Price Shock: {:+.1}%\n\
             Liquidatable Positions: {}\n\
             Collateral at Risk: {}\n\
             Debt at Risk: {}\n\
             Bad Debt Potential: {}\n\
             Pool Affected: {:.1}%\n",
            self.scenario_name,
            self.price_shock_pct,
            self.liquidatable_positions,
            format_usd(self.total_collateral_at_risk_usd),
            format_usd(self.total_debt_at_risk_usd),
            format_usd(self.bad_debt_potential_usd),
            self.pct_pool_affected,
        )
    }
}
