use serde::{Deserialize, Serialize};

/// Share of debt held by the largest borrowers
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationMetrics {
    pub top_5_pct: f64,
    pub top_10_pct: f64,
    pub top_5_debt_usd: f64,
    pub top_10_debt_usd: f64,
}

/// Percent of total debt in each health factor band.
/// Bands are closed on the low end: `[1.05, 1.1)` and so on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthFactorDistribution {
    #[serde(rename = "hf_below_1.05")]
    pub hf_below_1_05: f64,
    #[serde(rename = "hf_1.05_to_1.1")]
    pub hf_1_05_to_1_1: f64,
    #[serde(rename = "hf_1.1_to_1.2")]
    pub hf_1_1_to_1_2: f64,
    #[serde(rename = "hf_1.2_to_1.5")]
    pub hf_1_2_to_1_5: f64,
    #[serde(rename = "hf_above_1.5")]
    pub hf_above_1_5: f64,
}

impl HealthFactorDistribution {
    pub fn total(&self) -> f64 {
        self.hf_below_1_05 + self.hf_1_05_to_1_1 + self.hf_1_1_to_1_2 + self.hf_1_2_to_1_5 + self.hf_above_1_5
    }

    /// Percent of debt below HF 1.1
    pub fn below_1_1(&self) -> f64 {
        self.hf_below_1_05 + self.hf_1_05_to_1_1
    }
}

/// Position counts by debt size, not debt weighted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionSizeDistribution {
    pub micro_below_10k: usize,
    pub small_10k_to_100k: usize,
    pub medium_100k_to_1m: usize,
    pub large_1m_to_10m: usize,
    pub whale_above_10m: usize,
}

impl PositionSizeDistribution {
    pub fn total(&self) -> usize {
        self.micro_below_10k
            + self.small_10k_to_100k
            + self.medium_100k_to_1m
            + self.large_1m_to_10m
            + self.whale_above_10m
    }
}

/// Every pool-level metric computed for one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolMetrics {
    pub utilization_rate: f64,
    pub total_positions: usize,
    pub total_debt_usd: f64,
    pub total_collateral_usd: f64,

    pub top_5_concentration_pct: f64,
    pub top_10_concentration_pct: f64,
    pub top_5_debt_usd: f64,
    pub top_10_debt_usd: f64,
    pub gini_coefficient: f64,
    pub herfindahl_index: f64,

    #[serde(with = "crate::utils::float_serde")]
    pub weighted_avg_health_factor: f64,
    pub debt_below_hf_1_05_pct: f64,
    pub debt_below_hf_1_1_pct: f64,
    pub liquidation_buffer_10pct: f64,
    pub positions_at_risk_count: usize,

    pub micro_positions: usize,
    pub small_positions: usize,
    pub medium_positions: usize,
    pub large_positions: usize,
    pub whale_positions: usize,
}
