use tracing::{debug, info_span, Span};

use crate::models::{
    ConcentrationMetrics, HealthFactorDistribution, PoolMetrics, PoolSnapshot, Position,
    PositionSizeDistribution,
};
use crate::utils::format::{format_health_factor, format_usd};
use crate::utils::math::{gini_coefficient, herfindahl_index, percent_of};
use crate::utils::time::format_timestamp;

/// Health factor below which debt counts as close to liquidation
pub const AT_RISK_HF_THRESHOLD: f64 = 1.1;

/// Aggregations over one snapshot's positions.
///
/// Every metric degrades to 0 (or an infinite health factor) on an empty or
/// debt-free snapshot.
pub struct RiskMetrics<'a> {
    snapshot: &'a PoolSnapshot,
    span: Span,
}

impl<'a> RiskMetrics<'a> {
    pub fn new(snapshot: &'a PoolSnapshot) -> Self {
        let span = info_span!("risk_metrics", pool = %snapshot.pool_name());
        Self { snapshot, span }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn snapshot(&self) -> &'a PoolSnapshot {
        self.snapshot
    }

    fn positions(&self) -> &'a [Position] {
        self.snapshot.positions()
    }

    fn debt_values(&self) -> Vec<f64> {
        self.positions().iter().map(|p| p.debt_value_usd()).collect()
    }

    pub fn utilization_rate(&self) -> f64 {
        self.snapshot.utilization()
    }

    /// Debt held by the 5 and 10 largest borrowers
    pub fn concentration_metrics(&self) -> ConcentrationMetrics {
        let total_debt = self.snapshot.total_debt_usd();
        if self.positions().is_empty() || total_debt == 0.0 {
            return ConcentrationMetrics::default();
        }

        let top_5_debt: f64 = self
            .snapshot
            .get_top_borrowers(5)
            .iter()
            .map(|p| p.debt_value_usd())
            .sum();
        let top_10_debt: f64 = self
            .snapshot
            .get_top_borrowers(10)
            .iter()
            .map(|p| p.debt_value_usd())
            .sum();

        ConcentrationMetrics {
            top_5_pct: top_5_debt / total_debt * 100.0,
            top_10_pct: top_10_debt / total_debt * 100.0,
            top_5_debt_usd: top_5_debt,
            top_10_debt_usd: top_10_debt,
        }
    }

    /// Inequality of the debt distribution, 0 (equal) to 1 (concentrated)
    pub fn gini_coefficient(&self) -> f64 {
        gini_coefficient(&self.debt_values())
    }

    /// Herfindahl-Hirschman Index of debt shares, 0-10000
    pub fn herfindahl_index(&self) -> f64 {
        herfindahl_index(&self.debt_values())
    }

    pub fn weighted_avg_health_factor(&self) -> f64 {
        self.snapshot.weighted_avg_health_factor()
    }

    /// Percent of total debt per health factor band
    pub fn health_factor_distribution(&self) -> HealthFactorDistribution {
        let total_debt = self.snapshot.total_debt_usd();
        if self.positions().is_empty() || total_debt == 0.0 {
            return HealthFactorDistribution::default();
        }

        let mut buckets = HealthFactorDistribution::default();
        for position in self.positions() {
            let hf = position.health_factor();
            let debt = position.debt_value_usd();

            let bucket = if hf < 1.05 {
                &mut buckets.hf_below_1_05
            } else if hf < 1.1 {
                &mut buckets.hf_1_05_to_1_1
            } else if hf < 1.2 {
                &mut buckets.hf_1_1_to_1_2
            } else if hf < 1.5 {
                &mut buckets.hf_1_2_to_1_5
            } else {
                &mut buckets.hf_above_1_5
            };
            *bucket += debt;
        }

        HealthFactorDistribution {
            hf_below_1_05: buckets.hf_below_1_05 / total_debt * 100.0,
            hf_1_05_to_1_1: buckets.hf_1_05_to_1_1 / total_debt * 100.0,
            hf_1_1_to_1_2: buckets.hf_1_1_to_1_2 / total_debt * 100.0,
            hf_1_2_to_1_5: buckets.hf_1_2_to_1_5 / total_debt * 100.0,
            hf_above_1_5: buckets.hf_above_1_5 / total_debt * 100.0,
        }
    }

    /// Percent of total debt held by positions with a health factor below `threshold`
    pub fn liquidation_buffer_percentage(&self, threshold: f64) -> f64 {
        let at_risk: f64 = self
            .positions()
            .iter()
            .filter(|p| p.health_factor() < threshold)
            .map(|p| p.debt_value_usd())
            .sum();

        percent_of(at_risk, self.snapshot.total_debt_usd())
    }

    /// Positions below `threshold`, lowest health factor first
    pub fn positions_at_risk(&self, threshold: f64) -> Vec<&'a Position> {
        let mut at_risk: Vec<&'a Position> = self
            .positions()
            .iter()
            .filter(|p| p.health_factor() < threshold)
            .collect();
        at_risk.sort_by(|a, b| a.health_factor().total_cmp(&b.health_factor()));
        at_risk
    }

    pub fn position_size_distribution(&self) -> PositionSizeDistribution {
        let mut buckets = PositionSizeDistribution::default();

        for position in self.positions() {
            let debt = position.debt_value_usd();
            if debt < 10_000.0 {
                buckets.micro_below_10k += 1;
            } else if debt < 100_000.0 {
                buckets.small_10k_to_100k += 1;
            } else if debt < 1_000_000.0 {
                buckets.medium_100k_to_1m += 1;
            } else if debt < 10_000_000.0 {
                buckets.large_1m_to_10m += 1;
            } else {
                buckets.whale_above_10m += 1;
            }
        }

        buckets
    }

    pub fn compute_all_metrics(&self) -> PoolMetrics {
        let concentration = self.concentration_metrics();
        let hf_distribution = self.health_factor_distribution();
        let sizes = self.position_size_distribution();

        let metrics = PoolMetrics {
            utilization_rate: self.utilization_rate(),
            total_positions: self.snapshot.num_positions(),
            total_debt_usd: self.snapshot.total_debt_usd(),
            total_collateral_usd: self.snapshot.total_collateral_usd(),

            top_5_concentration_pct: concentration.top_5_pct,
            top_10_concentration_pct: concentration.top_10_pct,
            top_5_debt_usd: concentration.top_5_debt_usd,
            top_10_debt_usd: concentration.top_10_debt_usd,
            gini_coefficient: self.gini_coefficient(),
            herfindahl_index: self.herfindahl_index(),

            weighted_avg_health_factor: self.weighted_avg_health_factor(),
            debt_below_hf_1_05_pct: hf_distribution.hf_below_1_05,
            debt_below_hf_1_1_pct: hf_distribution.below_1_1(),
            liquidation_buffer_10pct: self.liquidation_buffer_percentage(AT_RISK_HF_THRESHOLD),
            positions_at_risk_count: self.positions_at_risk(AT_RISK_HF_THRESHOLD).len(),

            micro_positions: sizes.micro_below_10k,
            small_positions: sizes.small_10k_to_100k,
            medium_positions: sizes.medium_100k_to_1m,
            large_positions: sizes.large_1m_to_10m,
            whale_positions: sizes.whale_above_10m,
        };

        debug!(parent: &self.span, ?metrics, "computed pool metrics");
        metrics
    }

    /// Plain text summary of the key metrics
    pub fn summary_report(&self) -> String {
        let m = self.compute_all_metrics();

        format!(
            "\n=== Risk Metrics Summary ===\n\n\
             Pool: {pool}\n\
             Timestamp: {timestamp}\n\n\
             --- Pool Overview ---\n\
             Total Positions: {positions}\n\
             Total Debt: {debt}\n\
             Total Collateral: {collateral}\n\
             Utilization Rate: {utilization:.2}%\n\n\
             --- Concentration Risk ---\n\
             Top 5 Borrowers: {top5:.1}% of debt ({top5_usd})\n\
             Top 10 Borrowers: {top10:.1}% of debt ({top10_usd})\n\
             Gini Coefficient: {gini:.3}\n\
             Herfindahl Index: {hhi:.0}\n\n\
             --- Health Factor Analysis ---\n\
             Weighted Avg HF: {whf}\n\
             Debt with HF < 1.05: {below_105:.1}%\n\
             Debt with HF < 1.1: {below_11:.1}%\n\
             Positions at Risk (HF < 1.1): {at_risk}\n\n\
             --- Position Distribution ---\n\
             Micro (<$10k): {micro}\n\
             Small ($10k-$100k): {small}\n\
             Medium ($100k-$1M): {medium}\n\
             Large ($1M-$10M): {large}\n\
             Whale (>$10M): {whale}\n",
            pool = self.snapshot.pool_name(),
            timestamp = format_timestamp(self.snapshot.timestamp()),
            positions = m.total_positions,
            debt = format_usd(m.total_debt_usd),
            collateral = format_usd(m.total_collateral_usd),
            utilization = m.utilization_rate * 100.0,
            top5 = m.top_5_concentration_pct,
            top5_usd = format_usd(m.top_5_debt_usd),
            top10 = m.top_10_concentration_pct,
            top10_usd = format_usd(m.top_10_debt_usd),
            gini = m.gini_coefficient,
            hhi = m.herfindahl_index,
            whf = format_health_factor(m.weighted_avg_health_factor),
            below_105 = m.debt_below_hf_1_05_pct,
            below_11 = m.debt_below_hf_1_1_pct,
            at_risk = m.positions_at_risk_count,
            micro = m.micro_positions,
            small = m.small_positions,
            medium = m.medium_positions,
            large = m.large_positions,
            whale = m.whale_positions,
        )
    }
}
