use std::collections::HashMap;

use tracing::{debug, info, info_span, Span};

use crate::error::Result;
use crate::models::{ComponentScores, RiskLevel, ScoreComponent, ScoreWeights};
use crate::services::risk_metrics::RiskMetrics;
use crate::services::stress_engine::StressTestEngine;
use crate::utils::math::round_to;

/// Stress score used when no stress engine is available
pub const DEFAULT_STRESS_SCORE: f64 = 50.0;

/// Combines pool metrics and stress results into a 0-100 composite risk score
/// (higher is riskier).
pub struct RiskScorer<'a> {
    metrics: RiskMetrics<'a>,
    stress_engine: Option<StressTestEngine<'a>>,
    weights: ScoreWeights,
    span: Span,
}

impl<'a> RiskScorer<'a> {
    pub fn new(metrics: RiskMetrics<'a>, stress_engine: Option<StressTestEngine<'a>>) -> Self {
        let span = info_span!("risk_scorer", pool = %metrics.snapshot().pool_name());
        Self {
            metrics,
            stress_engine,
            weights: ScoreWeights::default(),
            span,
        }
    }

    /// Scorer with weights given by component name. Unknown or missing names and
    /// weights that do not total 1.0 are rejected.
    pub fn from_weight_map(
        metrics: RiskMetrics<'a>,
        stress_engine: Option<StressTestEngine<'a>>,
        weights: &HashMap<String, f64>,
    ) -> Result<Self> {
        let weights = ScoreWeights::from_map(weights)?;
        Self::new(metrics, stress_engine).with_weights(weights)
    }

    /// Use custom component weights. Fails unless they total 1.0 within tolerance.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Result<Self> {
        weights.validate()?;
        self.weights = weights;
        Ok(self)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn metrics(&self) -> &RiskMetrics<'a> {
        &self.metrics
    }

    pub fn stress_engine(&self) -> Option<&StressTestEngine<'a>> {
        self.stress_engine.as_ref()
    }

    pub fn score_utilization(utilization: f64) -> f64 {
        if utilization > 0.90 {
            90.0 + ((utilization - 0.90) * 100.0).min(10.0)
        } else if utilization > 0.70 {
            50.0 + (utilization - 0.70) * 200.0
        } else {
            utilization * 71.4
        }
    }

    /// 60% weighted-average health factor step score, 40% score of the debt
    /// percentage below HF 1.1
    pub fn score_health_factor(weighted_hf: f64, buffer_pct: f64) -> f64 {
        let hf_score = if weighted_hf == f64::INFINITY {
            0.0
        } else if weighted_hf < 1.1 {
            100.0
        } else if weighted_hf < 1.3 {
            80.0
        } else if weighted_hf < 1.5 {
            60.0
        } else if weighted_hf < 2.0 {
            40.0
        } else {
            (40.0 - (weighted_hf - 2.0) * 10.0).max(0.0)
        };

        let buffer_score = if buffer_pct > 30.0 {
            100.0
        } else if buffer_pct > 20.0 {
            80.0
        } else if buffer_pct > 10.0 {
            60.0
        } else if buffer_pct > 5.0 {
            40.0
        } else {
            buffer_pct * 8.0
        };

        hf_score * 0.6 + buffer_score * 0.4
    }

    /// 70% top-5 borrower share, 30% HHI
    pub fn score_concentration(top_5_pct: f64, herfindahl: f64) -> f64 {
        let top5_score = if top_5_pct > 80.0 {
            100.0
        } else if top_5_pct > 60.0 {
            70.0 + (top_5_pct - 60.0) * 1.5
        } else if top_5_pct > 40.0 {
            40.0 + (top_5_pct - 40.0) * 1.5
        } else {
            top_5_pct
        };

        let hhi_score = if herfindahl > 2500.0 {
            70.0 + ((herfindahl - 2500.0) / 75.0).min(30.0)
        } else if herfindahl > 1500.0 {
            40.0 + (herfindahl - 1500.0) / 33.3
        } else {
            herfindahl / 37.5
        };

        top5_score * 0.7 + hhi_score * 0.3
    }

    /// Sensitivity to a 10% price drop plus a penalty for cliff points.
    ///
    /// The -10% result is looked up by exact shock value; when the configured
    /// scenarios do not include it, the sensitivity reads as 0.
    pub fn score_stress_sensitivity(&self) -> f64 {
        let Some(engine) = &self.stress_engine else {
            return DEFAULT_STRESS_SCORE;
        };

        let results = engine.run_all_scenarios();
        let cascading = engine.cascading_risk_for(&results);

        let affected_at = |shock_pct: f64| {
            results
                .iter()
                .find(|row| row.price_shock_pct == shock_pct)
                .map(|row| row.pct_pool_affected)
                .unwrap_or(0.0)
        };
        let pct_affected_10 = affected_at(-10.0);
        let pct_affected_20 = affected_at(-20.0);
        debug!(
            parent: &self.span,
            pct_affected_10, pct_affected_20, "stress sensitivity inputs"
        );

        let sensitivity_score = if pct_affected_10 > 30.0 {
            90.0
        } else if pct_affected_10 > 15.0 {
            70.0
        } else if pct_affected_10 > 5.0 {
            50.0
        } else {
            pct_affected_10 * 10.0
        };

        let cliff_penalty = if cascading.has_severe_cliffs {
            (cascading.cliff_points_count as f64 * 10.0).min(30.0)
        } else {
            0.0
        };

        (sensitivity_score + cliff_penalty).min(100.0)
    }

    pub fn get_component_scores(&self) -> ComponentScores {
        let all = self.metrics.compute_all_metrics();

        ComponentScores {
            utilization: Self::score_utilization(all.utilization_rate),
            health_factor: Self::score_health_factor(
                all.weighted_avg_health_factor,
                all.liquidation_buffer_10pct,
            ),
            concentration: Self::score_concentration(
                all.top_5_concentration_pct,
                all.herfindahl_index,
            ),
            stress_sensitivity: self.score_stress_sensitivity(),
        }
    }

    /// Weighted blend of the component scores, rounded to 2 decimals
    pub fn calculate_composite_score(&self) -> f64 {
        self.composite_from(&self.get_component_scores())
    }

    fn composite_from(&self, scores: &ComponentScores) -> f64 {
        let composite = round_to(scores.weighted_sum(&self.weights), 2).clamp(0.0, 100.0);
        info!(parent: &self.span, composite, "Composite risk score");
        composite
    }

    pub fn get_risk_level(&self, score: f64) -> RiskLevel {
        RiskLevel::from_score(score)
    }

    pub fn get_risk_color(&self, score: f64) -> &'static str {
        self.get_risk_level(score).color()
    }

    /// Plain text report of the composite, each component and an interpretation
    pub fn generate_report(&self) -> String {
        let scores = self.get_component_scores();
        let composite = self.composite_from(&scores);
        let level = self.get_risk_level(composite);

        let mut report = format!(
            "\n=== Risk Score Report ===\n\n\
             Pool: {}\n\n\
             --- Composite Risk Score ---\n\
             Overall Score: {:.1} / 100\n\
             Risk Level: {}\n\n\
             --- Component Scores ---\n",
            self.metrics.snapshot().pool_name(),
            composite,
            level,
        );

        for component in ScoreComponent::ALL {
            let score = scores.get(component);
            let weight = self.weights.get(component);
            report.push_str(&format!(
                "{}: {:.1} / 100 (weight: {:.0}%, contributes {:.1})\n",
                component.title(),
                score,
                weight * 100.0,
                score * weight,
            ));
        }

        report.push_str(
            "\n--- Risk Level Guidelines ---\n\
             MINIMAL (0-25): Very low risk, healthy pool\n\
             LOW (25-45): Low risk, generally safe\n\
             MODERATE (45-65): Moderate risk, monitor closely\n\
             HIGH (65-80): High risk, intervention recommended\n\
             CRITICAL (80-100): Critical risk, immediate action required\n\n\
             --- Interpretation ---\n",
        );

        report.push_str(match level {
            RiskLevel::Critical => {
                "CRITICAL: This pool has severe risk factors that require immediate attention.\n"
            }
            RiskLevel::High => {
                "HIGH RISK: This pool has significant risk factors. Close monitoring recommended.\n"
            }
            RiskLevel::Moderate => {
                "MODERATE RISK: This pool has some risk factors. Regular monitoring advised.\n"
            }
            RiskLevel::Low => {
                "LOW RISK: This pool appears relatively healthy with minor risk factors.\n"
            }
            RiskLevel::Minimal => "MINIMAL RISK: This pool appears very healthy.\n",
        });

        let (top_component, top_score) = scores.highest();
        if top_score > 60.0 {
            report.push_str(&format!(
                "\nTop risk factor: {} (score: {:.1})\n",
                top_component.title(),
                top_score
            ));
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_curve() {
        assert_eq!(RiskScorer::score_utilization(0.0), 0.0);
        assert!((RiskScorer::score_utilization(0.70) - 49.98).abs() < 1e-9);
        assert!((RiskScorer::score_utilization(0.80) - 70.0).abs() < 1e-9);
        assert!((RiskScorer::score_utilization(0.95) - 95.0).abs() < 1e-9);
        assert_eq!(RiskScorer::score_utilization(1.5), 100.0);
    }

    #[test]
    fn test_health_factor_curve() {
        assert_eq!(RiskScorer::score_health_factor(f64::INFINITY, 0.0), 0.0);
        assert!((RiskScorer::score_health_factor(1.05, 40.0) - 100.0).abs() < 1e-9);
        assert!((RiskScorer::score_health_factor(1.2, 0.0) - 48.0).abs() < 1e-9);
        assert!((RiskScorer::score_health_factor(3.0, 2.5) - (30.0 * 0.6 + 20.0 * 0.4)).abs() < 1e-9);
        assert_eq!(RiskScorer::score_health_factor(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_concentration_curve() {
        // single borrower: top-5 is 100% and HHI is 10000
        assert!((RiskScorer::score_concentration(100.0, 10_000.0) - 100.0).abs() < 1e-9);
        assert!((RiskScorer::score_concentration(50.0, 2_000.0) - (55.0 * 0.7 + (40.0 + 500.0 / 33.3) * 0.3)).abs() < 1e-9);
        assert!((RiskScorer::score_concentration(20.0, 750.0) - (14.0 + 6.0)).abs() < 1e-9);
    }
}
