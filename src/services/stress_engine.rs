use tracing::{debug, info, info_span, Span};

use crate::models::{
    CascadingRisk, CliffPoint, LiquidatedPosition, PoolSnapshot, ScenarioRow, StressResult,
};
use crate::utils::format::format_usd;
use crate::utils::math::{first_differences, mean, percent_of};

/// Collateral price shocks applied when none are configured
pub const DEFAULT_SCENARIOS: [f64; 7] = [-0.05, -0.10, -0.15, -0.20, -0.30, -0.40, -0.50];

/// Assumed liquidation penalty as a fraction of shocked collateral
pub const LIQUIDATION_PENALTY: f64 = 0.10;

/// Relative jump in pool debt affected that marks a cliff
pub const DEFAULT_CLIFF_THRESHOLD_PCT: f64 = 50.0;

/// Target used by [`StressTestEngine::get_liquidation_threshold`] callers without a preference
pub const DEFAULT_LIQUIDATION_TARGET_PCT: f64 = 10.0;

/// Applies deterministic collateral price shocks to a snapshot.
///
/// Scenarios are run in the order given and never re-sorted.
pub struct StressTestEngine<'a> {
    snapshot: &'a PoolSnapshot,
    scenarios: Vec<f64>,
    cliff_threshold_pct: f64,
    span: Span,
}

impl<'a> StressTestEngine<'a> {
    pub fn new(snapshot: &'a PoolSnapshot) -> Self {
        Self::with_scenarios(snapshot, DEFAULT_SCENARIOS.to_vec())
    }

    /// An empty list yields an empty liquidation curve
    pub fn with_scenarios(snapshot: &'a PoolSnapshot, scenarios: Vec<f64>) -> Self {
        let span = info_span!("stress_engine", pool = %snapshot.pool_name());
        Self {
            snapshot,
            scenarios,
            cliff_threshold_pct: DEFAULT_CLIFF_THRESHOLD_PCT,
            span,
        }
    }

    pub fn with_cliff_threshold(mut self, threshold_pct: f64) -> Self {
        self.cliff_threshold_pct = threshold_pct;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn snapshot(&self) -> &'a PoolSnapshot {
        self.snapshot
    }

    pub fn scenarios(&self) -> &[f64] {
        &self.scenarios
    }

    pub fn cliff_threshold_pct(&self) -> f64 {
        self.cliff_threshold_pct
    }

    /// Liquidation impact of a uniform collateral price move, e.g. `-0.10`.
    /// A position is liquidatable when its shocked health factor is below 1.0.
    pub fn apply_price_shock(&self, shock: f64) -> StressResult {
        let mut details = Vec::new();

        for position in self.snapshot.positions() {
            let new_hf = position.health_factor_after_shock(shock);
            if new_hf >= 1.0 || new_hf.is_nan() {
                continue;
            }

            let new_collateral_value = position.collateral_value_usd() * (1.0 + shock);
            details.push(LiquidatedPosition {
                borrower: position.borrower().to_string(),
                original_hf: position.health_factor(),
                new_hf,
                collateral_value: new_collateral_value,
                debt_value: position.debt_value_usd(),
                shortfall: (position.debt_value_usd() - new_collateral_value).max(0.0),
                liquidation_penalty: new_collateral_value * LIQUIDATION_PENALTY,
            });
        }

        let total_collateral_at_risk: f64 = details.iter().map(|d| d.collateral_value).sum();
        let total_debt_at_risk: f64 = details.iter().map(|d| d.debt_value).sum();
        let bad_debt_potential: f64 = details.iter().map(|d| d.shortfall).sum();
        let pct_affected = percent_of(total_debt_at_risk, self.snapshot.total_debt_usd());

        debug!(
            parent: &self.span,
            shock,
            liquidatable = details.len(),
            pct_affected,
            "applied price shock"
        );

        StressResult {
            scenario_name: format!("{:+.0}% price shock", shock * 100.0),
            price_shock_pct: shock * 100.0,
            liquidatable_positions: details.len(),
            total_collateral_at_risk_usd: total_collateral_at_risk,
            total_debt_at_risk_usd: total_debt_at_risk,
            bad_debt_potential_usd: bad_debt_potential,
            pct_pool_affected: pct_affected,
            positions_details: details,
        }
    }

    /// Every configured scenario's full result, in configured order
    pub fn run_all_results(&self) -> Vec<StressResult> {
        self.scenarios
            .iter()
            .map(|shock| self.apply_price_shock(*shock))
            .collect()
    }

    /// The liquidation curve: one row per configured scenario
    pub fn run_all_scenarios(&self) -> Vec<ScenarioRow> {
        self.run_all_results().iter().map(StressResult::to_row).collect()
    }

    /// Adjacent scenario pairs whose relative increase in pool debt affected
    /// exceeds `threshold_pct`. A rise from zero always counts; two zeros never do.
    pub fn find_cliff_points(&self, results: &[ScenarioRow], threshold_pct: f64) -> Vec<CliffPoint> {
        let cliffs: Vec<CliffPoint> = results
            .windows(2)
            .filter_map(|pair| {
                let (prev, curr) = (&pair[0], &pair[1]);
                let prev_risk = prev.pct_pool_affected;
                let curr_risk = curr.pct_pool_affected;

                let risk_jump_pct = if prev_risk > 0.0 {
                    (curr_risk - prev_risk) / prev_risk * 100.0
                } else if curr_risk > 0.0 {
                    f64::INFINITY
                } else {
                    return None;
                };

                if risk_jump_pct <= threshold_pct {
                    return None;
                }

                Some(CliffPoint {
                    from_shock_pct: prev.price_shock_pct,
                    to_shock_pct: curr.price_shock_pct,
                    risk_jump_pct,
                    from_pool_affected: prev_risk,
                    to_pool_affected: curr_risk,
                    absolute_increase: curr_risk - prev_risk,
                    new_liquidations: curr.liquidatable_positions as i64
                        - prev.liquidatable_positions as i64,
                })
            })
            .collect();

        if !cliffs.is_empty() {
            info!(parent: &self.span, count = cliffs.len(), "Cliff points detected");
        }
        cliffs
    }

    /// Cliff points of the configured scenarios at the configured threshold
    pub fn cliff_points(&self) -> Vec<CliffPoint> {
        self.find_cliff_points(&self.run_all_scenarios(), self.cliff_threshold_pct)
    }

    /// First configured shock, in percent, at which at least `target_pct` of
    /// pool debt becomes liquidatable. Never extrapolated past the scenarios.
    pub fn get_liquidation_threshold(&self, target_pct: f64) -> Option<f64> {
        self.run_all_scenarios()
            .into_iter()
            .find(|row| row.pct_pool_affected >= target_pct)
            .map(|row| row.price_shock_pct)
    }

    pub fn analyze_cascading_risk(&self) -> CascadingRisk {
        self.cascading_risk_for(&self.run_all_scenarios())
    }

    /// Cascading risk over an already computed liquidation curve
    pub fn cascading_risk_for(&self, results: &[ScenarioRow]) -> CascadingRisk {
        let cliffs = self.find_cliff_points(results, self.cliff_threshold_pct);

        let affected: Vec<f64> = results.iter().map(|r| r.pct_pool_affected).collect();
        let increases = first_differences(&affected);
        let avg_increase = mean(&increases).unwrap_or(0.0);
        let max_increase = increases.iter().copied().reduce(f64::max).unwrap_or(0.0);

        let worst_cliff = cliffs
            .iter()
            .copied()
            .reduce(|worst, cliff| {
                if cliff.risk_jump_pct > worst.risk_jump_pct {
                    cliff
                } else {
                    worst
                }
            });

        CascadingRisk {
            cliff_points_count: cliffs.len(),
            avg_risk_increase_per_scenario: avg_increase,
            max_risk_increase_per_scenario: max_increase,
            has_severe_cliffs: !cliffs.is_empty(),
            worst_cliff,
        }
    }

    /// Plain text overview of the curve, cliffs and cascading risk
    pub fn generate_summary(&self) -> String {
        let results = self.run_all_scenarios();
        let cliffs = self.find_cliff_points(&results, self.cliff_threshold_pct);
        let cascading = self.cascading_risk_for(&results);

        let mut summary = format!(
            "\n=== Stress Test Summary ===\n\n\
             Pool: {}\n\
             Total Positions: {}\n\
             Total Debt: {}\n\n\
             --- Scenarios Tested ---\n",
            self.snapshot.pool_name(),
            self.snapshot.num_positions(),
            format_usd(self.snapshot.total_debt_usd()),
        );

        for row in &results {
            summary.push_str(&format!(
                "\n{:+.0}% shock:\n  \
                 - Liquidatable positions: {}\n  \
                 - Debt at risk: {} ({:.1}%)\n  \
                 - Bad debt potential: {}\n",
                row.price_shock_pct,
                row.liquidatable_positions,
                format_usd(row.debt_at_risk_usd),
                row.pct_pool_affected,
                format_usd(row.bad_debt_potential_usd),
            ));
        }

        if !cliffs.is_empty() {
            summary.push_str("\n--- Cliff Points Detected ---\n");
            for cliff in &cliffs {
                summary.push_str(&format!(
                    "\nBetween {:.0}% and {:.0}%:\n  \
                     - Risk jump: {:.0}%\n  \
                     - New liquidations: {}\n  \
                     - Pool affected increased: {:.1}% -> {:.1}%\n",
                    cliff.from_shock_pct,
                    cliff.to_shock_pct,
                    cliff.risk_jump_pct,
                    cliff.new_liquidations,
                    cliff.from_pool_affected,
                    cliff.to_pool_affected,
                ));
            }
        }

        summary.push_str(&format!(
            "\n--- Cascading Risk Analysis ---\n\
             Cliff points found: {}\n\
             Severe cascading risk: {}\n\
             Average risk increase per scenario: {:.2}%\n\
             Maximum risk increase per scenario: {:.2}%\n",
            cascading.cliff_points_count,
            if cascading.has_severe_cliffs { "YES" } else { "NO" },
            cascading.avg_risk_increase_per_scenario,
            cascading.max_risk_increase_per_scenario,
        ));

        summary
    }
}
