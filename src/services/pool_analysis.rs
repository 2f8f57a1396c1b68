use tracing::{info, info_span};

use crate::config::{PoolConfig, Settings};
use crate::error::Result;
use crate::models::{
    CascadingRisk, CliffPoint, ComponentScores, PoolMetrics, PoolSnapshot, RiskLevel, ScenarioRow,
};
use crate::services::input_loader::PoolInputs;
use crate::services::risk_metrics::RiskMetrics;
use crate::services::risk_scorer::RiskScorer;
use crate::services::state_reconstructor::{RowSkip, StateReconstructor};
use crate::services::stress_engine::{StressTestEngine, DEFAULT_LIQUIDATION_TARGET_PCT};

/// Everything computed for one pool in one analysis pass
#[derive(Debug, Clone)]
pub struct PoolRiskReport {
    pub snapshot: PoolSnapshot,
    pub skipped_rows: Vec<RowSkip>,
    pub metrics: PoolMetrics,
    pub scenarios: Vec<ScenarioRow>,
    pub cliff_points: Vec<CliffPoint>,
    pub cascading: CascadingRisk,
    /// Shock in percent liquidating at least 10% of pool debt, if any scenario does
    pub liquidation_threshold_pct: Option<f64>,
    pub component_scores: ComponentScores,
    pub composite_score: f64,
    pub risk_level: RiskLevel,
    pub metrics_summary: String,
    pub stress_summary: String,
    pub score_report: String,
}

/// Run reconstruction, metrics, stress tests and scoring for one pool.
///
/// Fails only on configuration errors; data problems degrade inside each stage.
pub fn analyze_pool(pool: &PoolConfig, inputs: &PoolInputs, settings: &Settings) -> Result<PoolRiskReport> {
    let span = info_span!("pool_analysis", pool = %pool.display_name());
    let _enter = span.enter();

    let reconstructor = StateReconstructor::new(pool.clone(), &inputs.prices)?;
    let (snapshot, skipped_rows) = reconstructor.create_snapshot_with_report(
        &inputs.positions,
        &inputs.collateral,
        &inputs.pool_state,
        None,
    );

    let metrics = RiskMetrics::new(&snapshot);
    let engine = StressTestEngine::with_scenarios(&snapshot, settings.stress.scenarios.clone())
        .with_cliff_threshold(settings.stress.cliff_threshold_pct);

    let pool_metrics = metrics.compute_all_metrics();
    let metrics_summary = metrics.summary_report();

    let scenarios = engine.run_all_scenarios();
    let cliff_points = engine.find_cliff_points(&scenarios, engine.cliff_threshold_pct());
    let cascading = engine.cascading_risk_for(&scenarios);
    let liquidation_threshold_pct = engine.get_liquidation_threshold(DEFAULT_LIQUIDATION_TARGET_PCT);
    let stress_summary = engine.generate_summary();

    let scorer = RiskScorer::new(metrics, Some(engine)).with_weights(settings.scoring.weights)?;
    let component_scores = scorer.get_component_scores();
    let composite_score = scorer.calculate_composite_score();
    let risk_level = scorer.get_risk_level(composite_score);
    let score_report = scorer.generate_report();
    drop(scorer);

    info!(
        composite_score,
        risk_level = %risk_level,
        skipped = skipped_rows.len(),
        "Pool analysis complete"
    );

    Ok(PoolRiskReport {
        snapshot,
        skipped_rows,
        metrics: pool_metrics,
        scenarios,
        cliff_points,
        cascading,
        liquidation_threshold_pct,
        component_scores,
        composite_score,
        risk_level,
        metrics_summary,
        stress_summary,
        score_report,
    })
}
