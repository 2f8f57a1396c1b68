use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pool_risk_monitor::{
    models::{CreatePoolSnapshot, CreatePosition, PoolSnapshot, Position},
    services::{RiskMetrics, RiskScorer, StressTestEngine},
    utils::math::{gini_coefficient, herfindahl_index},
};

fn build_snapshot(count: usize) -> PoolSnapshot {
    let positions = (0..count)
        .map(|i| {
            let debt = 1_000.0 + (i % 97) as f64 * 750.0;
            let collateral = debt * (1.05 + (i % 13) as f64 * 0.08) / 0.86;
            Position::new(CreatePosition {
                borrower: format!("0x{:040x}", i),
                market_id: "0xbench".to_string(),
                collateral_amount: collateral,
                collateral_value_usd: collateral,
                debt_amount: debt,
                debt_value_usd: debt,
                lltv: 0.86,
                timestamp: Utc::now(),
            })
        })
        .collect();

    PoolSnapshot::new(CreatePoolSnapshot {
        market_id: "0xbench".to_string(),
        pool_name: "BENCH/USDC".to_string(),
        timestamp: Utc::now(),
        positions,
        total_supply: 50_000_000.0,
        total_borrow: 40_000_000.0,
        lltv: 0.86,
    })
}

fn benchmark_stress_scenarios(c: &mut Criterion) {
    let snapshot = build_snapshot(5_000);
    let engine = StressTestEngine::new(&snapshot);

    c.bench_function("run_all_scenarios_5k", |b| {
        b.iter(|| black_box(&engine).run_all_scenarios())
    });

    c.bench_function("analyze_cascading_risk_5k", |b| {
        b.iter(|| black_box(&engine).analyze_cascading_risk())
    });
}

fn benchmark_metrics(c: &mut Criterion) {
    let snapshot = build_snapshot(5_000);
    let metrics = RiskMetrics::new(&snapshot);

    c.bench_function("compute_all_metrics_5k", |b| {
        b.iter(|| black_box(&metrics).compute_all_metrics())
    });

    let debts: Vec<f64> = snapshot.positions().iter().map(|p| p.debt_value_usd()).collect();
    c.bench_function("gini_coefficient_5k", |b| {
        b.iter(|| gini_coefficient(black_box(&debts)))
    });
    c.bench_function("herfindahl_index_5k", |b| {
        b.iter(|| herfindahl_index(black_box(&debts)))
    });
}

fn benchmark_composite_score(c: &mut Criterion) {
    let snapshot = build_snapshot(1_000);

    c.bench_function("composite_score_1k", |b| {
        b.iter(|| {
            let scorer = RiskScorer::new(
                RiskMetrics::new(black_box(&snapshot)),
                Some(StressTestEngine::new(&snapshot)),
            );
            scorer.calculate_composite_score()
        })
    });
}

criterion_group!(
    benches,
    benchmark_stress_scenarios,
    benchmark_metrics,
    benchmark_composite_score
);
criterion_main!(benches);
