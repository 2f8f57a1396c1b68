use pool_risk_monitor::{
    config::{PoolConfig, Settings},
    services::{analyze_pool, InputLoader, PoolRiskReport, SnapshotStore},
    utils::logging::init_logging,
    Result,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::new()?;
    init_logging(&settings.logging);

    info!("Starting pool risk analysis");

    if settings.pools.is_empty() {
        warn!("No pools configured, nothing to analyze");
        return Ok(());
    }

    let loader = InputLoader::new(settings.data.input_dir.clone());
    let store = SnapshotStore::new(settings.data.snapshot_dir.clone());

    // Each pool runs its whole pipeline on its own snapshot
    let handles: Vec<_> = settings
        .pools
        .iter()
        .cloned()
        .map(|pool| {
            let settings = settings.clone();
            let loader = loader.clone();
            let store = store.clone();
            let name = pool.display_name().to_string();
            let handle = tokio::task::spawn_blocking(move || run_pool(&pool, &loader, &store, &settings));
            (name, handle)
        })
        .collect();

    let mut failed = 0usize;
    for (name, handle) in handles {
        match handle.await {
            Ok(Ok(report)) => print_report(&report),
            Ok(Err(e)) => {
                failed += 1;
                if e.is_configuration_error() {
                    error!(pool = %name, "Skipping pool, configuration error: {}", e);
                } else {
                    error!(pool = %name, "Pool analysis failed: {}", e);
                }
            }
            Err(e) => {
                failed += 1;
                error!(pool = %name, "Pool analysis task panicked: {}", e);
            }
        }
    }

    info!(
        analyzed = settings.pools.len() - failed,
        failed, "Pool risk analysis finished"
    );
    Ok(())
}

fn run_pool(
    pool: &PoolConfig,
    loader: &InputLoader,
    store: &SnapshotStore,
    settings: &Settings,
) -> Result<PoolRiskReport> {
    pool.validate()?;

    let inputs = loader.load(&pool.market_id)?;
    let report = analyze_pool(pool, &inputs, settings)?;

    match store.store(&report.snapshot) {
        Ok(path) => info!(path = %path.display(), "Snapshot written"),
        Err(e) => warn!("Could not save snapshot for {}: {}", pool.display_name(), e),
    }

    Ok(report)
}

fn print_report(report: &PoolRiskReport) {
    println!("{}", report.metrics_summary);
    println!("{}", report.stress_summary);
    println!("{}", report.score_report);

    match report.liquidation_threshold_pct {
        Some(shock) => println!("10% of pool debt liquidatable at a {:+.0}% price shock", shock),
        None => println!("No configured scenario liquidates 10% of pool debt"),
    }

    if !report.skipped_rows.is_empty() {
        println!("Skipped {} malformed input rows", report.skipped_rows.len());
    }
}
