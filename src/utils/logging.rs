use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Install the global subscriber for the binary. `RUST_LOG` takes precedence
/// over the configured level. Returns false when a subscriber is already set.
pub fn init_logging(settings: &LoggingSettings) -> bool {
    let log_level = settings
        .level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pool_risk_monitor={}", log_level).into());

    let result = match settings.format.as_str() {
        "json" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        "pretty" => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
    };

    result.is_ok()
}
