use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

use super::pool::PoolConfig;
use crate::error::{Result, RiskError};
use crate::models::ScoreWeights;
use crate::services::stress_engine::{DEFAULT_CLIFF_THRESHOLD_PCT, DEFAULT_SCENARIOS};

/// Prefix for environment overrides, e.g. `POOL_RISK__LOGGING__LEVEL=debug`
pub const ENV_PREFIX: &str = "POOL_RISK";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
    pub stress: StressSettings,
    pub scoring: ScoringSettings,
    pub logging: LoggingSettings,
    pub data: DataSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSettings {
    /// Collateral price shocks as fractions, e.g. `-0.10`
    pub scenarios: Vec<f64>,
    pub cliff_threshold_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub weights: ScoreWeights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// `compact`, `pretty` or `json`
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Holds one directory of input row files per market id
    pub input_dir: PathBuf,
    pub snapshot_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            pools: Vec::new(),
            stress: StressSettings::default(),
            scoring: ScoringSettings::default(),
            logging: LoggingSettings::default(),
            data: DataSettings::default(),
        }
    }
}

impl Default for StressSettings {
    fn default() -> Self {
        StressSettings {
            scenarios: DEFAULT_SCENARIOS.to_vec(),
            cliff_threshold_pct: DEFAULT_CLIFF_THRESHOLD_PCT,
        }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        ScoringSettings {
            weights: ScoreWeights::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            input_dir: PathBuf::from("data/raw"),
            snapshot_dir: PathBuf::from("data/snapshots"),
        }
    }
}

impl Settings {
    /// Load settings: built-in defaults, then `config/default.toml`, then
    /// `config/local.toml`, then `POOL_RISK__*` environment variables.
    /// A `.env` file is read first when present.
    pub fn new() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::load_from(&["config/default", "config/local"])
    }

    /// Load settings layering the given config files (extension optional) over the defaults
    pub fn load_from(files: &[&str]) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        for file in files {
            builder = builder.add_source(File::with_name(file).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;

        info!(pools = settings.pools.len(), "Configuration loaded");
        Ok(settings)
    }

    /// Scoring weights and stress settings are checked here. Pool definitions
    /// are checked per pool so one bad pool does not block the others.
    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;

        if !self.stress.cliff_threshold_pct.is_finite() || self.stress.cliff_threshold_pct < 0.0 {
            return Err(RiskError::invalid_config(
                "stress.cliff_threshold_pct",
                format!("must be a non-negative number, got {}", self.stress.cliff_threshold_pct),
            ));
        }
        if let Some(bad) = self.stress.scenarios.iter().find(|s| !s.is_finite() || **s <= -1.0) {
            return Err(RiskError::invalid_config(
                "stress.scenarios",
                format!("shock {} must be a finite fraction above -1.0", bad),
            ));
        }
        Ok(())
    }
}
