use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;
use crate::models::RawRow;

/// Raw inputs for one pool, as exported by the data collection jobs
#[derive(Debug, Clone, Default)]
pub struct PoolInputs {
    pub positions: Vec<RawRow>,
    pub collateral: Vec<RawRow>,
    pub pool_state: Vec<RawRow>,
    pub prices: HashMap<String, f64>,
}

/// Reads `<input_dir>/<market_id>/{positions,collateral,pool_state,prices}.json`
#[derive(Debug, Clone)]
pub struct InputLoader {
    input_dir: PathBuf,
}

impl InputLoader {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    pub fn pool_dir(&self, market_id: &str) -> PathBuf {
        self.input_dir.join(market_id)
    }

    /// A missing file is an empty table. A file that exists but is not valid JSON is an error.
    pub fn load(&self, market_id: &str) -> Result<PoolInputs> {
        let dir = self.pool_dir(market_id);

        Ok(PoolInputs {
            positions: load_rows(&dir.join("positions.json"))?,
            collateral: load_rows(&dir.join("collateral.json"))?,
            pool_state: load_rows(&dir.join("pool_state.json"))?,
            prices: load_prices(&dir.join("prices.json"))?,
        })
    }
}

pub fn load_rows(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        warn!(path = %path.display(), "Input file not found, treating as empty");
        return Ok(Vec::new());
    }

    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Token address -> USD price
pub fn load_prices(path: &Path) -> Result<HashMap<String, f64>> {
    if !path.exists() {
        warn!(path = %path.display(), "Price file not found, all prices default to 0");
        return Ok(HashMap::new());
    }

    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
