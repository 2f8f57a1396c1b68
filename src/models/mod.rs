pub mod metrics;
pub mod pool_snapshot;
pub mod position;
pub mod raw_row;
pub mod score;
pub mod stress_result;

pub use metrics::*;
pub use pool_snapshot::*;
pub use position::*;
pub use raw_row::*;
pub use score::*;
pub use stress_result::*;
