pub mod input_loader;
pub mod pool_analysis;
pub mod risk_metrics;
pub mod risk_scorer;
pub mod snapshot_store;
pub mod state_reconstructor;
pub mod stress_engine;

pub use input_loader::*;
pub use pool_analysis::*;
pub use risk_metrics::*;
pub use risk_scorer::*;
pub use snapshot_store::*;
pub use state_reconstructor::*;
pub use stress_engine::*;
