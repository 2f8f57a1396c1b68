pub mod pool;
pub mod settings;

pub use pool::*;
pub use settings::*;
