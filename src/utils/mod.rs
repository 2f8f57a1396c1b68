pub mod float_serde;
pub mod format;
pub mod logging;
pub mod math;
pub mod time;
