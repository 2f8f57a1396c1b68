use thiserror::Error;

/// Fatal errors raised by the analysis pipeline.
///
/// Only configuration problems and I/O around persisted snapshots end up here.
/// Data-quality problems in the input rows never surface as a `RiskError`; they
/// are resolved with defaults or recorded as a [`SkipReason`].
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Weights must sum to 1.0, got {sum}")]
    InvalidWeights { sum: f64 },

    #[error("Unknown score component: {name}")]
    UnknownWeight { name: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RiskError {
    pub fn missing_config(field: impl Into<String>) -> Self {
        RiskError::MissingConfig { field: field.into() }
    }

    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Configuration errors halt the analysis of the pool they belong to.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            RiskError::MissingConfig { .. }
                | RiskError::InvalidConfig { .. }
                | RiskError::InvalidWeights { .. }
                | RiskError::UnknownWeight { .. }
                | RiskError::Configuration(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

/// Why a raw input row was dropped during reconstruction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("field '{field}' is not numeric: {value}")]
    NonNumeric { field: String, value: String },

    #[error("row has no borrower")]
    MissingBorrower,
}
