//! Error types for dbscale.

use thiserror::Error;

/// Result type alias for configuration parsing and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Malformed startup configuration. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tier catalogue: {0}")]
    TierCatalogue(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// A failed call to an external collaborator.
///
/// Recoverable: the reconciliation loop logs it and retries on the next
/// cycle with fresh demand.
#[derive(Debug, Error)]
pub enum CommunicationError {
    #[error("workload listing failed: {0}")]
    List(String),

    #[error("capacity change failed: {0}")]
    Apply(String),

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}
