//! Error types for topology construction.

use thiserror::Error;

/// Result type alias for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors raised when topology records break the input contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("instance topology record has an empty instance ID")]
    EmptyInstanceId,

    #[error("instance {instance}: {tier} ID {id:?} is set but the {missing} ID is empty")]
    SparseTiers {
        instance: String,
        tier: &'static str,
        id: String,
        missing: &'static str,
    },
}
