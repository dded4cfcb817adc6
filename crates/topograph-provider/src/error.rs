//! Provider error types.

use std::time::Duration;

use thiserror::Error;
use topograph_core::TopologyError;

/// Result type alias for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Failures that abort a collector run.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error("provider API error: {0}")]
    Api(String),

    #[error("collector timed out after {0:?}")]
    Timeout(Duration),

    #[error("collector task failed: {0}")]
    Task(String),
}

/// Per-instance problems. The instance is skipped and the run continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("instance {0}: no resource status reported")]
    ResourceStatusNotFound(String),

    #[error("instance {0}: resource status has no physical host")]
    PhysicalHostNotFound(String),

    #[error("instance {instance}: malformed physical host {host:?}")]
    MalformedPhysicalHost { instance: String, host: String },

    #[error("instance {instance}: {source}")]
    Invalid {
        instance: String,
        #[source]
        source: TopologyError,
    },
}
