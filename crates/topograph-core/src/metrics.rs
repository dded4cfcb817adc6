//! Observability sink injected into collectors, the builder and the
//! translator.
//!
//! Every method has a no-op default, so implementations only override what
//! they record. [`NoopMetrics`] is the default used by tests and by callers
//! that do not export metrics.

use std::time::Duration;

pub trait MetricsSink: Send + Sync {
    /// Record one topology generation request.
    fn add_request(&self, _provider: &str, _engine: &str, _status: u16, _duration: Duration) {}

    /// Number of mapped instances that had no topology information.
    fn set_missing_topology(&self, _provider: &str, _count: usize) {}

    /// One block-size validation failure of the given kind.
    fn add_block_size_validation_error(&self, _kind: &str) {}

    /// Whether the provider reported no resource status for an instance.
    fn set_resource_status_missing(&self, _instance: &str, _missing: bool) {}

    /// Whether the resource status lacked a physical host for an instance.
    fn set_physical_host_missing(&self, _instance: &str, _missing: bool) {}

    /// Latency of one provider API call.
    fn observe_api_latency(&self, _call: &str, _latency: Duration) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {}
