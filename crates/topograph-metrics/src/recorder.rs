//! In-process metrics recorder.
//!
//! All state sits behind one mutex; updates are rare (a handful per
//! topology request) so contention is not a concern.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use topograph_core::MetricsSink;
use tracing::trace;

/// Labels of the request counter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestKey {
    pub provider: String,
    pub engine: String,
    pub status: u16,
}

/// Count and total of observed durations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LatencyStats {
    pub count: u64,
    pub sum_seconds: f64,
}

impl LatencyStats {
    fn observe(&mut self, d: Duration) {
        self.count += 1;
        self.sum_seconds += d.as_secs_f64();
    }
}

/// Point-in-time copy of every recorded series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    pub requests: BTreeMap<RequestKey, LatencyStats>,
    /// Provider → instances without topology in the last run.
    pub missing_topology: BTreeMap<String, u64>,
    /// Validation failure kind → count.
    pub blocksize_errors: BTreeMap<String, u64>,
    pub resource_status_not_found: BTreeMap<String, bool>,
    pub physical_host_not_found: BTreeMap<String, bool>,
    /// Provider API call → latency.
    pub api_latency: BTreeMap<String, LatencyStats>,
}

/// Records everything reported through [`MetricsSink`].
#[derive(Debug, Default)]
pub struct TopologyMetrics {
    state: Mutex<MetricsSnapshot>,
}

impl TopologyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MetricsSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.state().clone()
    }

    /// Clear all series.
    pub fn reset(&self) {
        *self.state() = MetricsSnapshot::default();
    }
}

impl MetricsSink for TopologyMetrics {
    fn add_request(&self, provider: &str, engine: &str, status: u16, duration: Duration) {
        let key = RequestKey {
            provider: provider.to_string(),
            engine: engine.to_string(),
            status,
        };
        self.state().requests.entry(key).or_default().observe(duration);
        trace!(provider, engine, status, ?duration, "recorded request");
    }

    fn set_missing_topology(&self, provider: &str, count: usize) {
        self.state()
            .missing_topology
            .insert(provider.to_string(), count as u64);
    }

    fn add_block_size_validation_error(&self, kind: &str) {
        *self.state().blocksize_errors.entry(kind.to_string()).or_default() += 1;
    }

    fn set_resource_status_missing(&self, instance: &str, missing: bool) {
        self.state()
            .resource_status_not_found
            .insert(instance.to_string(), missing);
    }

    fn set_physical_host_missing(&self, instance: &str, missing: bool) {
        self.state()
            .physical_host_not_found
            .insert(instance.to_string(), missing);
    }

    fn observe_api_latency(&self, call: &str, latency: Duration) {
        self.state()
            .api_latency
            .entry(call.to_string())
            .or_default()
            .observe(latency);
    }
}
