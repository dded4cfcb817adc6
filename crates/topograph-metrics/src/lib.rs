//! topograph-metrics: observability for topology generation.
//!
//! Implements the core [`MetricsSink`](topograph_core::MetricsSink) with an
//! in-process recorder and renders its state in the Prometheus text format.
//!
//! # Architecture
//!
//! ```text
//! TopologyMetrics (MetricsSink)
//!   ├── add_request() / set_missing_topology() / ... ← engine, builder, collectors
//!   └── snapshot() → MetricsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for a /metrics endpoint or a file
//! ```

pub mod prometheus;
pub mod recorder;

pub use prometheus::render_prometheus;
pub use recorder::{LatencyStats, MetricsSnapshot, RequestKey, TopologyMetrics};
