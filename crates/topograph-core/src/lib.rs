//! topograph-core: cluster topology model and graph construction.
//!
//! Folds a flat list of per-instance placement records, as reported by a
//! provider collector, into a hierarchical [`Vertex`] graph that the
//! translate layer renders as scheduler configuration.
//!
//! # Architecture
//!
//! ```text
//! ClusterTopology (flat InstanceTopology records)
//!   ├── normalize()            sort + canonical switch names
//!   └── to_three_tier_graph()  → Vertex root
//!         ├── "topology/tree"   block → spine → datacenter forest
//!         │     └── "no-topology" bucket for unplaced instances
//!         └── "topology/block"  accelerator (NVLink) domains
//! ```
//!
//! Everything in this crate is synchronous and free of I/O. Observability
//! goes through an injected [`MetricsSink`].

pub mod error;
pub mod graph;
pub mod metrics;
pub mod topology;
pub mod vertex;

pub use error::{TopologyError, TopologyResult};
pub use graph::{DomainMap, ForestBuilder, assemble_root};
pub use metrics::{MetricsSink, NoopMetrics};
pub use topology::{Band, ClusterTopology, ComputeInstances, InstanceTopology};
pub use vertex::*;
