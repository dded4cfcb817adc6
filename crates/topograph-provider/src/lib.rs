//! topograph-provider: where cluster topology comes from.
//!
//! A [`TopologyCollector`] turns a provider's inventory into flat
//! [`ClusterTopology`](topograph_core::ClusterTopology) records; the engine
//! runs a collector and folds its output into a placement graph.
//!
//! # Components
//!
//! - **`collector`**: the collector contract and a static collector
//! - **`gcp`**: Google Compute Engine physical-host placement
//! - **`engine`**: timeout, normalization, graph build, request metrics
//! - **`response`**: service payload types and their graph conversion

pub mod collector;
pub mod engine;
pub mod error;
pub mod gcp;
pub mod response;

pub use collector::{StaticCollector, TopologyCollector};
pub use engine::{ENGINE, EngineOptions, generate};
pub use error::{InstanceError, ProviderError, ProviderResult};
pub use gcp::{ComputeApi, GcpCollector, GcpInstance, StaticComputeApi};
pub use response::{Instance, TopologyRequest, TopologyResponse, to_graph, topology_format};
