//! The topology collector contract.
//!
//! One implementation per provider. Collectors do all provider I/O; the
//! graph builder only ever sees their flat output.

use std::future::Future;

use topograph_core::{ClusterTopology, ComputeInstances, MetricsSink};
use tracing::debug;

use crate::error::ProviderResult;

pub trait TopologyCollector: Send + Sync {
    /// Provider name used in metrics and logs.
    fn provider(&self) -> &str;

    /// Report placement records for the instances in `compute_instances`.
    fn collect(
        &self,
        compute_instances: &[ComputeInstances],
        metrics: &dyn MetricsSink,
    ) -> impl Future<Output = ProviderResult<ClusterTopology>> + Send;
}

/// Serves records captured ahead of time (from a file or a test fixture).
#[derive(Debug, Clone)]
pub struct StaticCollector {
    provider: String,
    topology: ClusterTopology,
}

impl StaticCollector {
    pub fn new(provider: impl Into<String>, topology: ClusterTopology) -> Self {
        Self {
            provider: provider.into(),
            topology,
        }
    }
}

impl TopologyCollector for StaticCollector {
    fn provider(&self) -> &str {
        &self.provider
    }

    async fn collect(
        &self,
        _compute_instances: &[ComputeInstances],
        _metrics: &dyn MetricsSink,
    ) -> ProviderResult<ClusterTopology> {
        self.topology.validate()?;
        debug!(provider = %self.provider, records = self.topology.len(), "serving static topology");
        Ok(self.topology.clone())
    }
}
