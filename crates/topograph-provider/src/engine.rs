//! Topology generation: run a collector, fold its records into the root
//! graph and stamp the output options onto the root.

use std::time::{Duration, Instant};

use topograph_core::{
    ComputeInstances, KEY_BLOCK_SIZES, KEY_BLOCK_SPLIT, KEY_PLUGIN, MetricsSink, Vertex,
};
use tracing::{error, info};

use crate::collector::TopologyCollector;
use crate::error::{ProviderError, ProviderResult};

/// Engine label attached to request metrics.
pub const ENGINE: &str = "slurm";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Rename switches to `switch.<band>.<n>` before building.
    pub normalize: bool,
    /// Upper bound on the collector run.
    pub timeout: Option<Duration>,
    /// Output plugin; left to the serializer's default when unset.
    pub plugin: Option<String>,
    pub block_sizes: Option<Vec<usize>>,
    pub block_split: bool,
}

impl EngineOptions {
    fn apply(&self, root: &mut Vertex) {
        if let Some(plugin) = &self.plugin {
            root.set_metadata(KEY_PLUGIN, plugin.as_str());
        }
        if let Some(sizes) = &self.block_sizes {
            let joined: Vec<String> = sizes.iter().map(ToString::to_string).collect();
            root.set_metadata(KEY_BLOCK_SIZES, joined.join(","));
        }
        if self.block_split {
            root.set_metadata(KEY_BLOCK_SPLIT, "true");
        }
    }
}

fn status_code(result: &ProviderResult<Vertex>) -> u16 {
    match result {
        Ok(_) => 200,
        Err(ProviderError::Topology(_)) => 400,
        Err(ProviderError::Timeout(_)) => 504,
        Err(_) => 500,
    }
}

/// Collect, build and annotate the root graph for `compute_instances`.
///
/// Every call records one request sample, successful or not.
pub async fn generate<C: TopologyCollector>(
    collector: &C,
    compute_instances: &[ComputeInstances],
    opts: &EngineOptions,
    metrics: &dyn MetricsSink,
) -> ProviderResult<Vertex> {
    let start = Instant::now();
    let result = run(collector, compute_instances, opts, metrics).await;
    let status = status_code(&result);
    metrics.add_request(collector.provider(), ENGINE, status, start.elapsed());

    match &result {
        Ok(_) => info!(provider = collector.provider(), elapsed = ?start.elapsed(), "topology generated"),
        Err(e) => error!(provider = collector.provider(), status, error = %e, "topology generation failed"),
    }
    result
}

async fn run<C: TopologyCollector>(
    collector: &C,
    compute_instances: &[ComputeInstances],
    opts: &EngineOptions,
    metrics: &dyn MetricsSink,
) -> ProviderResult<Vertex> {
    let collect = collector.collect(compute_instances, metrics);
    let mut topology = match opts.timeout {
        Some(limit) => tokio::time::timeout(limit, collect)
            .await
            .map_err(|_| ProviderError::Timeout(limit))??,
        None => collect.await?,
    };

    if opts.normalize {
        topology.normalize();
    }
    let mut root = topology.to_three_tier_graph(collector.provider(), compute_instances, metrics)?;
    opts.apply(&mut root);
    Ok(root)
}
