use std::path::Path;

use topograph_core::{ClusterTopology, Vertex};
use topograph_metrics::TopologyMetrics;
use topograph_provider::StaticCollector;
use tracing::info;

use super::{OutputArgs, read_json};
use crate::config::TopographConfig;

/// Build a graph from a recorded topology file.
pub async fn build(
    records: &Path,
    args: &OutputArgs,
    config: &TopographConfig,
    metrics: &TopologyMetrics,
) -> anyhow::Result<Vertex> {
    let topology: ClusterTopology = read_json(records)?;
    info!(path = %records.display(), records = topology.len(), "loaded topology records");

    let cis = args.compute_instances(topology.instances.iter().map(|i| i.instance_id.as_str()))?;
    let collector = StaticCollector::new(config.provider_or("static"), topology);
    let opts = args.engine_options(config)?;

    Ok(topograph_provider::generate(&collector, &cis, &opts, metrics).await?)
}

pub async fn generate(records: &Path, args: &OutputArgs, config: &TopographConfig) -> anyhow::Result<()> {
    let metrics = TopologyMetrics::new();
    let root = build(records, args, config, &metrics).await?;
    args.emit(&root, &metrics)
}
