use std::path::Path;

use topograph_core::Vertex;
use topograph_metrics::TopologyMetrics;
use topograph_provider::{GcpCollector, StaticComputeApi};
use tracing::info;

use super::OutputArgs;
use crate::config::TopographConfig;

/// Build a graph from a recorded GCE inventory (zone → instance resources).
pub async fn build(
    inventory: &Path,
    args: &OutputArgs,
    config: &TopographConfig,
    metrics: &TopologyMetrics,
) -> anyhow::Result<Vertex> {
    let api: StaticComputeApi = super::read_json(inventory)?;
    info!(path = %inventory.display(), zones = api.zones.len(), "loaded gcp inventory");

    let names: Vec<String> = api.zones.values().flatten().map(|i| i.name.clone()).collect();
    let cis = args.compute_instances(names.iter().map(String::as_str))?;
    let opts = args.engine_options(config)?;

    let collector = GcpCollector::new(api);
    Ok(topograph_provider::generate(&collector, &cis, &opts, metrics).await?)
}

pub async fn gcp(inventory: &Path, args: &OutputArgs, config: &TopographConfig) -> anyhow::Result<()> {
    let metrics = TopologyMetrics::new();
    let root = build(inventory, args, config, &metrics).await?;
    args.emit(&root, &metrics)
}
