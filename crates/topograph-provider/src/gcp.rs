//! Google Compute Engine collector.
//!
//! GCE reports placement as `resourceStatus.physicalHost`, a path of the
//! form `/<cluster>/<rack>/<host>`. The rack becomes the block tier and the
//! cluster the spine tier.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use topograph_core::{ClusterTopology, ComputeInstances, InstanceTopology, MetricsSink};
use tracing::{debug, info, warn};

use crate::collector::TopologyCollector;
use crate::error::{InstanceError, ProviderError, ProviderResult};

/// The part of a GCE instance resource the collector reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GcpInstance {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_status: Option<ResourceStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_host: Option<String>,
}

/// Parsed `/<cluster>/<rack>/<host>` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalHost {
    pub cluster: String,
    pub rack: String,
    pub host: String,
}

impl PhysicalHost {
    pub fn parse(path: &str) -> Option<Self> {
        let mut tokens = path.split('/');
        if !tokens.next()?.is_empty() {
            return None;
        }
        let cluster = tokens.next().filter(|t| !t.is_empty())?;
        let rack = tokens.next().filter(|t| !t.is_empty())?;
        let host = tokens.next().unwrap_or_default();
        Some(Self {
            cluster: cluster.to_string(),
            rack: rack.to_string(),
            host: host.to_string(),
        })
    }
}

/// The two Compute API listings the collector needs.
pub trait ComputeApi: Send + Sync + 'static {
    fn list_zones(&self) -> impl Future<Output = ProviderResult<Vec<String>>> + Send;

    fn list_instances(
        &self,
        zone: &str,
    ) -> impl Future<Output = ProviderResult<Vec<GcpInstance>>> + Send;
}

/// A recorded inventory: zone → instances.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticComputeApi {
    pub zones: BTreeMap<String, Vec<GcpInstance>>,
}

impl StaticComputeApi {
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        serde_json::from_str(json).map_err(|e| ProviderError::Api(format!("invalid inventory: {e}")))
    }
}

impl ComputeApi for StaticComputeApi {
    async fn list_zones(&self) -> ProviderResult<Vec<String>> {
        Ok(self.zones.keys().cloned().collect())
    }

    async fn list_instances(&self, zone: &str) -> ProviderResult<Vec<GcpInstance>> {
        self.zones
            .get(zone)
            .cloned()
            .ok_or_else(|| ProviderError::Api(format!("unknown zone {zone}")))
    }
}

/// Turn listed instances into topology records.
///
/// Instances without a resource status or a physical host are skipped and
/// reported both as [`InstanceError`]s and through the metrics sink. Only
/// instances in `in_cluster` produce records.
pub fn extract_topology(
    instances: &[GcpInstance],
    in_cluster: &HashSet<&str>,
    metrics: &dyn MetricsSink,
) -> (ClusterTopology, Vec<InstanceError>) {
    let mut topology = ClusterTopology::new();
    let mut skipped = Vec::new();

    for inst in instances {
        let name = inst.name.as_str();

        let Some(status) = &inst.resource_status else {
            metrics.set_resource_status_missing(name, true);
            skipped.push(InstanceError::ResourceStatusNotFound(name.to_string()));
            continue;
        };
        metrics.set_resource_status_missing(name, false);

        let Some(path) = &status.physical_host else {
            metrics.set_physical_host_missing(name, true);
            skipped.push(InstanceError::PhysicalHostNotFound(name.to_string()));
            continue;
        };
        metrics.set_physical_host_missing(name, false);

        if !in_cluster.contains(name) {
            continue;
        }

        let Some(host) = PhysicalHost::parse(path) else {
            skipped.push(InstanceError::MalformedPhysicalHost {
                instance: name.to_string(),
                host: path.clone(),
            });
            continue;
        };

        let record = InstanceTopology::new(name)
            .with_block(host.rack)
            .with_spine(host.cluster);
        if let Err(source) = topology.push(record) {
            skipped.push(InstanceError::Invalid {
                instance: name.to_string(),
                source,
            });
        }
    }

    (topology, skipped)
}

/// Lists every zone concurrently and extracts physical-host placement.
#[derive(Debug)]
pub struct GcpCollector<A> {
    api: Arc<A>,
}

impl<A: ComputeApi> GcpCollector<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }

    async fn list_all(&self, metrics: &dyn MetricsSink) -> ProviderResult<Vec<GcpInstance>> {
        let start = Instant::now();
        let zones = self.api.list_zones().await?;
        metrics.observe_api_latency("ListZones", start.elapsed());
        debug!(zones = zones.len(), "listed zones");

        let mut tasks = JoinSet::new();
        for zone in zones {
            let api = Arc::clone(&self.api);
            tasks.spawn(async move {
                let start = Instant::now();
                let result = api.list_instances(&zone).await;
                (zone, start.elapsed(), result)
            });
        }

        let mut instances = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (zone, elapsed, result) = joined.map_err(|e| ProviderError::Task(e.to_string()))?;
            metrics.observe_api_latency("ListInstances", elapsed);
            let listed = result?;
            debug!(zone = %zone, instances = listed.len(), "listed instances");
            instances.extend(listed);
        }
        // Zones finish in any order.
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(instances)
    }
}

impl<A: ComputeApi> TopologyCollector for GcpCollector<A> {
    fn provider(&self) -> &str {
        "gcp"
    }

    async fn collect(
        &self,
        compute_instances: &[ComputeInstances],
        metrics: &dyn MetricsSink,
    ) -> ProviderResult<ClusterTopology> {
        let instances = self.list_all(metrics).await?;
        let in_cluster: HashSet<&str> = compute_instances
            .iter()
            .flat_map(|ci| ci.instances.keys().map(String::as_str))
            .collect();

        let (topology, skipped) = extract_topology(&instances, &in_cluster, metrics);
        for err in &skipped {
            warn!(error = %err, "skipping instance");
        }
        info!(
            listed = instances.len(),
            records = topology.len(),
            skipped = skipped.len(),
            "collected gcp topology"
        );
        Ok(topology)
    }
}
