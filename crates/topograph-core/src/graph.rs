//! Three-tier graph construction.
//!
//! Turns normalized [`InstanceTopology`] records and the instance → node map
//! into the root [`Vertex`] holding the tree and block forests.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::error::TopologyResult;
use crate::metrics::MetricsSink;
use crate::topology::{ClusterTopology, ComputeInstances};
use crate::vertex::{NO_TOPOLOGY, TOPOLOGY_BLOCK, TOPOLOGY_TREE, Vertex};

#[derive(Debug, Default)]
struct SwitchEntry {
    name: String,
    /// IDs of child switches.
    switches: BTreeSet<String>,
    leaves: HashMap<String, Vertex>,
    has_parent: bool,
}

/// Accumulates switch chains and assembles them into the tree forest.
///
/// Switches are shared by ID: a chain that reaches an already known switch
/// extends it instead of creating a second one. Switches that never appear
/// as someone's child become forest roots.
#[derive(Debug, Default)]
pub struct ForestBuilder {
    switches: HashMap<String, SwitchEntry>,
    extra_roots: Vec<Vertex>,
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, id: &str, name: &str) -> &mut SwitchEntry {
        let entry = self.switches.entry(id.to_string()).or_default();
        if entry.name.is_empty() && !name.is_empty() {
            entry.name = name.to_string();
        }
        entry
    }

    /// Attach `leaf` under a chain of `(id, name)` switches, innermost first.
    ///
    /// Returns `false` (and drops the leaf) when the chain is empty.
    pub fn add_instance(&mut self, leaf: Vertex, chain: &[(&str, &str)]) -> bool {
        let Some(((first_id, first_name), rest)) = chain.split_first() else {
            return false;
        };
        self.entry(first_id, first_name)
            .leaves
            .insert(leaf.id.clone(), leaf);

        let mut child = *first_id;
        for (id, name) in rest {
            self.entry(id, name).switches.insert(child.to_string());
            if let Some(entry) = self.switches.get_mut(child) {
                entry.has_parent = true;
            }
            child = *id;
        }
        true
    }

    /// Add a ready-made top-level vertex, such as the no-topology bucket.
    pub fn insert_root(&mut self, vertex: Vertex) {
        self.extra_roots.push(vertex);
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty() && self.extra_roots.is_empty()
    }

    /// Assemble the forest under a root keyed [`TOPOLOGY_TREE`].
    ///
    /// A component where every switch has a parent (a cycle of tier IDs) has
    /// no natural root; its smallest switch ID is promoted to one and the
    /// edge closing the cycle is dropped.
    pub fn build(self) -> Vertex {
        let mut tree = Vertex::group(TOPOLOGY_TREE, "");
        let mut ids: Vec<&String> = self.switches.keys().collect();
        ids.sort();

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        let roots = ids.iter().filter(|id| !self.switches[id.as_str()].has_parent);
        for id in roots {
            if let Some(v) = self.assemble(id, &mut path, &mut visited) {
                tree.insert(v);
            }
        }
        for id in &ids {
            if visited.contains(id.as_str()) {
                continue;
            }
            warn!(switch = %id, "switch unreachable from any root, promoting to root");
            if let Some(v) = self.assemble(id, &mut path, &mut visited) {
                tree.insert(v);
            }
        }

        for v in self.extra_roots {
            tree.insert(v);
        }
        tree
    }

    fn assemble(&self, id: &str, path: &mut Vec<String>, visited: &mut HashSet<String>) -> Option<Vertex> {
        let entry = self.switches.get(id)?;
        visited.insert(id.to_string());
        let mut v = Vertex::group(id, entry.name.clone());
        for leaf in entry.leaves.values() {
            v.insert(leaf.clone());
        }

        path.push(id.to_string());
        for child in &entry.switches {
            if path.contains(child) {
                warn!(switch = %id, child = %child, "switch cycle detected, dropping edge");
                continue;
            }
            if let Some(sub) = self.assemble(child, path, visited) {
                v.insert(sub);
            }
        }
        path.pop();
        Some(v)
    }
}

/// Accelerator domain → instance ID → node name.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DomainMap(BTreeMap<String, HashMap<String, String>>);

impl DomainMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_host(&mut self, domain: &str, instance: &str, node: &str) {
        self.0
            .entry(domain.to_string())
            .or_default()
            .insert(instance.to_string(), node.to_string());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// One flat vertex per domain under a root keyed [`TOPOLOGY_BLOCK`].
    pub fn to_blocks(&self) -> Vertex {
        let mut root = Vertex::group(TOPOLOGY_BLOCK, "");
        for (domain, hosts) in &self.0 {
            let leaves = hosts
                .iter()
                .map(|(instance, node)| Vertex::leaf(instance.as_str(), node.as_str()));
            root.insert(Vertex::with_children(domain.as_str(), "", leaves));
        }
        root
    }
}

/// Combine the two views into the top-level root.
///
/// `unplaced` (instance, node) pairs become the [`NO_TOPOLOGY`] bucket of the
/// tree forest. Empty views are left out of the root.
pub fn assemble_root(mut forest: ForestBuilder, domains: &DomainMap, mut unplaced: Vec<(&str, &str)>) -> Vertex {
    if !unplaced.is_empty() {
        unplaced.sort_unstable();
        debug!(nodes = ?unplaced, "adding nodes without topology");
        let leaves = unplaced
            .iter()
            .map(|(instance, node)| Vertex::leaf(*instance, *node));
        forest.insert_root(Vertex::with_children(NO_TOPOLOGY, "", leaves));
    }

    let mut root = Vertex::default();
    if !forest.is_empty() {
        root.insert(forest.build());
    }
    if !domains.is_empty() {
        root.insert(domains.to_blocks());
    }
    root
}

impl ClusterTopology {
    /// Build the root graph from these records.
    ///
    /// Only instances present in `compute_instances` are placed. Mapped
    /// instances that no record places in the network tree end up under the
    /// [`NO_TOPOLOGY`] bucket, even when they belong to a block. The
    /// root holds the tree forest when non-empty and the block forest when
    /// any record carries an accelerator ID.
    pub fn to_three_tier_graph(
        &self,
        provider: &str,
        compute_instances: &[ComputeInstances],
        metrics: &dyn MetricsSink,
    ) -> TopologyResult<Vertex> {
        self.validate()?;

        let mut i2n: HashMap<&str, &str> = HashMap::new();
        for ci in compute_instances {
            for (instance, node) in &ci.instances {
                i2n.insert(instance.as_str(), node.as_str());
            }
        }

        let mut forest = ForestBuilder::new();
        let mut domains = DomainMap::new();
        let mut unplaced: Vec<(&str, &str)> = Vec::new();

        for inst in &self.instances {
            let Some(node) = i2n.remove(inst.instance_id.as_str()) else {
                debug!(instance = %inst.instance_id, "instance not in cluster, skipping");
                continue;
            };
            debug!(node = %node, instance = %inst.instance_id, "found node");

            if !inst.accelerator_id.is_empty() {
                domains.add_host(&inst.accelerator_id, &inst.instance_id, node);
            }

            let leaf = Vertex::leaf(inst.instance_id.as_str(), node);
            if !forest.add_instance(leaf, &inst.switch_chain()) {
                unplaced.push((inst.instance_id.as_str(), node));
            }
        }

        unplaced.extend(i2n);
        let missing = unplaced.len();
        metrics.set_missing_topology(provider, missing);
        let root = assemble_root(forest, &domains, unplaced);

        info!(
            provider,
            instances = self.instances.len(),
            missing_topology = missing,
            domains = domains.len(),
            "built three-tier topology graph"
        );
        Ok(root)
    }
}
