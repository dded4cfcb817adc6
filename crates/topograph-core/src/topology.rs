//! Flat per-instance topology records and the normalization pass.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TopologyError, TopologyResult};

/// Network tier, used to build canonical switch names `switch.<band>.<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Block = 1,
    Spine = 2,
    Datacenter = 3,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Block, Band::Spine, Band::Datacenter];

    pub fn label(&self) -> &'static str {
        match self {
            Band::Block => "block",
            Band::Spine => "spine",
            Band::Datacenter => "datacenter",
        }
    }

    /// Canonical name of the `ordinal`-th switch (1-based) in this tier.
    pub fn switch_name(&self, ordinal: usize) -> String {
        format!("switch.{}.{}", *self as u8, ordinal)
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Placement of one compute instance as reported by a provider collector.
///
/// Tier IDs are filled as a contiguous prefix: block, then spine, then
/// datacenter. Name fields are assigned by [`ClusterTopology::normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceTopology {
    pub instance_id: String,
    /// NVLink (or similar) domain the instance belongs to.
    pub accelerator_id: String,
    pub accelerator_name: String,
    pub block_id: String,
    pub block_name: String,
    pub spine_id: String,
    pub spine_name: String,
    pub datacenter_id: String,
    pub datacenter_name: String,
}

impl InstanceTopology {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            ..Self::default()
        }
    }

    pub fn with_accelerator(mut self, accelerator_id: impl Into<String>) -> Self {
        self.accelerator_id = accelerator_id.into();
        self
    }

    pub fn with_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = block_id.into();
        self
    }

    pub fn with_spine(mut self, spine_id: impl Into<String>) -> Self {
        self.spine_id = spine_id.into();
        self
    }

    pub fn with_datacenter(mut self, datacenter_id: impl Into<String>) -> Self {
        self.datacenter_id = datacenter_id.into();
        self
    }

    pub fn tier_id(&self, band: Band) -> &str {
        match band {
            Band::Block => &self.block_id,
            Band::Spine => &self.spine_id,
            Band::Datacenter => &self.datacenter_id,
        }
    }

    pub fn tier_name(&self, band: Band) -> &str {
        match band {
            Band::Block => &self.block_name,
            Band::Spine => &self.spine_name,
            Band::Datacenter => &self.datacenter_name,
        }
    }

    fn set_tier_name(&mut self, band: Band, name: String) {
        match band {
            Band::Block => self.block_name = name,
            Band::Spine => self.spine_name = name,
            Band::Datacenter => self.datacenter_name = name,
        }
    }

    /// Populated tiers, innermost first, as `(id, name)` pairs.
    pub fn switch_chain(&self) -> Vec<(&str, &str)> {
        Band::ALL
            .iter()
            .map(|&band| (self.tier_id(band), self.tier_name(band)))
            .take_while(|(id, _)| !id.is_empty())
            .collect()
    }

    pub fn has_network_tiers(&self) -> bool {
        !self.block_id.is_empty()
    }

    /// Check the instance ID and the tier-prefix invariant.
    pub fn validate(&self) -> TopologyResult<()> {
        if self.instance_id.is_empty() {
            return Err(TopologyError::EmptyInstanceId);
        }
        for pair in Band::ALL.windows(2) {
            let (inner, outer) = (pair[0], pair[1]);
            if self.tier_id(inner).is_empty() && !self.tier_id(outer).is_empty() {
                return Err(TopologyError::SparseTiers {
                    instance: self.instance_id.clone(),
                    tier: outer.label(),
                    id: self.tier_id(outer).to_string(),
                    missing: inner.label(),
                });
            }
        }
        Ok(())
    }
}

/// Provider instance ID → scheduler node name, for one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeInstances {
    pub region: String,
    pub instances: HashMap<String, String>,
}

impl ComputeInstances {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            instances: HashMap::new(),
        }
    }

    pub fn with_instance(mut self, instance_id: impl Into<String>, node: impl Into<String>) -> Self {
        self.instances.insert(instance_id.into(), node.into());
        self
    }
}

/// The flat record list produced by one collector run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTopology {
    #[serde(default)]
    pub instances: Vec<InstanceTopology>,
}

impl ClusterTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a record.
    pub fn push(&mut self, instance: InstanceTopology) -> TopologyResult<()> {
        instance.validate()?;
        self.instances.push(instance);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn validate(&self) -> TopologyResult<()> {
        self.instances.iter().try_for_each(InstanceTopology::validate)
    }

    /// Sort records by network hierarchy and assign canonical switch names.
    ///
    /// Records are ordered by (datacenter, spine, block, instance). Each
    /// distinct tier ID gets `switch.<band>.<n>` in first-seen order, with
    /// a separate counter per tier. Empty tier IDs stay unnamed.
    pub fn normalize(&mut self) {
        self.instances.sort_by(|a, b| {
            (&a.datacenter_id, &a.spine_id, &a.block_id, &a.instance_id).cmp(&(
                &b.datacenter_id,
                &b.spine_id,
                &b.block_id,
                &b.instance_id,
            ))
        });

        let mut names: HashMap<Band, HashMap<String, String>> = HashMap::new();
        for inst in &mut self.instances {
            for band in Band::ALL {
                let id = inst.tier_id(band);
                if id.is_empty() {
                    inst.set_tier_name(band, String::new());
                    continue;
                }
                let tier = names.entry(band).or_default();
                let next = tier.len() + 1;
                let name = tier
                    .entry(id.to_string())
                    .or_insert_with(|| band.switch_name(next))
                    .clone();
                inst.set_tier_name(band, name);
            }
        }

        debug!(
            instances = self.instances.len(),
            blocks = names.get(&Band::Block).map_or(0, HashMap::len),
            spines = names.get(&Band::Spine).map_or(0, HashMap::len),
            datacenters = names.get(&Band::Datacenter).map_or(0, HashMap::len),
            "normalized cluster topology"
        );
    }
}
