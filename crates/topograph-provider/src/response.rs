//! Service payload types.
//!
//! A topology service answers with a flat instance list where each instance
//! names its switches innermost first. These helpers move between that
//! payload, the record form and the placement graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use topograph_core::{
    ClusterTopology, ComputeInstances, DomainMap, ForestBuilder, KEY_PLUGIN, TOPOLOGY_BLOCK,
    TOPOLOGY_TREE, Vertex, assemble_root,
};
use tracing::debug;

/// Asks a topology service about a set of instances in one region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instance_ids: Vec<String>,
}

impl TopologyRequest {
    /// One request per region, instance IDs sorted.
    pub fn for_instances(provider: &str, compute_instances: &[ComputeInstances]) -> Vec<Self> {
        compute_instances
            .iter()
            .map(|ci| {
                let mut instance_ids: Vec<String> = ci.instances.keys().cloned().collect();
                instance_ids.sort();
                Self {
                    provider: provider.to_string(),
                    region: ci.region.clone(),
                    instance_ids,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyResponse {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instance_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub provider: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub data_center: String,
    /// Switch IDs, innermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_layers: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub nvlink_domain: String,
}

impl TopologyResponse {
    /// Flatten records into a service payload. Switch names are dropped; only
    /// IDs travel.
    pub fn from_topology(
        topology: &ClusterTopology,
        provider: &str,
        region: &str,
        instance_type: &str,
    ) -> Self {
        let instances = topology
            .instances
            .iter()
            .map(|inst| Instance {
                id: inst.instance_id.clone(),
                instance_type: instance_type.to_string(),
                provider: provider.to_string(),
                region: region.to_string(),
                data_center: inst.datacenter_id.clone(),
                network_layers: inst
                    .switch_chain()
                    .into_iter()
                    .map(|(id, _)| id.to_string())
                    .collect(),
                nvlink_domain: inst.accelerator_id.clone(),
            })
            .collect();
        Self { instances }
    }
}

/// Plugin requested by the request parameters; tree unless the `plugin`
/// parameter asks for block.
pub fn topology_format(params: Option<&HashMap<String, serde_json::Value>>) -> &'static str {
    match params.and_then(|p| p.get(KEY_PLUGIN)).and_then(|v| v.as_str()) {
        Some(TOPOLOGY_BLOCK) => TOPOLOGY_BLOCK,
        _ => TOPOLOGY_TREE,
    }
}

/// Build the placement graph from a service payload.
///
/// NVLink domains become blocks named `nvlink-<domain>`, and only when
/// `format` is the block plugin. Mapped instances with no network layers
/// that are not in a block land in the no-topology bucket.
pub fn to_graph(
    response: &TopologyResponse,
    compute_instances: &[ComputeInstances],
    format: &str,
) -> Vertex {
    let mut i2n: HashMap<&str, &str> = HashMap::new();
    for ci in compute_instances {
        for (instance, node) in &ci.instances {
            i2n.insert(instance.as_str(), node.as_str());
        }
    }

    let mut forest = ForestBuilder::new();
    let mut domains = DomainMap::new();
    let mut unplaced = Vec::new();
    let with_blocks = format == TOPOLOGY_BLOCK;

    for ins in &response.instances {
        let Some(node) = i2n.remove(ins.id.as_str()) else {
            debug!(instance = %ins.id, "instance not in cluster, skipping");
            continue;
        };

        let in_block = with_blocks && !ins.nvlink_domain.is_empty();
        if in_block {
            domains.add_host(&format!("nvlink-{}", ins.nvlink_domain), &ins.id, node);
        }

        let chain: Vec<(&str, &str)> = ins.network_layers.iter().map(|id| (id.as_str(), "")).collect();
        let leaf = Vertex::leaf(ins.id.as_str(), node);
        if !forest.add_instance(leaf, &chain) && !in_block {
            unplaced.push((ins.id.as_str(), node));
        }
    }
    unplaced.extend(i2n);

    assemble_root(forest, &domains, unplaced)
}

#[cfg(test)]
mod tests {
    use topograph_core::{InstanceTopology, NO_TOPOLOGY};

    use super::*;

    fn layered(id: &str, layers: &[&str], domain: &str) -> Instance {
        Instance {
            id: id.to_string(),
            instance_type: "H100".to_string(),
            network_layers: layers.iter().map(|s| s.to_string()).collect(),
            nvlink_domain: domain.to_string(),
            ..Instance::default()
        }
    }

    fn node(id: &str) -> Vertex {
        Vertex::leaf(id, id.to_uppercase())
    }

    fn sw(id: &str, children: Vec<Vertex>) -> Vertex {
        Vertex::with_children(id, "", children)
    }

    #[test]
    fn graph_from_service_payload() {
        let response = TopologyResponse {
            instances: vec![
                layered("n10-1", &[], "nv1"),
                layered("n10-2", &[], "nv1"),
                layered("n11-1", &["sw11", "sw21", "sw3"], "nv1"),
                layered("n11-2", &["sw11", "sw21", "sw3"], "nv1"),
                layered("n12-1", &["sw12", "sw21", "sw3"], ""),
                layered("n12-2", &["sw12", "sw21", "sw3"], ""),
                layered("n13-1", &["sw13", "sw22", "sw3"], ""),
                layered("n13-2", &["sw13", "sw22", "sw3"], ""),
                layered("n14-1", &["sw14", "sw22", "sw3"], ""),
                layered("n14-2", &["sw14", "sw22", "sw3"], ""),
                layered("n15", &["sw14", "sw22", "sw3"], "nv2"),
            ],
        };

        let mut ci = ComputeInstances::new("");
        for id in [
            "n10-1", "n10-2", "n11-1", "n11-2", "n12-1", "n12-2", "n13-1", "n13-2", "n14-1", "n14-2",
            "cpu1",
        ] {
            ci = ci.with_instance(id, id.to_uppercase());
        }

        let sw21 = sw(
            "sw21",
            vec![
                sw("sw11", vec![node("n11-1"), node("n11-2")]),
                sw("sw12", vec![node("n12-1"), node("n12-2")]),
            ],
        );
        let sw22 = sw(
            "sw22",
            vec![
                sw("sw13", vec![node("n13-1"), node("n13-2")]),
                sw("sw14", vec![node("n14-1"), node("n14-2")]),
            ],
        );
        let tree = sw(
            TOPOLOGY_TREE,
            vec![sw("sw3", vec![sw21, sw22]), sw(NO_TOPOLOGY, vec![node("cpu1")])],
        );
        let blocks = sw(
            TOPOLOGY_BLOCK,
            vec![sw(
                "nvlink-nv1",
                vec![node("n10-1"), node("n10-2"), node("n11-1"), node("n11-2")],
            )],
        );
        let expected = Vertex::with_children("", "", [tree, blocks]);

        assert_eq!(to_graph(&response, &[ci], TOPOLOGY_BLOCK), expected);
    }

    #[test]
    fn tree_format_buckets_domain_only_instances() {
        let response = TopologyResponse {
            instances: vec![layered("n1", &[], "nv1"), layered("n2", &["sw1"], "nv1")],
        };
        let ci = ComputeInstances::new("")
            .with_instance("n1", "N1")
            .with_instance("n2", "N2");

        let root = to_graph(&response, &[ci], TOPOLOGY_TREE);

        assert!(root.child(TOPOLOGY_BLOCK).is_none());
        let tree = root.child(TOPOLOGY_TREE).unwrap();
        assert_eq!(tree.child(NO_TOPOLOGY).unwrap().vertices.len(), 1);
        assert!(tree.child("sw1").unwrap().child("n2").is_some());
    }

    #[test]
    fn format_from_params() {
        let cases: Vec<(Option<HashMap<String, serde_json::Value>>, &str)> = vec![
            (None, TOPOLOGY_TREE),
            (Some(HashMap::new()), TOPOLOGY_TREE),
            (Some(HashMap::from([("a".to_string(), "b".into())])), TOPOLOGY_TREE),
            (Some(HashMap::from([(KEY_PLUGIN.to_string(), TOPOLOGY_BLOCK.into())])), TOPOLOGY_BLOCK),
            (Some(HashMap::from([(KEY_PLUGIN.to_string(), TOPOLOGY_TREE.into())])), TOPOLOGY_TREE),
            (Some(HashMap::from([(KEY_PLUGIN.to_string(), 7.into())])), TOPOLOGY_TREE),
        ];
        for (params, want) in cases {
            assert_eq!(topology_format(params.as_ref()), want, "params {params:?}");
        }
    }

    #[test]
    fn requests_per_region() {
        let cis = vec![
            ComputeInstances::new("us-east1")
                .with_instance("i2", "n2")
                .with_instance("i1", "n1"),
            ComputeInstances::new("us-west1"),
        ];
        let requests = TopologyRequest::for_instances("test", &cis);

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].instance_ids, vec!["i1", "i2"]);
        assert_eq!(
            serde_json::to_string(&requests[1]).unwrap(),
            r#"{"provider":"test","region":"us-west1"}"#
        );
    }

    #[test]
    fn payload_from_records() {
        let topology = ClusterTopology {
            instances: vec![
                InstanceTopology::new("i1")
                    .with_block("b1")
                    .with_spine("s1")
                    .with_datacenter("d1")
                    .with_accelerator("nv1"),
            ],
        };
        let response = TopologyResponse::from_topology(&topology, "gcp", "us-east1", "a3");

        assert_eq!(response.instances[0].network_layers, vec!["b1", "s1", "d1"]);
        assert_eq!(response.instances[0].nvlink_domain, "nv1");
        assert_eq!(response.instances[0].data_center, "d1");

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"network_layers\":[\"b1\",\"s1\",\"d1\"]"));
        let back: TopologyResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, response);
    }
}
