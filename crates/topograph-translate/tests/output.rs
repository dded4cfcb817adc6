//! Scheduler config fixtures.
//!
//! Graphs are assembled by hand the way a builder would produce them and
//! rendered through the public `write` entry point.

use topograph_core::{
    KEY_BLOCK_SIZES, KEY_BLOCK_SPLIT, KEY_PLUGIN, NO_TOPOLOGY, TOPOLOGY_BLOCK, TOPOLOGY_TREE, Vertex,
};
use topograph_metrics::TopologyMetrics;
use topograph_translate::{TranslateError, to_string, write_with_metrics};

const TREE_CONFIG: &str = "\
SwitchName=S1 Switches=S[2-3]
SwitchName=S2 Nodes=Node[201-202],Node205
SwitchName=S3 Nodes=Node[304-306]
";

const BLOCK_CONFIG: &str = "\
BlockName=B1 Nodes=Node[104-106]
BlockName=B2 Nodes=Node[201-202],Node205
BlockSizes=3
";

const BLOCK_CONFIG_TREE_ORDER: &str = "\
BlockName=B3 Nodes=Node[301-303]
BlockName=B4 Nodes=Node[401-403]
BlockName=B1 Nodes=Node[104-106]
BlockName=B2 Nodes=Node[201-202],Node205
BlockSizes=3
";

const BLOCK_CONFIG_DFS: &str = "\
BlockName=B1 Nodes=Node202
BlockName=B2 Nodes=Node[104-105]
BlockName=B3 Nodes=Node205
BlockSizes=1
";

const BLOCK_CONFIG_SPLIT: &str = "\
BlockName=B1-1 Nodes=Node[101-102]
BlockName=B1-2 Nodes=Node103
BlockName=B1-3 Nodes=Node[104-105]
BlockName=B2 Nodes=Node[201-202]
BlockSizes=2,4
";

const SHORT_NAME_CONFIG: &str = "\
# switch.3.1=hpcislandid-1
SwitchName=switch.3.1 Switches=switch.2.[1-2]
# switch.2.1=network-block-1
SwitchName=switch.2.1 Switches=switch.1.1
# switch.2.2=network-block-2
SwitchName=switch.2.2 Switches=switch.1.2
# switch.1.1=local-block-1
SwitchName=switch.1.1 Nodes=node-1
# switch.1.2=local-block-2
SwitchName=switch.1.2 Nodes=node-2
";

fn node(id: &str, name: &str) -> Vertex {
    Vertex::leaf(id, name)
}

fn sw(id: &str, children: Vec<Vertex>) -> Vertex {
    Vertex::with_children(id, "", children)
}

fn root(children: Vec<Vertex>, metadata: &[(&str, &str)]) -> Vertex {
    let mut root = Vertex::with_children("", "", children);
    for (k, v) in metadata {
        root.set_metadata(*k, *v);
    }
    root
}

fn block_meta(sizes: &str) -> Vec<(&'static str, String)> {
    vec![(KEY_PLUGIN, TOPOLOGY_BLOCK.to_string()), (KEY_BLOCK_SIZES, sizes.to_string())]
}

fn with_meta(mut v: Vertex, meta: Vec<(&'static str, String)>) -> Vertex {
    for (k, val) in meta {
        v.set_metadata(k, val);
    }
    v
}

//     S1
//   /    \
//  S2     S3
//  I21    I34
//  I22    I35
//  I25    I36
fn tree_test_set() -> Vertex {
    let s2 = sw(
        "S2",
        vec![node("I21", "Node201"), node("I22", "Node202"), node("I25", "Node205")],
    );
    let s3 = sw(
        "S3",
        vec![node("I34", "Node304"), node("I35", "Node305"), node("I36", "Node306")],
    );
    root(vec![sw(TOPOLOGY_TREE, vec![sw("S1", vec![s2, s3])])], &[])
}

fn b1() -> Vertex {
    sw("B1", vec![node("I14", "Node104"), node("I15", "Node105"), node("I16", "Node106")])
}

fn b2() -> Vertex {
    sw("B2", vec![node("I21", "Node201"), node("I22", "Node202"), node("I25", "Node205")])
}

fn block_test_set() -> Vertex {
    with_meta(root(vec![sw(TOPOLOGY_BLOCK, vec![b1(), b2()])], &[]), block_meta("3"))
}

//     ibRoot1
//        |
//        S1
//      /    \
//    S2      S3
//   I14-16  I21,I22,I25
fn block_with_ib_test_set() -> Vertex {
    let s2 = sw("S2", b1().vertices.into_values().collect());
    let s3 = sw("S3", b2().vertices.into_values().collect());
    let tree = sw(TOPOLOGY_TREE, vec![sw("S1", vec![s2, s3])]);
    with_meta(
        root(vec![tree, sw(TOPOLOGY_BLOCK, vec![b1(), b2()])], &[]),
        block_meta("3"),
    )
}

//         S0
//     /        \
//    S1         S4
//   /  \       /  \
//  S2   S3    S5   S6
//  B3   B4    B1   B2
fn block_with_multi_ib_test_set() -> Vertex {
    let b3 = sw("B3", (1..=3).map(|i| node(&format!("I3{i}"), &format!("Node30{i}"))).collect());
    let b4 = sw("B4", (1..=3).map(|i| node(&format!("I4{i}"), &format!("Node40{i}"))).collect());

    let s2 = sw("S2", b3.vertices.values().cloned().collect());
    let s3 = sw("S3", b4.vertices.values().cloned().collect());
    let s5 = sw("S5", b1().vertices.into_values().collect());
    let s6 = sw("S6", b2().vertices.into_values().collect());
    let s0 = sw("S0", vec![sw("S1", vec![s2, s3]), sw("S4", vec![s5, s6])]);

    with_meta(
        root(
            vec![sw(TOPOLOGY_TREE, vec![s0]), sw(TOPOLOGY_BLOCK, vec![b1(), b2(), b3, b4])],
            &[],
        ),
        block_meta("3"),
    )
}

//          S0
//     /    |     \
//   S1     S2     S3
//   |   I14,I15   |
//   S4            S5
//   I22           I25
fn block_with_dfs_ib_test_set() -> Vertex {
    let (n14, n15) = (node("I14", "Node104"), node("I15", "Node105"));
    let (n22, n25) = (node("I22", "Node202"), node("I25", "Node205"));

    let s1 = sw("S1", vec![sw("S4", vec![n22.clone()])]);
    let s2 = sw("S2", vec![n14.clone(), n15.clone()]);
    let s3 = sw("S3", vec![sw("S5", vec![n25.clone()])]);
    let tree = sw(TOPOLOGY_TREE, vec![sw("S0", vec![s1, s2, s3])]);

    let blocks = sw(
        TOPOLOGY_BLOCK,
        vec![sw("B2", vec![n14, n15]), sw("B1", vec![n22]), sw("B3", vec![n25])],
    );
    with_meta(root(vec![tree, blocks], &[]), block_meta("1"))
}

#[test]
fn tree_topology() {
    assert_eq!(to_string(&tree_test_set()).unwrap(), TREE_CONFIG);
}

#[test]
fn block_topology() {
    assert_eq!(to_string(&block_test_set()).unwrap(), BLOCK_CONFIG);
}

#[test]
fn block_topology_with_tree() {
    assert_eq!(to_string(&block_with_ib_test_set()).unwrap(), BLOCK_CONFIG);
}

#[test]
fn block_order_follows_tree() {
    assert_eq!(to_string(&block_with_multi_ib_test_set()).unwrap(), BLOCK_CONFIG_TREE_ORDER);
}

#[test]
fn block_order_depth_first() {
    assert_eq!(to_string(&block_with_dfs_ib_test_set()).unwrap(), BLOCK_CONFIG_DFS);
}

#[test]
fn tree_plugin_overrides_block_forest() {
    let mut graph = block_with_ib_test_set();
    graph.set_metadata(KEY_PLUGIN, TOPOLOGY_TREE);

    let out = to_string(&graph).unwrap();
    assert_eq!(out, "SwitchName=S1 Switches=S[2-3]\nSwitchName=S2 Nodes=Node[104-106]\nSwitchName=S3 Nodes=Node[201-202],Node205\n");
}

#[test]
fn missing_block_sizes_is_rejected() {
    let mut graph = block_with_ib_test_set();
    graph.metadata.remove(KEY_BLOCK_SIZES);

    let metrics = TopologyMetrics::new();
    let mut buf = Vec::new();
    let err = write_with_metrics(&mut buf, &graph, &metrics).unwrap_err();

    assert!(matches!(err, TranslateError::MissingBlockSizes));
    assert!(buf.is_empty());
    assert_eq!(metrics.snapshot().blocksize_errors["missing"], 1);
}

#[test]
fn malformed_block_sizes_are_rejected() {
    let mut graph = block_test_set();
    graph.set_metadata(KEY_BLOCK_SIZES, "4,2");

    let metrics = TopologyMetrics::new();
    let err = write_with_metrics(&mut Vec::new(), &graph, &metrics).unwrap_err();

    assert!(matches!(err, TranslateError::InvalidBlockSizes(..)));
    assert_eq!(metrics.snapshot().blocksize_errors["parse"], 1);
}

#[test]
fn block_plugin_without_block_forest() {
    let mut graph = tree_test_set();
    graph.set_metadata(KEY_PLUGIN, TOPOLOGY_BLOCK);
    graph.set_metadata(KEY_BLOCK_SIZES, "2");

    assert!(matches!(to_string(&graph), Err(TranslateError::MissingBlockForest)));
}

#[test]
fn unknown_plugin() {
    let mut graph = tree_test_set();
    graph.set_metadata(KEY_PLUGIN, "topology/torus");

    assert!(matches!(to_string(&graph), Err(TranslateError::UnsupportedPlugin(p)) if p == "topology/torus"));
}

#[test]
fn split_oversized_block_along_tree() {
    //        S1
    //      /    \
    //    S2      S3      S4
    //  I1-I3   I4,I5   I21,I22
    let members: Vec<Vertex> = (1..=5).map(|i| node(&format!("I{i}"), &format!("Node10{i}"))).collect();
    let small = vec![node("I21", "Node201"), node("I22", "Node202")];

    let s2 = sw("S2", members[..3].to_vec());
    let s3 = sw("S3", members[3..].to_vec());
    let tree = sw(TOPOLOGY_TREE, vec![sw("S1", vec![s2, s3]), sw("S4", small.clone())]);
    let blocks = sw(TOPOLOGY_BLOCK, vec![sw("B1", members), sw("B2", small)]);

    let mut graph = with_meta(root(vec![tree, blocks], &[]), block_meta("2,4"));
    graph.set_metadata(KEY_BLOCK_SPLIT, "true");

    assert_eq!(to_string(&graph).unwrap(), BLOCK_CONFIG_SPLIT);
}

#[test]
fn name_shortener_comments() {
    let tree = Vertex::with_children(
        TOPOLOGY_TREE,
        "",
        [Vertex::with_children(
            "hpcislandid-1",
            "switch.3.1",
            [
                Vertex::with_children(
                    "network-block-1",
                    "switch.2.1",
                    [Vertex::with_children("local-block-1", "switch.1.1", [node("node-1-id", "node-1")])],
                ),
                Vertex::with_children(
                    "network-block-2",
                    "switch.2.2",
                    [Vertex::with_children("local-block-2", "switch.1.2", [node("node-2-id", "node-2")])],
                ),
            ],
        )],
    );

    assert_eq!(to_string(&root(vec![tree], &[])).unwrap(), SHORT_NAME_CONFIG);
}

//         D1               no-topology
//       /    \                  |
//     P1      P2               I99
//    /  \      |
//  L1    L2    L3
#[test]
fn no_topology_bucket_follows_all_tiers() {
    let l1 = sw("L1", vec![node("I11", "Node11")]);
    let l2 = sw("L2", vec![node("I12", "Node12")]);
    let l3 = sw("L3", vec![node("I13", "Node13")]);
    let d1 = sw("D1", vec![sw("P1", vec![l1, l2]), sw("P2", vec![l3])]);
    let bucket = sw(NO_TOPOLOGY, vec![node("I99", "Node99")]);
    let graph = root(vec![sw(TOPOLOGY_TREE, vec![d1, bucket])], &[]);

    let expected = "\
SwitchName=D1 Switches=P[1-2]
SwitchName=P1 Switches=L[1-2]
SwitchName=P2 Switches=L3
SwitchName=L1 Nodes=Node11
SwitchName=L2 Nodes=Node12
SwitchName=L3 Nodes=Node13
SwitchName=no-topology Nodes=Node99
";
    assert_eq!(to_string(&graph).unwrap(), expected);
}

#[test]
fn empty_graph_writes_nothing() {
    assert_eq!(to_string(&Vertex::default()).unwrap(), "");
}
