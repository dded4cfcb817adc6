//! Scheduler topology config emission.
//!
//! Two formats are produced from a root [`Vertex`]:
//!
//! ```text
//! # switch.2.1=spine-a
//! SwitchName=switch.2.1 Switches=switch.1.[1-2]
//! SwitchName=switch.1.1 Nodes=node[01-16]
//!
//! BlockName=nvl1 Nodes=gpu[001-018]
//! BlockSizes=18
//! ```
//!
//! The plugin is taken from the root metadata (`plugin`); without it the
//! block format is used whenever the graph carries a block forest.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Write;

use topograph_core::{
    KEY_BLOCK_SIZES, KEY_BLOCK_SPLIT, KEY_PLUGIN, MetricsSink, NO_TOPOLOGY, NoopMetrics,
    TOPOLOGY_BLOCK, TOPOLOGY_TREE, Vertex,
};
use tracing::{debug, warn};

use crate::compress::compress;
use crate::error::{TranslateError, TranslateResult};

/// Render `root` into `wr`.
pub fn write<W: Write>(wr: &mut W, root: &Vertex) -> TranslateResult<()> {
    write_with_metrics(wr, root, &NoopMetrics)
}

/// Render `root` into a string.
pub fn to_string(root: &Vertex) -> TranslateResult<String> {
    let mut buf = Vec::new();
    write(&mut buf, root)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Render `root` into `wr`, reporting block-size validation failures.
pub fn write_with_metrics<W: Write>(
    wr: &mut W,
    root: &Vertex,
    metrics: &dyn MetricsSink,
) -> TranslateResult<()> {
    let tree = root.child(TOPOLOGY_TREE);
    let blocks = root.child(TOPOLOGY_BLOCK);
    let default_plugin = if blocks.is_some() { TOPOLOGY_BLOCK } else { TOPOLOGY_TREE };
    let plugin = root.metadata_value(KEY_PLUGIN).unwrap_or(default_plugin);

    match plugin {
        TOPOLOGY_TREE => match tree {
            Some(tree) => write_tree(wr, tree),
            None => {
                debug!("graph has no tree forest, nothing to write");
                Ok(())
            }
        },
        TOPOLOGY_BLOCK => {
            let blocks = blocks.ok_or(TranslateError::MissingBlockForest)?;
            let opts = BlockOptions::from_root(root, blocks, metrics)?;
            write_blocks(wr, blocks, tree, &opts)
        }
        other => Err(TranslateError::UnsupportedPlugin(other.to_string())),
    }
}

/// Breadth-first over the switches, children in key order. The
/// [`NO_TOPOLOGY`] bucket is written last.
fn write_tree<W: Write>(wr: &mut W, tree: &Vertex) -> TranslateResult<()> {
    let (bucket, roots): (Vec<_>, Vec<_>) = tree
        .sorted_children()
        .into_iter()
        .map(|(_, v)| v)
        .partition(|v| v.id == NO_TOPOLOGY);
    let mut queue: VecDeque<&Vertex> = roots.into();

    while let Some(sw) = queue.pop_front() {
        if sw.is_leaf() {
            warn!(node = %sw.display_name(), "node attached to the tree root, skipping");
            continue;
        }
        write_switch(wr, sw, &mut queue)?;
    }
    for sw in bucket {
        write_switch(wr, sw, &mut queue)?;
    }
    Ok(())
}

/// Write one `SwitchName=` line, queueing its sub-switches.
fn write_switch<'a, W: Write>(
    wr: &mut W,
    sw: &'a Vertex,
    queue: &mut VecDeque<&'a Vertex>,
) -> TranslateResult<()> {
    let mut switches = Vec::new();
    let mut nodes = Vec::new();
    for (_, child) in sw.sorted_children() {
        if child.is_leaf() {
            nodes.push(child.display_name());
        } else {
            switches.push(child.display_name());
            queue.push_back(child);
        }
    }

    if !sw.name.is_empty() && sw.name != sw.id {
        writeln!(wr, "# {}={}", sw.name, sw.id)?;
    }
    write!(wr, "SwitchName={}", sw.display_name())?;
    if !switches.is_empty() {
        write!(wr, " Switches={}", compress(&switches).join(","))?;
    }
    if !nodes.is_empty() {
        write!(wr, " Nodes={}", compress(&nodes).join(","))?;
    }
    writeln!(wr)?;
    Ok(())
}

struct BlockOptions {
    sizes: Vec<usize>,
    split: bool,
}

impl BlockOptions {
    fn from_root(root: &Vertex, blocks: &Vertex, metrics: &dyn MetricsSink) -> TranslateResult<Self> {
        let Some(raw) = root.metadata_value(KEY_BLOCK_SIZES) else {
            metrics.add_block_size_validation_error("missing");
            return Err(TranslateError::MissingBlockSizes);
        };
        let sizes = parse_block_sizes(raw).inspect_err(|_| {
            metrics.add_block_size_validation_error("parse");
        })?;

        let largest_domain = blocks.vertices.values().map(|b| b.vertices.len()).max().unwrap_or(0);
        if sizes[0] > largest_domain {
            metrics.add_block_size_validation_error("exceeds_domain");
            warn!(
                base_block_size = sizes[0],
                largest_domain, "base block size exceeds every accelerator domain"
            );
        }

        let split = matches!(
            root.metadata_value(KEY_BLOCK_SPLIT),
            Some("true") | Some("1") | Some("yes")
        );
        Ok(Self { sizes, split })
    }

    fn base(&self) -> usize {
        self.sizes[0]
    }
}

/// Parse `"4"` or `"4,8,16"`: positive, strictly ascending sizes.
pub fn parse_block_sizes(raw: &str) -> TranslateResult<Vec<usize>> {
    let invalid = |reason: &str| TranslateError::InvalidBlockSizes(raw.to_string(), reason.to_string());

    let mut sizes = Vec::new();
    for part in raw.split(',') {
        let size: usize = part
            .trim()
            .parse()
            .map_err(|_| invalid(&format!("{:?} is not a number", part.trim())))?;
        if size == 0 {
            return Err(invalid("sizes must be positive"));
        }
        if sizes.last().is_some_and(|&prev| prev >= size) {
            return Err(invalid("sizes must be strictly ascending"));
        }
        sizes.push(size);
    }
    Ok(sizes)
}

fn block_label<'a>(key: &'a str, block: &'a Vertex) -> &'a str {
    if block.id.is_empty() { key } else { &block.id }
}

/// Blocks in order of first appearance of a member in a depth-first walk
/// of the tree; blocks with no member in the tree follow in key order.
fn ordered_blocks<'a>(blocks: &'a Vertex, tree: Option<&Vertex>) -> Vec<(&'a String, &'a Vertex)> {
    let sorted = blocks.sorted_children();
    let mut owner: HashMap<&str, usize> = HashMap::new();
    for (idx, (_, block)) in sorted.iter().enumerate() {
        for member in block.vertices.values() {
            owner.entry(member.id.as_str()).or_insert(idx);
        }
    }

    let mut order = Vec::with_capacity(sorted.len());
    let mut seen = HashSet::new();
    if let Some(tree) = tree {
        for leaf in tree.leaves() {
            if let Some(&idx) = owner.get(leaf.id.as_str()) {
                if seen.insert(idx) {
                    order.push(idx);
                }
            }
        }
    }
    order.extend((0..sorted.len()).filter(|idx| !seen.contains(idx)));
    order.into_iter().map(|idx| sorted[idx]).collect()
}

fn write_blocks<W: Write>(
    wr: &mut W,
    blocks: &Vertex,
    tree: Option<&Vertex>,
    opts: &BlockOptions,
) -> TranslateResult<()> {
    for (key, block) in ordered_blocks(blocks, tree) {
        let label = block_label(key, block);
        if opts.split && block.vertices.len() > opts.base() {
            let parts = partition(block, tree, opts.base());
            debug!(block = %label, parts = parts.len(), cap = opts.base(), "splitting oversized block");
            for (i, names) in parts.iter().enumerate() {
                writeln!(wr, "BlockName={label}-{} Nodes={}", i + 1, compress(names).join(","))?;
            }
        } else {
            let names = block.vertices.values().map(Vertex::display_name);
            writeln!(wr, "BlockName={label} Nodes={}", compress(names).join(","))?;
        }
    }

    let sizes: Vec<String> = opts.sizes.iter().map(usize::to_string).collect();
    writeln!(wr, "BlockSizes={}", sizes.join(","))?;
    Ok(())
}

/// Greedy depth-first packing of one domain into blocks of at most `cap`.
struct Packer<'a> {
    cap: usize,
    /// Member instance ID → node name.
    members: HashMap<&'a str, &'a str>,
    placed: HashSet<&'a str>,
    current: Vec<&'a str>,
    chunks: Vec<Vec<&'a str>>,
}

impl<'a> Packer<'a> {
    fn push(&mut self, name: &'a str) {
        self.current.push(name);
        if self.current.len() >= self.cap {
            self.close();
        }
    }

    fn close(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
        }
    }

    fn pending(&self, v: &Vertex) -> usize {
        if v.is_leaf() {
            usize::from(self.members.contains_key(v.id.as_str()) && !self.placed.contains(v.id.as_str()))
        } else {
            v.vertices.values().map(|c| self.pending(c)).sum()
        }
    }

    fn visit(&mut self, v: &Vertex) {
        if v.is_leaf() {
            if let Some((&id, &name)) = self.members.get_key_value(v.id.as_str()) {
                if self.placed.insert(id) {
                    self.push(name);
                }
            }
            return;
        }

        let pending = self.pending(v);
        if pending == 0 {
            return;
        }
        // Keep a sub-switch whole when it fits in a fresh block.
        if pending <= self.cap && self.current.len() + pending > self.cap {
            self.close();
        }
        for (_, child) in v.sorted_children() {
            self.visit(child);
        }
    }
}

fn partition<'a>(block: &'a Vertex, tree: Option<&Vertex>, cap: usize) -> Vec<Vec<&'a str>> {
    let mut packer = Packer {
        cap,
        members: block
            .vertices
            .values()
            .map(|v| (v.id.as_str(), v.display_name()))
            .collect(),
        placed: HashSet::new(),
        current: Vec::new(),
        chunks: Vec::new(),
    };

    if let Some(tree) = tree {
        packer.visit(tree);
    }

    let mut rest: Vec<&'a str> = packer
        .members
        .iter()
        .filter(|(id, _)| !packer.placed.contains(*id))
        .map(|(_, &name)| name)
        .collect();
    rest.sort_unstable();
    for name in rest {
        packer.push(name);
    }
    packer.close();
    packer.chunks
}
