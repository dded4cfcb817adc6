pub mod gcp;
pub mod generate;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, ValueEnum};
use topograph_core::{ComputeInstances, Vertex};
use topograph_metrics::{TopologyMetrics, render_prometheus};
use topograph_provider::EngineOptions;

use crate::config::TopographConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Scheduler topology config
    #[default]
    Text,
    /// The placement graph as JSON
    Json,
}

/// Flags shared by every generating command. Set flags win over the config
/// file.
#[derive(Debug, Clone, Default, Args)]
pub struct OutputArgs {
    /// JSON file with the instance → node map (list of {region, instances})
    #[arg(short, long)]
    pub nodes: Option<PathBuf>,
    /// Output plugin: topology/tree or topology/block
    #[arg(long)]
    pub plugin: Option<String>,
    /// Comma-separated ascending block sizes, e.g. 2,4
    #[arg(long)]
    pub block_sizes: Option<String>,
    /// Split blocks larger than the base block size
    #[arg(long)]
    pub block_split: bool,
    /// Rename switches to switch.<band>.<n>
    #[arg(long)]
    pub normalize: bool,
    /// Collector timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Dump Prometheus metrics to this file after the run
    #[arg(long)]
    pub metrics: Option<PathBuf>,
}

impl OutputArgs {
    pub fn engine_options(&self, config: &TopographConfig) -> anyhow::Result<EngineOptions> {
        let mut opts = config.engine_options();
        if let Some(plugin) = &self.plugin {
            opts.plugin = Some(plugin.clone());
        }
        if let Some(raw) = &self.block_sizes {
            opts.block_sizes = Some(topograph_translate::parse_block_sizes(raw)?);
        }
        opts.block_split |= self.block_split;
        opts.normalize |= self.normalize;
        if let Some(secs) = self.timeout_secs {
            opts.timeout = Some(std::time::Duration::from_secs(secs));
        }
        Ok(opts)
    }

    /// The node map file, or every instance mapped to itself.
    pub fn compute_instances<'a>(
        &self,
        instance_ids: impl IntoIterator<Item = &'a str>,
    ) -> anyhow::Result<Vec<ComputeInstances>> {
        match &self.nodes {
            Some(path) => read_json(path),
            None => {
                let ci = instance_ids
                    .into_iter()
                    .fold(ComputeInstances::new(""), |ci, id| ci.with_instance(id, id));
                Ok(vec![ci])
            }
        }
    }

    /// Render `root` and write it (and the metrics dump) where requested.
    pub fn emit(&self, root: &Vertex, metrics: &TopologyMetrics) -> anyhow::Result<()> {
        let rendered = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(root)? + "\n",
            OutputFormat::Text => {
                let mut buf = Vec::new();
                topograph_translate::write_with_metrics(&mut buf, root, metrics)?;
                String::from_utf8(buf)?
            }
        };

        match &self.output {
            Some(path) => {
                std::fs::write(path, &rendered)
                    .with_context(|| format!("writing {}", path.display()))?;
                println!("✓ Wrote {}", path.display());
            }
            None => print!("{rendered}"),
        }

        if let Some(path) = &self.metrics {
            std::fs::write(path, render_prometheus(&metrics.snapshot()))
                .with_context(|| format!("writing {}", path.display()))?;
        }
        Ok(())
    }
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}
