use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;

use commands::OutputArgs;
use config::TopographConfig;

#[derive(Parser)]
#[command(
    name = "topograph",
    about = "Topograph — cluster network topology for workload schedulers",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to topograph.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a topology config from recorded placement records.
    ///
    /// The records file is JSON: {"instances": [{"instance_id", "block_id",
    /// "spine_id", "datacenter_id", "accelerator_id"}, ...]}.
    Generate {
        /// Records file
        #[arg(short, long)]
        records: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Generate a topology config from a recorded GCE inventory.
    Gcp {
        /// Inventory file: {"zones": {"<zone>": [<instance resource>, ...]}}
        #[arg(short, long)]
        inventory: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("topograph=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TopographConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Generate { records, output } => {
            commands::generate::generate(&records, &output, &config).await
        }
        Commands::Gcp { inventory, output } => {
            commands::gcp::gcp(&inventory, &output, &config).await
        }
    }
}
