//! OpenMIS Rust CLI - 命令行工具

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod check_cmd;
mod run_cmd;

#[derive(Parser)]
#[command(name = "openmis-rust")]
#[command(about = "Distributed maximal independent set over message-passing vertex agents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the distributed MIS protocol on a graph file
    Run {
        /// Path to the JSON graph description
        #[arg(short, long)]
        graph: String,
        /// Start vertex (default: first vertex of the file)
        #[arg(long)]
        start: Option<String>,
        /// Selection policy: uniform | first
        #[arg(long, default_value = "uniform")]
        policy: String,
        /// Seed for the uniform policy
        #[arg(long)]
        seed: Option<u64>,
        /// Per-agent inbox capacity
        #[arg(long, default_value = "64")]
        capacity: usize,
        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
    /// Validate a graph file without running the protocol
    Check {
        /// Path to the JSON graph description
        #[arg(short, long)]
        graph: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let default_filter = match &cli.command {
        Commands::Run { verbose: true, .. } => "openmis=debug,info",
        _ => "openmis=info,warn",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run {
            graph,
            start,
            policy,
            seed,
            capacity,
            json,
            verbose: _,
        } => {
            run_cmd::run(&graph, start, &policy, seed, capacity, json).await?;
        }
        Commands::Check { graph } => {
            check_cmd::run(&graph)?;
        }
    }

    Ok(())
}
