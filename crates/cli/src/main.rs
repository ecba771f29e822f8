//! harvestbot CLI: the main entry point.
//!
//! Commands:
//! - `run`      Run the agent against an in-process sandbox world
//! - `status`   Show configuration
//! - `onboard`  Write a default config file

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "harvestbot",
    about = "harvestbot: autonomous resource-gathering agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent in a generated sandbox world; stdin lines are chat
    Run {
        /// Override the configured target block kind
        #[arg(short, long)]
        target: Option<String>,

        /// Terrain seed
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Trees to scatter
        #[arg(long, default_value_t = 30)]
        trees: usize,
    },

    /// Show configuration
    Status,

    /// Write a default config file
    Onboard,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Run {
            target,
            seed,
            trees,
        } => commands::run::run(target, seed, trees).await?,
        Commands::Status => commands::status::run().await?,
        Commands::Onboard => commands::onboard::run().await?,
    }

    Ok(())
}
