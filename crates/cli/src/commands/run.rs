//! `harvestbot run`: Run the agent against a sandbox world.
//!
//! Lines typed on stdin arrive in the world as chat from the `console`
//! player, so `?pause`, `?stats`, `?dropoff` and the rest work as they
//! would in game. `exit` or Ctrl-C stops.

use std::sync::Arc;

use harvestbot_agent::Supervisor;
use harvestbot_config::AppConfig;
use harvestbot_core::{AgentContext, Vec3, WorldEvent};
use harvestbot_sandbox::generate::{TerrainOptions, generate};
use harvestbot_sandbox::{SandboxConnector, SandboxWorld};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// The operator's name in the sandbox.
const CONSOLE_PLAYER: &str = "console";

pub async fn run(
    target: Option<String>,
    seed: u64,
    trees: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(target) = target {
        config.harvest.target_kind = target;
        config
            .validate()
            .map_err(|e| format!("Invalid target: {e}"))?;
    }

    let options = TerrainOptions {
        seed,
        trees,
        ..TerrainOptions::default()
    };
    let world = Arc::new(
        generate(&options)
            .with_chat_echo()
            .with_player(CONSOLE_PLAYER, Vec3::new(0.5, 64.0, 0.5)),
    );

    println!("⛏️  harvestbot sandbox run");
    println!("   Seed:    {seed} ({} blocks)", world.block_count());
    println!("   Target:  {}", config.harvest.target_kind);
    println!(
        "   Type {}help for commands, `exit` to stop.\n",
        config.harvest.command_prefix
    );

    let ctx = Arc::new(AgentContext::new(config.harvest.initial_control_state()));
    let connector = Arc::new(SandboxConnector::new(world.clone()));
    let supervisor = Supervisor::new(connector, ctx.clone(), Arc::new(config));

    tokio::select! {
        _ = supervisor.run() => {}
        _ = pump_stdin(world) => info!("Console closed"),
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    let state = ctx.snapshot().await;
    println!(
        "\n📊 Harvested {} blocks ({} since last deposit)",
        state.total_harvested, state.session_count
    );
    Ok(())
}

/// Forward stdin lines into the world as console chat until EOF or `exit`.
async fn pump_stdin(world: Arc<SandboxWorld>) {
    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "exit" | "quit") {
                    break;
                }
                if !world.emit(WorldEvent::chat(CONSOLE_PLAYER, line)) {
                    warn!("No session is listening; message dropped");
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
}
