//! Operator chat commands.
//!
//! A chat line is a command when it starts with the configured prefix
//! (`?` by default). The rest is lowercased and split on whitespace: the
//! first word names the command, the others are its arguments.
//!
//! State changes are applied before [`CommandDispatcher::dispatch`]
//! returns, so commands from one operator take effect in the order they
//! were sent. Commands that drive the agent around the world (`dropoff`,
//! `setchest`, `feed`) run on their own task and the handle is returned.

use harvestbot_core::{DEFAULT_TARGET_KIND, NavigationGoal};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::chest;
use crate::context::Harvester;
use crate::feeding;

/// Distance `come` stops short of the operator.
const COME_RANGE: f64 = 2.0;

/// A parsed chat command, before it is resolved to a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub issuer: String,
    pub name: String,
    pub args: Vec<String>,
}

impl CommandEvent {
    /// Parse `message`. Returns `None` unless it starts with `prefix` and
    /// names something.
    pub fn parse(prefix: &str, issuer: &str, message: &str) -> Option<Self> {
        let body = message.strip_prefix(prefix)?.trim().to_lowercase();
        let mut words = body.split_whitespace().map(str::to_string);
        let name = words.next()?;
        Some(Self {
            issuer: issuer.to_string(),
            name,
            args: words.collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Target(String),
    Pause,
    Resume,
    Stats,
    Replant,
    Come,
    Chest,
    Feed,
    Yolo,
    Inv,
    Dropoff,
    SetChest,
    Help,
}

impl Command {
    /// Resolve a parsed event. Unknown names resolve to `None`.
    pub fn from_event(event: &CommandEvent) -> Option<Self> {
        let command = match event.name.as_str() {
            "target" => Self::Target(
                event
                    .args
                    .first()
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_TARGET_KIND.to_string()),
            ),
            "pause" => Self::Pause,
            "resume" => Self::Resume,
            "stats" => Self::Stats,
            "replant" => Self::Replant,
            "come" => Self::Come,
            "chest" => Self::Chest,
            "feed" => Self::Feed,
            "yolo" => Self::Yolo,
            "inv" => Self::Inv,
            "dropoff" | "deposit" => Self::Dropoff,
            "setchest" => Self::SetChest,
            "help" => Self::Help,
            _ => return None,
        };
        Some(command)
    }
}

/// What dispatching one message did.
#[derive(Debug)]
pub enum Dispatch {
    /// Not a command
    Ignored,
    Unknown(String),
    Applied(Command),
    /// Still running on its own task
    Spawned(Command, JoinHandle<()>),
}

/// Applies operator commands to the shared context and session.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    harvester: Harvester,
}

impl CommandDispatcher {
    pub fn new(harvester: Harvester) -> Self {
        Self { harvester }
    }

    pub async fn dispatch(&self, issuer: &str, message: &str) -> Dispatch {
        let prefix = &self.harvester.config.harvest.command_prefix;
        let Some(event) = CommandEvent::parse(prefix, issuer, message) else {
            return Dispatch::Ignored;
        };
        let Some(command) = Command::from_event(&event) else {
            debug!(issuer, command = %event.name, "Unknown command");
            return Dispatch::Unknown(event.name);
        };

        info!(issuer, ?command, "Command");
        self.execute(&event.issuer, command).await
    }

    async fn execute(&self, issuer: &str, command: Command) -> Dispatch {
        let h = &self.harvester;
        match &command {
            Command::Target(kind) => {
                let kind = h
                    .ctx
                    .update(|s| {
                        s.set_target(kind);
                        s.target_kind.clone()
                    })
                    .await;
                h.say(format!("🎯 Target: {kind}")).await;
            }
            Command::Pause => {
                h.ctx.update(|s| s.active = false).await;
                h.say("⏸️ Paused").await;
            }
            Command::Resume => {
                h.ctx.update(|s| s.active = true).await;
                h.say("▶️ Resumed").await;
            }
            Command::Stats => {
                let state = h.ctx.snapshot().await;
                h.say(format!(
                    "📊 Mined: {} | Inventory: {}/{}",
                    state.total_harvested, state.session_count, h.config.harvest.deposit_after
                ))
                .await;
            }
            Command::Replant => {
                let on = h
                    .ctx
                    .update(|s| {
                        s.auto_replant = !s.auto_replant;
                        s.auto_replant
                    })
                    .await;
                h.say(format!("🌱 Auto-replant: {}", if on { "ON" } else { "OFF" }))
                    .await;
            }
            Command::Come => match h.session.body.player_position(issuer).await {
                Ok(Some(position)) => {
                    h.session
                        .navigator
                        .set_goal(NavigationGoal::near(position, COME_RANGE));
                    h.say("🏃 Coming!").await;
                }
                Ok(None) => debug!(issuer, "Issuer not visible; not coming"),
                Err(e) => warn!(issuer, error = %e, "Player lookup failed"),
            },
            Command::Chest => {
                h.ctx.forget_chest().await;
                h.say("📦 Chest reset").await;
            }
            Command::Yolo => {
                h.ctx.update(|s| s.enable_yolo()).await;
                h.say("💀 YOLO MODE - ignoring health!").await;
            }
            Command::Inv => {
                match h.session.inventory.items().await {
                    Ok(items) => {
                        info!(stacks = items.len(), "Inventory");
                        for item in &items {
                            info!("  - {} x{}", item.name, item.count);
                        }
                    }
                    Err(e) => warn!(error = %e, "Inventory unavailable"),
                }
                h.say("Check console for inventory").await;
            }
            Command::Help => {
                let p = &h.config.harvest.command_prefix;
                h.say(format!(
                    "Commands: {p}target {p}pause {p}resume {p}stats {p}replant {p}come {p}chest {p}feed {p}yolo {p}inv {p}dropoff {p}setchest"
                ))
                .await;
            }
            Command::Feed => {
                let h = h.clone();
                let task = tokio::spawn(async move {
                    if let Err(e) = feeding::feed(&h.session, h.config.vitals.eat_settle()).await {
                        warn!(error = %e, "Feeding failed");
                    }
                    match h.session.body.vitals().await {
                        Ok(v) => h.say(format!("🍖 Food: {}/20 | HP: {}/20", v.food, v.health)).await,
                        Err(e) => warn!(error = %e, "Vitals unavailable"),
                    }
                });
                return Dispatch::Spawned(command, task);
            }
            Command::Dropoff => {
                h.say("🔍 Searching for nearest chest...").await;
                let h = h.clone();
                let task = tokio::spawn(async move {
                    if let Err(e) = chest::discover_and_offload(&h).await {
                        warn!(error = %e, "Dropoff failed");
                    }
                });
                return Dispatch::Spawned(command, task);
            }
            Command::SetChest => {
                let h = h.clone();
                let task = tokio::spawn(async move {
                    if let Err(e) = chest::watch_and_offload(&h, chest::WATCH_WINDOW).await {
                        warn!(error = %e, "Chest watch ended without a deposit");
                    }
                });
                return Dispatch::Spawned(command, task);
            }
        }
        Dispatch::Applied(command)
    }
}
