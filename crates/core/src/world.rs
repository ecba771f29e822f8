//! World-facing types and the traits external services implement.
//!
//! The agent never talks to a game connection directly. A backend (a live
//! session, or the in-process sandbox) implements these traits and hands
//! the agent a [`Session`] bundling them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{BlockCategory, ItemCategory};
use crate::channel::ChatChannel;
use crate::error::{NavigationError, WorldError};
use crate::event::EventQueue;
use crate::geometry::Vec3;

/// A block as reported by the world at lookup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub name: String,
    pub position: Vec3,
    /// Whether the agent is able to break it at all
    pub diggable: bool,
}

impl Block {
    pub fn category(&self) -> BlockCategory {
        BlockCategory::of(&self.name)
    }

    pub fn is_air(&self) -> bool {
        self.category() == BlockCategory::Air
    }
}

/// One inventory slot's worth of an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub slot: u32,
    pub name: String,
    pub count: u32,
}

impl ItemStack {
    pub fn category(&self) -> ItemCategory {
        ItemCategory::of(&self.name)
    }
}

/// Health and hunger, sampled at use time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// 0..=20
    pub health: f32,
    /// 0..=20
    pub food: u32,
}

/// Where to travel and how close counts as arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationGoal {
    pub target: Vec3,
    /// Acceptance radius around `target`
    pub range: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl NavigationGoal {
    pub fn near(target: Vec3, range: f64) -> Self {
        Self {
            target,
            range,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Movement rules handed to the navigation engine with every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementConfig {
    pub can_dig: bool,
    pub allow_towers: bool,
    pub allow_parkour: bool,
    pub allow_sprinting: bool,
    /// Item names the engine may place to bridge or climb
    pub scaffolding: Vec<String>,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            can_dig: true,
            allow_towers: true,
            allow_parkour: true,
            allow_sprinting: true,
            scaffolding: vec![],
        }
    }
}

/// Block lookups.
#[async_trait]
pub trait WorldQuery: Send + Sync {
    /// The block nearest to the agent that satisfies `matching`, searching
    /// no further than `max_distance`.
    async fn find_block(
        &self,
        matching: &(dyn for<'b> Fn(&'b Block) -> bool + Send + Sync),
        max_distance: f64,
    ) -> std::result::Result<Option<Block>, WorldError>;

    /// The block occupying `position`, if the world has it loaded.
    async fn block_at(&self, position: Vec3) -> std::result::Result<Option<Block>, WorldError>;
}

/// The pathfinding engine. The search itself is the backend's business.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Travel toward `goal`, resolving once arrived or once the engine gives up.
    /// Never partially completes silently.
    async fn goto(
        &self,
        goal: &NavigationGoal,
        movements: &MovementConfig,
    ) -> std::result::Result<(), NavigationError>;

    /// Start travelling toward `goal` without waiting for the outcome.
    fn set_goal(&self, goal: NavigationGoal);
}

/// The agent's own inventory and hands.
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn items(&self) -> std::result::Result<Vec<ItemStack>, WorldError>;

    /// Move `item` into the active hand.
    async fn equip(&self, item: &ItemStack) -> std::result::Result<(), WorldError>;

    /// Use the held item (eat, for food).
    async fn activate_item(&self) -> std::result::Result<(), WorldError>;

    /// Place the held block against `reference` on the side given by `face`.
    async fn place_block(&self, reference: Vec3, face: Vec3)
    -> std::result::Result<(), WorldError>;
}

/// An open container window.
#[async_trait]
pub trait ContainerHandle: Send + Sync {
    /// Move a whole stack from the inventory into the container.
    async fn deposit(&self, item: &ItemStack) -> std::result::Result<(), WorldError>;

    async fn close(&self) -> std::result::Result<(), WorldError>;
}

#[async_trait]
pub trait ContainerService: Send + Sync {
    async fn open_container(
        &self,
        position: Vec3,
    ) -> std::result::Result<Box<dyn ContainerHandle>, WorldError>;

    /// Close whatever window is currently open (one opened by a player, say).
    async fn close_window(&self) -> std::result::Result<(), WorldError>;
}

/// The agent's avatar: vitals, position, and the actions it performs on the world.
#[async_trait]
pub trait Body: Send + Sync {
    /// The agent's own entity id, used to ignore self-damage.
    fn entity_id(&self) -> u64;

    async fn vitals(&self) -> std::result::Result<Vitals, WorldError>;

    async fn position(&self) -> std::result::Result<Vec3, WorldError>;

    /// Break `block` with whatever is in hand.
    async fn dig(&self, block: &Block) -> std::result::Result<(), WorldError>;

    async fn attack(&self, entity_id: u64) -> std::result::Result<(), WorldError>;

    /// Last known position of a connected player.
    async fn player_position(&self, username: &str)
    -> std::result::Result<Option<Vec3>, WorldError>;
}

/// One connected world session: every external service the agent uses.
#[derive(Clone)]
pub struct Session {
    pub id: Uuid,
    pub query: Arc<dyn WorldQuery>,
    pub navigator: Arc<dyn Navigator>,
    pub inventory: Arc<dyn Inventory>,
    pub containers: Arc<dyn ContainerService>,
    pub body: Arc<dyn Body>,
    pub chat: Arc<dyn ChatChannel>,
}

impl Session {
    /// Build a session from a backend that implements every service.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: WorldQuery + Navigator + Inventory + ContainerService + Body + ChatChannel + 'static,
    {
        Self {
            id: Uuid::new_v4(),
            query: backend.clone(),
            navigator: backend.clone(),
            inventory: backend.clone(),
            containers: backend.clone(),
            body: backend.clone(),
            chat: backend,
        }
    }

    /// Report to the operator. Delivery failures are logged, never raised.
    pub async fn say(&self, text: &str) {
        if let Err(e) = self.chat.send(text).await {
            tracing::warn!(session = %self.id, error = %e, "Chat delivery failed");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

/// Opens world sessions. Called again after every disconnect.
#[async_trait]
pub trait SessionConnector: Send + Sync {
    async fn connect(&self) -> std::result::Result<(Session, EventQueue), WorldError>;
}
