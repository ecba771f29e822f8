//! # harvestbot Core
//!
//! Domain types, service traits, and error definitions for the harvestbot
//! resource-gathering agent. This crate has **no world backend**. It defines
//! the domain model that the agent is written against and that world
//! backends (the sandbox, a live game session) implement.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here: block queries, navigation,
//! inventory, containers, chat, and the agent's own body. Implementations
//! live in their respective crates. This enables:
//! - Running the agent against an in-process sandbox in tests
//! - Reconnecting a session without losing process-wide state
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod catalog;
pub mod channel;
pub mod error;
pub mod event;
pub mod geometry;
pub mod world;

// Re-export key types at crate root for ergonomics
pub use agent::{AgentContext, ChestMemory, ControlState, DEFAULT_TARGET_KIND, MIN_HEALTH_FLOOR};
pub use catalog::{BlockCategory, ItemCategory, ToolKind, ToolTier, is_container_window, matches_kind};
pub use channel::ChatChannel;
pub use error::{ChestError, Error, NavigationError, Result, WorldError};
pub use event::{EntityRef, EventQueue, EventSender, WorldEvent, event_queue};
pub use geometry::Vec3;
pub use world::{
    Block, Body, ContainerHandle, ContainerService, Inventory, ItemStack, MovementConfig,
    NavigationGoal, Navigator, Session, SessionConnector, Vitals, WorldQuery,
};
