//! The autonomous resource loop.
//!
//! A [`Harvester`] binds the shared [`AgentContext`](harvestbot_core::AgentContext)
//! and configuration to one live world session. Every component below takes
//! one and runs as its own task:
//!
//! 1. **Control loop**: search, travel, harvest, replant, offload, repeat
//! 2. **Vitals monitor**: periodic feeding independent of the loop
//! 3. **Event router**: operator commands, combat reactions, container opens
//! 4. **Stats reporter**: periodic progress log
//!
//! The [`Supervisor`] owns the session lifecycle and restarts all of them
//! after a disconnect. Control state and chest memory survive reconnects.

pub mod chest;
pub mod combat;
pub mod commands;
pub mod context;
pub mod control_loop;
pub mod equipment;
pub mod feeding;
pub mod navigation;
pub mod router;
pub mod stats;
pub mod supervisor;
pub mod vitals;

pub use chest::DepositReport;
pub use commands::{Command, CommandDispatcher, CommandEvent, Dispatch};
pub use context::Harvester;
pub use control_loop::{ControlLoop, CycleOutcome};
pub use feeding::FeedOutcome;
pub use navigation::{ApproachRadius, Arrival, RetryPolicy};
pub use router::EventRouter;
pub use supervisor::Supervisor;
