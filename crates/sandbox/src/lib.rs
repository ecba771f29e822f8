//! An in-process world backend for harvestbot.
//!
//! [`SandboxWorld`] keeps a sparse block map, one avatar, an inventory and
//! any number of containers, and implements every service trait from
//! `harvestbot-core`. Travel is instantaneous; failures are scripted by the
//! caller. It is what the agent's tests run against and what the `run`
//! command drives when no live server backend is linked in.

pub mod connector;
pub mod generate;
pub mod world;

pub use connector::SandboxConnector;
pub use world::{SandboxWorld, TravelRecord};
