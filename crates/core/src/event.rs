//! Inbound world events: the single queue every reactive handler reads from.
//!
//! A world backend pushes typed events onto an [`EventSender`]; the agent's
//! router drains the matching [`EventQueue`] and fans each event out to the
//! command dispatcher, the combat reactor or the container watch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::geometry::Vec3;

/// Receiving half of a session's event queue.
pub type EventQueue = mpsc::Receiver<WorldEvent>;

/// Sending half of a session's event queue.
pub type EventSender = mpsc::Sender<WorldEvent>;

/// Create a bounded event queue.
pub fn event_queue(capacity: usize) -> (EventSender, EventQueue) {
    mpsc::channel(capacity)
}

/// An entity as seen in an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: u64,
    pub name: String,
    /// Unknown when the entity is outside the tracked range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

/// All inbound events a session emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Someone said something in chat
    Chat {
        issuer: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// An entity (possibly the agent) took damage
    EntityHurt {
        entity: EntityRef,
        timestamp: DateTime<Utc>,
    },

    /// A container window opened for the agent
    ContainerOpened {
        window_kind: String,
        timestamp: DateTime<Utc>,
    },

    /// The session ended; nothing further will arrive on this queue
    Disconnected {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorldEvent {
    pub fn chat(issuer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Chat {
            issuer: issuer.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn entity_hurt(entity: EntityRef) -> Self {
        Self::EntityHurt {
            entity,
            timestamp: Utc::now(),
        }
    }

    pub fn container_opened(window_kind: impl Into<String>) -> Self {
        Self::ContainerOpened {
            window_kind: window_kind.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn disconnected(reason: impl Into<String>) -> Self {
        Self::Disconnected {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_preserves_order() {
        let (tx, mut rx) = event_queue(8);
        tx.send(WorldEvent::chat("alex", "?pause")).await.unwrap();
        tx.send(WorldEvent::chat("alex", "?resume")).await.unwrap();

        match rx.recv().await.unwrap() {
            WorldEvent::Chat { message, .. } => assert_eq!(message, "?pause"),
            other => panic!("Expected Chat event, got {other:?}"),
        }
        match rx.recv().await.unwrap() {
            WorldEvent::Chat { message, .. } => assert_eq!(message, "?resume"),
            other => panic!("Expected Chat event, got {other:?}"),
        }
    }

    #[test]
    fn events_serialize() {
        let event = WorldEvent::entity_hurt(EntityRef {
            id: 7,
            name: "zombie".into(),
            position: Some(Vec3::new(1.0, 64.0, 1.0)),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("EntityHurt"));
        assert!(json.contains("zombie"));
    }
}
