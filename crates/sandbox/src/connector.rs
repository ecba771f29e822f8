//! Session connector for the sandbox.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use harvestbot_core::{EventQueue, Session, SessionConnector, WorldError, event_queue};
use tracing::info;

use crate::world::SandboxWorld;

const EVENT_QUEUE_CAPACITY: usize = 256;

/// Connects to one shared [`SandboxWorld`]. The world outlives sessions, so
/// a reconnect finds everything where the last session left it.
pub struct SandboxConnector {
    world: Arc<SandboxWorld>,
    refuse_connects: AtomicU32,
    connects: AtomicU32,
}

impl SandboxConnector {
    pub fn new(world: Arc<SandboxWorld>) -> Self {
        Self {
            world,
            refuse_connects: AtomicU32::new(0),
            connects: AtomicU32::new(0),
        }
    }

    pub fn world(&self) -> &Arc<SandboxWorld> {
        &self.world
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next_connects(&self, n: u32) {
        self.refuse_connects.store(n, Ordering::SeqCst);
    }

    /// Successful connections so far.
    pub fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionConnector for SandboxConnector {
    async fn connect(&self) -> Result<(Session, EventQueue), WorldError> {
        let refused = self
            .refuse_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(WorldError::SessionLost("connection refused".into()));
        }

        let (tx, rx) = event_queue(EVENT_QUEUE_CAPACITY);
        self.world.attach_events(tx);
        let session = Session::from_backend(self.world.clone());
        let n = self.connects.fetch_add(1, Ordering::SeqCst) + 1;
        info!(session = %session.id, connects = n, "Sandbox session opened");
        Ok((session, rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvestbot_core::WorldEvent;

    #[tokio::test]
    async fn refused_then_connected() {
        let connector = SandboxConnector::new(Arc::new(SandboxWorld::new()));
        connector.refuse_next_connects(1);
        assert!(connector.connect().await.is_err());

        let (_session, mut events) = connector.connect().await.unwrap();
        assert_eq!(connector.connects(), 1);

        connector.world().emit(WorldEvent::chat("alex", "hi"));
        assert!(matches!(events.recv().await, Some(WorldEvent::Chat { .. })));
    }

    #[tokio::test]
    async fn disconnect_closes_queue() {
        let connector = SandboxConnector::new(Arc::new(SandboxWorld::new()));
        let (_session, mut events) = connector.connect().await.unwrap();
        connector.world().disconnect("kicked");
        assert!(matches!(
            events.recv().await,
            Some(WorldEvent::Disconnected { .. })
        ));
        assert!(events.recv().await.is_none());
    }
}
