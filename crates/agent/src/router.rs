//! The single consumer of a session's event queue.
//!
//! Chat goes to the command dispatcher, damage to the combat reactor, and
//! container windows to whoever is watching for one. The router returns
//! when the session ends.

use harvestbot_core::{EventQueue, WorldEvent, is_container_window};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::combat;
use crate::commands::{CommandDispatcher, Dispatch};
use crate::context::Harvester;

pub struct EventRouter {
    harvester: Harvester,
    dispatcher: CommandDispatcher,
    /// Long-running commands still tied to this session.
    running: Vec<JoinHandle<()>>,
}

impl EventRouter {
    pub fn new(harvester: Harvester) -> Self {
        let dispatcher = CommandDispatcher::new(harvester.clone());
        Self {
            harvester,
            dispatcher,
            running: Vec::new(),
        }
    }

    /// Consume events until the session disconnects or the queue closes.
    /// Returns why the session ended.
    /// Commands still running when the session ends are aborted.
    pub async fn run(mut self, mut events: EventQueue) -> String {
        let mut reason = None;
        while let Some(event) = events.recv().await {
            reason = self.route(event).await;
            if reason.is_some() {
                break;
            }
        }
        self.abort_running();
        reason.unwrap_or_else(|| "event queue closed".into())
    }

    fn abort_running(&mut self) {
        for task in self.running.drain(..) {
            if !task.is_finished() {
                debug!("Aborting command left over from the session");
                task.abort();
            }
        }
    }

    /// Handle one event. Returns the disconnect reason if it ended the session.
    pub async fn route(&mut self, event: WorldEvent) -> Option<String> {
        match event {
            WorldEvent::Chat {
                issuer, message, ..
            } => {
                if issuer == self.harvester.config.connection.username {
                    return None;
                }
                match self.dispatcher.dispatch(&issuer, &message).await {
                    Dispatch::Spawned(command, task) => {
                        debug!(?command, "Command running");
                        self.running.retain(|t| !t.is_finished());
                        self.running.push(task);
                    }
                    Dispatch::Ignored | Dispatch::Unknown(_) | Dispatch::Applied(_) => {}
                }
            }
            WorldEvent::EntityHurt { entity, .. } => {
                combat::on_entity_hurt(&self.harvester, &entity).await;
            }
            WorldEvent::ContainerOpened { window_kind, .. } => {
                if !is_container_window(&window_kind) {
                    debug!(window = %window_kind, "Ignoring non-container window");
                } else if self.harvester.ctx.fire_container_watch(&window_kind).await {
                    debug!(window = %window_kind, "Container watch fired");
                }
            }
            WorldEvent::Disconnected { reason, .. } => {
                info!(%reason, "Session disconnected");
                return Some(reason);
            }
        }
        None
    }
}
