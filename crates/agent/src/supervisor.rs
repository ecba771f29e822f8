//! Session lifecycle: connect, run every component, reconnect on loss.

use std::sync::Arc;

use harvestbot_config::AppConfig;
use harvestbot_core::{AgentContext, SessionConnector, WorldError};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::context::Harvester;
use crate::control_loop::ControlLoop;
use crate::router::EventRouter;
use crate::{stats, vitals};

/// Owns the connector and the process-wide context. Sessions come and go;
/// the context and everything in it persist across them.
pub struct Supervisor {
    connector: Arc<dyn SessionConnector>,
    ctx: Arc<AgentContext>,
    config: Arc<AppConfig>,
}

impl Supervisor {
    pub fn new(
        connector: Arc<dyn SessionConnector>,
        ctx: Arc<AgentContext>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            connector,
            ctx,
            config,
        }
    }

    pub fn context(&self) -> &Arc<AgentContext> {
        &self.ctx
    }

    /// Keep a session running forever, waiting the configured delay
    /// between a lost session (or a failed connect) and the next attempt.
    pub async fn run(&self) {
        let delay = self.config.session.reconnect_delay();
        loop {
            match self.run_session().await {
                Ok(reason) => {
                    warn!(%reason, delay_secs = delay.as_secs(), "Disconnected, reconnecting")
                }
                Err(e) => warn!(error = %e, delay_secs = delay.as_secs(), "Connect failed, retrying"),
            }
            tokio::time::sleep(delay).await;
        }
    }

    /// Connect once and run until the session ends. Returns the disconnect
    /// reason.
    pub async fn run_session(&self) -> Result<String, WorldError> {
        let (session, events) = self.connector.connect().await?;
        info!(
            session = %session.id,
            username = %self.config.connection.username,
            "Session started"
        );

        let harvester = Harvester::new(self.ctx.clone(), self.config.clone(), session);
        let mut tasks = JoinSet::new();
        tasks.spawn(ControlLoop::new(harvester.clone()).run());
        tasks.spawn(vitals::run(harvester.clone()));
        tasks.spawn(stats::run(harvester.clone()));

        let reason = EventRouter::new(harvester).run(events).await;

        tasks.shutdown().await;
        self.ctx.disarm_container_watch().await;
        Ok(reason)
    }
}
