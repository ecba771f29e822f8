//! The agent bound to one world session.

use std::sync::Arc;

use harvestbot_config::AppConfig;
use harvestbot_core::{AgentContext, Session};

/// Shared context + configuration + the current session.
///
/// Cheap to clone; every spawned task gets its own copy.
#[derive(Debug, Clone)]
pub struct Harvester {
    pub ctx: Arc<AgentContext>,
    pub config: Arc<AppConfig>,
    pub session: Session,
}

impl Harvester {
    pub fn new(ctx: Arc<AgentContext>, config: Arc<AppConfig>, session: Session) -> Self {
        Self {
            ctx,
            config,
            session,
        }
    }

    /// Report to the operator over the session's chat channel.
    pub async fn say(&self, text: impl AsRef<str>) {
        self.session.say(text.as_ref()).await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use harvestbot_sandbox::SandboxWorld;

    /// A harvester on a fresh sandbox session with default configuration.
    pub fn harvester(world: SandboxWorld) -> (Harvester, Arc<SandboxWorld>) {
        harvester_with(world, AppConfig::default())
    }

    pub fn harvester_with(world: SandboxWorld, config: AppConfig) -> (Harvester, Arc<SandboxWorld>) {
        let world = Arc::new(world);
        let ctx = Arc::new(AgentContext::new(config.harvest.initial_control_state()));
        let session = Session::from_backend(world.clone());
        (Harvester::new(ctx, Arc::new(config), session), world)
    }
}
