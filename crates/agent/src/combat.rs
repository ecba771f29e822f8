//! Retaliation against nearby entities that take damage.
//!
//! Reacts whether or not the control loop is paused.

use harvestbot_core::{EntityRef, Session};
use tracing::{debug, info};

use crate::context::Harvester;

/// React to `entity` being hurt. Strikes immediately and once more after the
/// configured follow-up delay, without waiting for either. Returns whether
/// an attack was launched.
pub async fn on_entity_hurt(harvester: &Harvester, entity: &EntityRef) -> bool {
    let config = &harvester.config.combat;
    if !config.enabled {
        return false;
    }

    let session = &harvester.session;
    if entity.id == session.body.entity_id() {
        return false;
    }

    let Some(their_position) = entity.position else {
        debug!(entity = %entity.name, "Hurt entity has no position");
        return false;
    };
    let distance = match session.body.position().await {
        Ok(own) => own.distance_to(&their_position),
        Err(e) => {
            debug!(error = %e, "Position unavailable; not reacting");
            return false;
        }
    };
    if distance >= config.reach {
        return false;
    }

    info!(entity = %entity.name, id = entity.id, distance, "Attacking");
    strike(session, entity.id).await;

    let session = session.clone();
    let follow_up = config.follow_up();
    let id = entity.id;
    tokio::spawn(async move {
        tokio::time::sleep(follow_up).await;
        strike(&session, id).await;
    });
    true
}

async fn strike(session: &Session, entity_id: u64) {
    if let Err(e) = session.body.attack(entity_id).await {
        debug!(entity_id, error = %e, "Attack failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::harvester;
    use harvestbot_core::Vec3;
    use harvestbot_sandbox::SandboxWorld;
    use std::time::Duration;

    fn zombie(id: u64, position: Vec3) -> EntityRef {
        EntityRef {
            id,
            name: "zombie".into(),
            position: Some(position),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn strikes_twice_when_in_reach() {
        let (h, world) = harvester(SandboxWorld::new().at(Vec3::new(0.0, 64.0, 0.0)));
        assert!(on_entity_hurt(&h, &zombie(42, Vec3::new(3.0, 64.0, 0.0))).await);
        assert_eq!(world.attacks(), vec![42]);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(world.attacks(), vec![42, 42]);
    }

    #[tokio::test(start_paused = true)]
    async fn ignores_self_and_distant_entities() {
        let (h, world) = harvester(SandboxWorld::new().at(Vec3::new(0.0, 64.0, 0.0)));
        assert!(!on_entity_hurt(&h, &zombie(1, Vec3::new(1.0, 64.0, 0.0))).await);
        assert!(!on_entity_hurt(&h, &zombie(42, Vec3::new(5.0, 64.0, 0.0))).await);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(world.attacks().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reacts_while_paused() {
        let (h, world) = harvester(SandboxWorld::new().at(Vec3::new(0.0, 64.0, 0.0)));
        h.ctx.update(|s| s.active = false).await;
        assert!(on_entity_hurt(&h, &zombie(7, Vec3::new(0.0, 64.0, 2.0))).await);
        assert_eq!(world.attacks(), vec![7]);
    }
}
