//! The control loop: the one long-lived driver task.
//!
//! Each cycle walks the same phases: check vitals, find the nearest block
//! of the target kind (or wander if there is none), equip a tool, travel,
//! harvest, maybe replant, maybe offload. Pausing only stops the next cycle
//! from starting; whatever the current one is doing runs to completion.

use std::time::Duration;

use harvestbot_core::{
    Block, BlockCategory, Error, NavigationGoal, Vec3, Vitals, matches_kind,
};
use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::chest;
use crate::context::Harvester;
use crate::equipment;
use crate::feeding;
use crate::navigation::{self, RetryPolicy};

/// Sleep per cycle while paused.
const IDLE_DELAY: Duration = Duration::from_secs(1);

/// Pause after emergency feeding.
const LOW_VITALS_PAUSE: Duration = Duration::from_secs(1);

/// Pause after a wander before searching again.
const WANDER_SETTLE: Duration = Duration::from_secs(2);

/// Pause between full cycles.
const CYCLE_DELAY: Duration = Duration::from_millis(500);

/// Pause after a cycle fails.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// How close a wander needs to get to its destination.
const WANDER_RANGE: f64 = 3.0;

/// How one cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Paused,
    /// Too hurt to work and configured not to push on
    Resting,
    /// Nothing of the target kind in range
    Wandered,
    /// Travel gave up; the target was abandoned
    Unreachable { target: Vec3 },
    Harvested { block: String, offloaded: bool },
}

pub struct ControlLoop {
    harvester: Harvester,
}

impl ControlLoop {
    pub fn new(harvester: Harvester) -> Self {
        Self { harvester }
    }

    /// Run cycles forever. A failed cycle is logged and retried after a
    /// short back-off; nothing stops the loop short of aborting its task.
    pub async fn run(self) {
        info!(session = %self.harvester.session.id, "Control loop started");
        loop {
            match self.cycle().await {
                Ok(outcome) => debug!(?outcome, "Cycle finished"),
                Err(e) => {
                    error!(error = %e, "Loop error");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }

    /// One pass through the phases.
    pub async fn cycle(&self) -> Result<CycleOutcome, Error> {
        let h = &self.harvester;
        let control = h.ctx.snapshot().await;
        if !control.active {
            tokio::time::sleep(IDLE_DELAY).await;
            return Ok(CycleOutcome::Paused);
        }

        // Seeking
        let vitals = h.session.body.vitals().await?;
        debug!(
            kind = %control.target_kind,
            health = vitals.health,
            food = vitals.food,
            "Looking for target"
        );
        if self.in_danger(&vitals, control.min_health) {
            warn!(
                health = vitals.health,
                food = vitals.food,
                "Low health/food; eating and continuing"
            );
            if let Err(e) = feeding::feed(&h.session, h.config.vitals.eat_settle()).await {
                warn!(error = %e, "Emergency feeding failed");
            }
            tokio::time::sleep(LOW_VITALS_PAUSE).await;

            if !h.config.harvest.keep_working_when_hurt {
                let health = h.session.body.vitals().await?.health;
                if health < control.min_health as f32 {
                    info!(health, "Resting until healthier");
                    return Ok(CycleOutcome::Resting);
                }
            }
        }

        let kind = control.target_kind;
        let found = h
            .session
            .query
            .find_block(
                &|b: &Block| matches_kind(&b.name, &kind),
                h.config.harvest.search_radius,
            )
            .await?;
        let Some(block) = found else {
            info!(%kind, radius = h.config.harvest.search_radius, "Nothing in range; wandering");
            self.wander(BlockCategory::of_kind(&kind)).await;
            tokio::time::sleep(WANDER_SETTLE).await;
            return Ok(CycleOutcome::Wandered);
        };

        // Approaching
        if let Err(e) = equipment::equip_for(h, &block).await {
            warn!(block = %block.name, error = %e, "Could not equip tool");
        }
        let policy = RetryPolicy::harvest(&h.config.navigation);
        if let Err(e) =
            navigation::travel_with_retry(&h.session, block.position, &policy, block.category())
                .await
        {
            info!(block = %block.name, at = %block.position, error = %e, "Skipping unreachable block");
            return Ok(CycleOutcome::Unreachable {
                target: block.position,
            });
        }

        // Harvesting
        h.session.body.dig(&block).await?;
        let (total, session_count, auto_replant) = h
            .ctx
            .update(|s| {
                s.record_harvest();
                (s.total_harvested, s.session_count, s.auto_replant)
            })
            .await;
        info!(block = %block.name, total, session = session_count, "Harvested");

        if auto_replant && block.category() == BlockCategory::Wood {
            equipment::replant(h, block.position).await;
        }

        // Offloading
        let carried = h.session.inventory.items().await?.len();
        let offloaded = session_count >= h.config.harvest.deposit_after
            || carried >= h.config.harvest.max_carried_stacks;
        if offloaded {
            info!(session = session_count, stacks = carried, "Offloading");
            if let Err(e) = chest::offload(h).await {
                warn!(error = %e, "Deposit failed");
            }
        }

        tokio::time::sleep(CYCLE_DELAY).await;
        Ok(CycleOutcome::Harvested {
            block: block.name,
            offloaded,
        })
    }

    fn in_danger(&self, vitals: &Vitals, min_health: u32) -> bool {
        vitals.health < min_health as f32
            || vitals.food < self.harvester.config.vitals.emergency_food_below
    }

    /// One travel toward a random nearby point. Failure is fine.
    async fn wander(&self, harvesting: BlockCategory) {
        let h = &self.harvester;
        let origin = match h.session.body.position().await {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "Position unavailable; not wandering");
                return;
            }
        };
        let destination = wander_target(origin, h.config.harvest.wander_radius, &mut rand::rng());
        let timeout = h.config.navigation.wander_timeout();
        let goal = NavigationGoal::near(destination, WANDER_RANGE).with_timeout(timeout);
        let movements = navigation::movements_for(&h.session, harvesting).await;

        match tokio::time::timeout(timeout, h.session.navigator.goto(&goal, &movements)).await {
            Ok(Ok(())) => debug!(%destination, "Wandered"),
            Ok(Err(e)) => debug!(%destination, error = %e, "Wander failed"),
            Err(_) => debug!(%destination, "Wander timed out"),
        }
    }
}

/// A point up to `radius` away from `origin` on each horizontal axis.
pub fn wander_target<R: Rng + ?Sized>(origin: Vec3, radius: f64, rng: &mut R) -> Vec3 {
    if radius <= 0.0 {
        return origin;
    }
    let dx = rng.random_range(-radius..=radius);
    let dz = rng.random_range(-radius..=radius);
    origin.offset(dx, 0.0, dz)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandDispatcher;
    use crate::context::test_support::{harvester, harvester_with};
    use harvestbot_config::AppConfig;
    use harvestbot_sandbox::SandboxWorld;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const LOG: Vec3 = Vec3::new(3.0, 64.0, 0.0);

    fn forest() -> SandboxWorld {
        SandboxWorld::new()
            .at(Vec3::new(0.0, 64.0, 0.0))
            .with_block(LOG, "oak_log")
            .with_item("stone_axe", 1)
    }

    #[test]
    fn wander_stays_within_radius() {
        let mut rng = StdRng::seed_from_u64(11);
        let origin = Vec3::new(100.0, 70.0, -20.0);
        for _ in 0..1000 {
            let p = wander_target(origin, 40.0, &mut rng);
            assert!((p.x - origin.x).abs() <= 40.0);
            assert!((p.z - origin.z).abs() <= 40.0);
            assert_eq!(p.y, origin.y);
        }
        assert_eq!(wander_target(origin, 0.0, &mut rng), origin);
    }

    #[tokio::test(start_paused = true)]
    async fn paused_loop_touches_nothing() {
        let (h, world) = harvester(forest());
        h.ctx.update(|s| s.active = false).await;

        let outcome = ControlLoop::new(h).cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Paused);
        assert!(world.travel_log().is_empty());
        assert!(world.digs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn harvests_nearest_target() {
        let (h, world) = harvester(forest());

        let outcome = ControlLoop::new(h.clone()).cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Harvested {
                block: "oak_log".into(),
                offloaded: false
            }
        );
        assert_eq!(world.digs(), vec![LOG]);
        assert_eq!(world.held_item().as_deref(), Some("stone_axe"));
        assert_eq!(world.travel_log()[0].goal.range, 1.0);
        let state = h.ctx.snapshot().await;
        assert_eq!((state.total_harvested, state.session_count), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn new_target_applies_to_next_search() {
        let ore = Vec3::new(6.0, 64.0, 0.0);
        let (h, world) = harvester(
            forest()
                .with_block(ore, "iron_ore")
                .with_item("stone_pickaxe", 1),
        );
        h.ctx.update(|s| s.session_count = 5).await;

        CommandDispatcher::new(h.clone())
            .dispatch("alex", "?target iron_ore")
            .await;
        assert_eq!(h.ctx.snapshot().await.session_count, 0);

        let outcome = ControlLoop::new(h).cycle().await.unwrap();

        assert!(matches!(outcome, CycleOutcome::Harvested { ref block, .. } if block == "iron_ore"));
        assert_eq!(world.digs(), vec![ore]);
        assert_eq!(world.held_item().as_deref(), Some("stone_pickaxe"));
    }

    #[tokio::test(start_paused = true)]
    async fn sixty_fourth_harvest_offloads() {
        let chest_at = Vec3::new(5.0, 64.0, 5.0);
        let (h, world) = harvester(forest().with_block(chest_at, "chest"));
        h.ctx.remember_chest(chest_at).await;
        h.ctx
            .update(|s| {
                s.session_count = 63;
                s.total_harvested = 63;
            })
            .await;

        let outcome = ControlLoop::new(h.clone()).cycle().await.unwrap();

        assert!(matches!(outcome, CycleOutcome::Harvested { offloaded: true, .. }));
        let state = h.ctx.snapshot().await;
        assert_eq!(state.session_count, 0);
        assert_eq!(state.total_harvested, 64);
        assert_eq!(world.container_contents(chest_at)[0].name, "oak_log");
        assert_eq!(world.inventory()[0].name, "stone_axe");
    }

    #[tokio::test(start_paused = true)]
    async fn full_inventory_offloads_even_without_chest() {
        let mut world = forest();
        for i in 0..34 {
            world = world.with_item(&format!("filler_{i}"), 1);
        }
        let (h, _world) = harvester(world);

        let outcome = ControlLoop::new(h.clone()).cycle().await.unwrap();

        assert!(matches!(outcome, CycleOutcome::Harvested { offloaded: true, .. }));
        assert_eq!(h.ctx.snapshot().await.session_count, 0);
        assert_eq!(h.ctx.snapshot().await.total_harvested, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_target_is_abandoned() {
        let (h, world) = harvester(forest());
        world.make_unreachable(LOG);
        let control = ControlLoop::new(h.clone());

        let outcome = control.cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Unreachable { target: LOG });
        assert_eq!(world.travel_log().len(), 20);
        assert!(world.digs().is_empty());
        assert_eq!(h.ctx.snapshot().await.total_harvested, 0);

        // the next pass starts over from Seeking
        assert!(control.cycle().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn wanders_when_nothing_in_range() {
        let (h, world) = harvester(SandboxWorld::new().at(Vec3::new(0.0, 64.0, 0.0)));

        let outcome = ControlLoop::new(h).cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Wandered);
        let travel = world.travel_log();
        assert_eq!(travel.len(), 1);
        assert_eq!(travel[0].goal.range, 3.0);
        assert_eq!(travel[0].goal.timeout, Some(Duration::from_secs(10)));
        assert!(travel[0].goal.target.x.abs() <= 40.0);
        assert!(travel[0].goal.target.z.abs() <= 40.0);
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_working_after_emergency_feeding() {
        let (h, world) = harvester(forest().with_item("bread", 3).with_vitals(1.0, 20));

        let outcome = ControlLoop::new(h).cycle().await.unwrap();

        assert!(matches!(outcome, CycleOutcome::Harvested { .. }));
        let bread = world.inventory().into_iter().find(|s| s.name == "bread").unwrap();
        assert_eq!(bread.count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rests_when_configured_to() {
        let mut config = AppConfig::default();
        config.harvest.keep_working_when_hurt = false;
        let (h, world) = harvester_with(forest().with_vitals(1.0, 20), config);

        let outcome = ControlLoop::new(h).cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Resting);
        assert!(world.digs().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn replants_logs_when_enabled() {
        let (h, world) = harvester(
            forest()
                .with_block(Vec3::new(3.0, 63.0, 0.0), "dirt")
                .with_item("birch_sapling", 1),
        );
        h.ctx.update(|s| s.auto_replant = true).await;

        ControlLoop::new(h).cycle().await.unwrap();

        assert_eq!(world.block_name_at(LOG), "birch_sapling");
    }

    #[tokio::test(start_paused = true)]
    async fn run_keeps_cycling() {
        let (h, world) = harvester(SandboxWorld::new().at(Vec3::new(0.0, 64.0, 0.0)));
        let task = tokio::spawn(ControlLoop::new(h).run());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!task.is_finished());
        assert!(world.travel_log().len() >= 3);
        task.abort();
    }
}
