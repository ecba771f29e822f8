//! Travel with retries.
//!
//! Every "get next to that block" request goes through [`travel_with_retry`].
//! The three call sites differ only in their [`RetryPolicy`]: how close
//! counts as arrived, how long to back off, and whether the acceptance
//! radius widens as failures pile up.

use std::time::Duration;

use harvestbot_config::NavigationConfig;
use harvestbot_core::{
    BlockCategory, MovementConfig, NavigationError, NavigationGoal, Session, Vec3,
};
use tracing::{debug, info, warn};

/// How far ahead of the agent the obstacle probe looks.
const PROBE_DISTANCE: f64 = 2.0;

/// Pause after breaking an obstacle so the world settles.
const CLEAR_SETTLE: Duration = Duration::from_millis(500);

/// Acceptance radius per attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApproachRadius {
    Fixed(f64),
    /// `min(base + floor(attempt / every), max)`
    Escalating { base: f64, max: f64, every: u32 },
}

impl ApproachRadius {
    /// Radius for a 1-based attempt number.
    pub fn for_attempt(&self, attempt: u32) -> f64 {
        match *self {
            Self::Fixed(range) => range,
            Self::Escalating { base, max, every } => {
                let steps = attempt / every.max(1);
                (base + f64::from(steps)).min(max)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Back-off after a failed attempt
    pub delay: Duration,
    /// Clear obstacles before every attempt divisible by this
    pub clear_every: u32,
    pub radius: ApproachRadius,
}

impl RetryPolicy {
    /// Reaching a block to harvest it.
    pub fn harvest(config: &NavigationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.retry_delay(),
            clear_every: config.clear_every,
            radius: ApproachRadius::Fixed(1.0),
        }
    }

    /// Reaching a freshly discovered chest. Tolerates standing further off
    /// as failures accumulate.
    pub fn chest_discovery(config: &NavigationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.chest_retry_delay(),
            clear_every: config.clear_every,
            radius: ApproachRadius::Escalating {
                base: 2.0,
                max: 5.0,
                every: 5,
            },
        }
    }

    /// Reaching the remembered chest to deposit. Starts tighter than discovery.
    pub fn chest_deposit(config: &NavigationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.chest_retry_delay(),
            clear_every: config.clear_every,
            radius: ApproachRadius::Escalating {
                base: 1.0,
                max: 4.0,
                every: 5,
            },
        }
    }

    fn clears_before(&self, attempt: u32) -> bool {
        self.clear_every > 0 && attempt % self.clear_every == 0
    }
}

/// A successful travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    pub attempts: u32,
    pub range: f64,
}

/// Travel until within the policy's radius of `target`, or give up after
/// `max_attempts` with [`NavigationError::Unreachable`].
///
/// `harvesting` is the category of block being worked on; it decides which
/// carried blocks the engine may use as scaffolding.
pub async fn travel_with_retry(
    session: &Session,
    target: Vec3,
    policy: &RetryPolicy,
    harvesting: BlockCategory,
) -> Result<Arrival, NavigationError> {
    for attempt in 1..=policy.max_attempts {
        if policy.clears_before(attempt) {
            clear_path(session, target).await;
        }

        let movements = movements_for(session, harvesting).await;
        let range = policy.radius.for_attempt(attempt);
        let goal = NavigationGoal::near(target, range);

        match session.navigator.goto(&goal, &movements).await {
            Ok(()) => {
                debug!(%target, attempt, range, "Arrived");
                return Ok(Arrival { attempts: attempt, range });
            }
            Err(e) => {
                debug!(%target, attempt, range, error = %e, "Travel attempt failed");
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    warn!(%target, attempts = policy.max_attempts, "Giving up on travel");
    Err(NavigationError::Unreachable {
        attempts: policy.max_attempts,
    })
}

/// Movement rules with scaffolding recomputed from what is carried right now.
pub async fn movements_for(session: &Session, harvesting: BlockCategory) -> MovementConfig {
    let mut movements = MovementConfig::default();
    match session.inventory.items().await {
        Ok(items) => {
            for item in items {
                if item.category().is_scaffold(harvesting)
                    && !movements.scaffolding.contains(&item.name)
                {
                    movements.scaffolding.push(item.name);
                }
            }
        }
        Err(e) => debug!(error = %e, "Inventory unavailable; travelling without scaffolding"),
    }
    movements
}

/// Break the block directly ahead of the agent on the way to `target`, if
/// there is one and it can be broken. Returns whether anything was removed.
pub async fn clear_path(session: &Session, target: Vec3) -> bool {
    let position = match session.body.position().await {
        Ok(p) => p,
        Err(e) => {
            debug!(error = %e, "Position unavailable; skipping path clearing");
            return false;
        }
    };

    let heading = target.minus(&position).normalize();
    let probe = position.offset(heading.x * PROBE_DISTANCE, 0.0, heading.z * PROBE_DISTANCE);

    let obstacle = match session.query.block_at(probe).await {
        Ok(Some(block)) if !block.is_air() && block.diggable => block,
        Ok(_) => return false,
        Err(e) => {
            debug!(error = %e, %probe, "Probe lookup failed");
            return false;
        }
    };

    info!(block = %obstacle.name, at = %obstacle.position, "Clearing obstacle");
    match session.body.dig(&obstacle).await {
        Ok(()) => {
            tokio::time::sleep(CLEAR_SETTLE).await;
            true
        }
        Err(e) => {
            warn!(block = %obstacle.name, error = %e, "Could not clear obstacle");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvestbot_sandbox::SandboxWorld;
    use std::sync::Arc;

    fn session(world: SandboxWorld) -> (Session, Arc<SandboxWorld>) {
        let world = Arc::new(world);
        (Session::from_backend(world.clone()), world)
    }

    #[test]
    fn escalating_radius_steps_every_five_and_caps() {
        let discovery = RetryPolicy::chest_discovery(&NavigationConfig::default()).radius;
        let radii: Vec<f64> = [1, 4, 5, 9, 10, 15, 20, 25]
            .into_iter()
            .map(|a| discovery.for_attempt(a))
            .collect();
        assert_eq!(radii, vec![2.0, 2.0, 3.0, 3.0, 4.0, 5.0, 5.0, 5.0]);

        let deposit = RetryPolicy::chest_deposit(&NavigationConfig::default()).radius;
        assert_eq!(deposit.for_attempt(1), 1.0);
        assert_eq!(deposit.for_attempt(15), 4.0);
        assert_eq!(deposit.for_attempt(20), 4.0);
    }

    #[test]
    fn harvest_policy_is_tight() {
        let policy = RetryPolicy::harvest(&NavigationConfig::default());
        assert_eq!(policy.max_attempts, 20);
        assert_eq!(policy.delay, Duration::from_millis(200));
        assert_eq!(policy.radius.for_attempt(19), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let (session, world) = session(SandboxWorld::new());
        world.fail_next_travels(3);
        let policy = RetryPolicy::harvest(&NavigationConfig::default());

        let arrival = travel_with_retry(&session, Vec3::new(8.0, 64.0, 0.0), &policy, BlockCategory::Wood)
            .await
            .unwrap();

        assert_eq!(arrival.attempts, 4);
        assert_eq!(world.travel_log().len(), 4);
        assert_eq!(world.current_position(), Vec3::new(8.0, 64.0, 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts_and_clears_obstacles() {
        let (session, world) = session(
            SandboxWorld::new()
                .at(Vec3::new(0.0, 64.0, 0.0))
                .with_block(Vec3::new(2.0, 64.0, 0.0), "stone"),
        );
        let target = Vec3::new(10.0, 64.0, 0.0);
        world.make_unreachable(target);
        let policy = RetryPolicy::harvest(&NavigationConfig::default());

        let err = travel_with_retry(&session, target, &policy, BlockCategory::Wood)
            .await
            .unwrap_err();

        assert!(matches!(err, NavigationError::Unreachable { attempts: 20 }));
        assert_eq!(world.travel_log().len(), 20);
        assert_eq!(world.digs(), vec![Vec3::new(2.0, 64.0, 0.0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn deposit_policy_widens_acceptance_radius() {
        let (session, world) = session(SandboxWorld::new());
        let target = Vec3::new(5.0, 64.0, 5.0);
        world.fail_next_travels(14);
        let policy = RetryPolicy::chest_deposit(&NavigationConfig::default());

        travel_with_retry(&session, target, &policy, BlockCategory::Wood)
            .await
            .unwrap();

        let ranges: Vec<f64> = world.travel_log().iter().map(|t| t.goal.range).collect();
        assert_eq!(ranges.len(), 15);
        assert_eq!(ranges[0], 1.0);
        assert_eq!(ranges[4], 2.0);
        assert_eq!(ranges[14], 4.0);
    }

    #[tokio::test]
    async fn scaffolding_tracks_carried_blocks() {
        let (session, world) = session(
            SandboxWorld::new()
                .with_item("dirt", 16)
                .with_item("cobblestone", 4)
                .with_item("oak_log", 3)
                .with_item("bread", 2),
        );

        let for_stone = movements_for(&session, BlockCategory::Stone).await;
        assert_eq!(for_stone.scaffolding, vec!["dirt", "cobblestone"]);

        let for_wood = movements_for(&session, BlockCategory::Wood).await;
        assert_eq!(for_wood.scaffolding, vec!["dirt", "cobblestone", "oak_log"]);

        world.give("cobblestone", 64);
        let again = movements_for(&session, BlockCategory::Stone).await;
        assert_eq!(again.scaffolding.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_path_ignores_air_and_undiggable() {
        let (session, world) = session(SandboxWorld::new().at(Vec3::new(0.0, 64.0, 0.0)));
        let target = Vec3::new(0.0, 64.0, 10.0);
        assert!(!clear_path(&session, target).await);

        world.set_block(Vec3::new(0.0, 64.0, 2.0), "bedrock");
        assert!(!clear_path(&session, target).await);

        world.set_block(Vec3::new(0.0, 64.0, 2.0), "dirt");
        assert!(clear_path(&session, target).await);
        assert_eq!(world.block_name_at(Vec3::new(0.0, 64.0, 2.0)), "air");
    }
}
