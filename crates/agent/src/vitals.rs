//! Periodic feeding, independent of whatever the control loop is doing.
//!
//! The monitor uses looser thresholds than the loop's emergency check, so
//! it usually tops the agent up long before the loop has to.

use harvestbot_config::VitalsConfig;
use harvestbot_core::Vitals;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::context::Harvester;
use crate::feeding::{self, FeedOutcome};

/// Whether the monitor should feed at `vitals`.
pub fn needs_feeding(vitals: &Vitals, config: &VitalsConfig) -> bool {
    vitals.food < config.food_below || vitals.health < config.health_below
}

/// Run forever, checking once per configured interval. The first check
/// happens one interval after start.
pub async fn run(harvester: Harvester) {
    let mut ticker = tokio::time::interval(harvester.config.vitals.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        check(&harvester).await;
    }
}

/// One check. Returns what feeding did, or `None` if none was needed or the
/// world could not be read.
pub async fn check(harvester: &Harvester) -> Option<FeedOutcome> {
    let config = &harvester.config.vitals;
    let vitals = match harvester.session.body.vitals().await {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Vitals unavailable");
            return None;
        }
    };

    if !needs_feeding(&vitals, config) {
        return None;
    }

    debug!(health = vitals.health, food = vitals.food, "Hungry; feeding");
    match feeding::feed(&harvester.session, config.eat_settle()).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!(error = %e, "Feeding failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::harvester;
    use harvestbot_sandbox::SandboxWorld;
    use std::time::Duration;

    #[test]
    fn thresholds() {
        let config = VitalsConfig::default();
        let v = |health, food| Vitals { health, food };
        assert!(!needs_feeding(&v(20.0, 20), &config));
        assert!(!needs_feeding(&v(15.0, 18), &config));
        assert!(needs_feeding(&v(20.0, 17), &config));
        assert!(needs_feeding(&v(14.5, 20), &config));
    }

    #[tokio::test(start_paused = true)]
    async fn check_feeds_only_when_hungry() {
        let (h, world) = harvester(SandboxWorld::new().with_item("bread", 4).with_vitals(20.0, 20));
        assert_eq!(check(&h).await, None);

        world.set_vitals(20.0, 10);
        assert_eq!(check(&h).await, Some(FeedOutcome::Ate("bread".into())));
        assert_eq!(world.current_vitals().food, 16);
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_feeds_on_its_interval() {
        let (h, world) = harvester(SandboxWorld::new().with_item("bread", 4).with_vitals(20.0, 10));
        let task = tokio::spawn(run(h));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(world.inventory()[0].count, 4);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(world.inventory()[0].count, 3);
        task.abort();
    }
}
