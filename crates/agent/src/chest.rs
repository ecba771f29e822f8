//! Chest memory and the deposit workflow.
//!
//! Three ways in:
//!
//! - [`discover_and_offload`]: find the nearest container, walk to it,
//!   remember it, deposit (`dropoff` command)
//! - [`watch_and_offload`]: wait for a player to open a container next to
//!   the agent, remember that one, deposit (`setchest` command)
//! - [`offload`]: deposit into the remembered chest (the control loop)
//!
//! Every deposit attempt, successful or not, resets the session counter.

use std::time::Duration;

use harvestbot_core::{Block, BlockCategory, ChestError, ItemStack, NavigationError};
use tracing::{debug, info, warn};

use crate::context::Harvester;
use crate::navigation::{self, RetryPolicy};

/// How long the passive path waits for a container window.
pub const WATCH_WINDOW: Duration = Duration::from_secs(30);

/// A container window counts as "next to the agent" within this distance.
const OPENED_NEARBY: f64 = 6.0;

/// Pause between closing the player's window and walking over.
const WINDOW_SETTLE: Duration = Duration::from_secs(1);

/// Outcome of one deposit pass.
#[derive(Debug, Clone, Default)]
pub struct DepositReport {
    pub deposited: Vec<ItemStack>,
    /// Stacks that stayed in the inventory
    pub failed: Vec<ChestError>,
}

/// Deposit into the remembered chest, then reset the session counter
/// regardless of how the deposit went.
pub async fn offload(harvester: &Harvester) -> Result<DepositReport, ChestError> {
    let result = deposit(harvester).await;
    harvester.ctx.update(|s| s.reset_session()).await;
    result
}

/// Move every unprotected stack into the remembered chest.
///
/// Fails without searching when no chest is remembered, and forgets the
/// chest when its position no longer holds a container.
pub async fn deposit(harvester: &Harvester) -> Result<DepositReport, ChestError> {
    let session = &harvester.session;
    let prefix = &harvester.config.harvest.command_prefix;

    let Some(position) = harvester.ctx.chest_position().await else {
        warn!("No chest remembered");
        harvester
            .say(format!("❌ No chest set! Use {prefix}dropoff first."))
            .await;
        return Err(ChestError::NotSet);
    };

    let still_there = match session.query.block_at(position).await {
        Ok(block) => block.is_some_and(|b| b.category() == BlockCategory::Container),
        Err(e) => {
            harvester.say(format!("❌ Deposit failed: {e}")).await;
            return Err(ChestError::OpenFailed(e.to_string()));
        }
    };
    if !still_there {
        warn!(%position, "Remembered chest is gone");
        harvester.ctx.forget_chest().await;
        harvester
            .say(format!("⚠️ Chest missing! Use {prefix}dropoff to set a new one."))
            .await;
        return Err(ChestError::Missing { position });
    }

    info!(%position, "Heading to chest");
    let target_category = harvest_category(harvester).await;
    let policy = RetryPolicy::chest_deposit(&harvester.config.navigation);
    if let Err(e) = navigation::travel_with_retry(session, position, &policy, target_category).await {
        let attempts = attempts_of(&e, &policy);
        harvester
            .say(format!(
                "❌ Cannot reach chest after {attempts} attempts! Clear the path or use {prefix}chest to reset."
            ))
            .await;
        return Err(ChestError::Unreachable { attempts });
    }

    let container = match session.containers.open_container(position).await {
        Ok(c) => c,
        Err(e) => {
            warn!(%position, error = %e, "Could not open chest");
            harvester.say(format!("❌ Deposit failed: {e}")).await;
            return Err(ChestError::OpenFailed(e.to_string()));
        }
    };

    let items = match session.inventory.items().await {
        Ok(items) => items,
        Err(e) => {
            if let Err(e) = container.close().await {
                debug!(error = %e, "Closing chest failed");
            }
            harvester.say(format!("❌ Deposit failed: {e}")).await;
            return Err(ChestError::OpenFailed(e.to_string()));
        }
    };

    let mut report = DepositReport::default();
    for item in items.into_iter().filter(|i| !i.category().is_protected()) {
        match container.deposit(&item).await {
            Ok(()) => {
                debug!(item = %item.name, count = item.count, "Deposited");
                report.deposited.push(item);
            }
            Err(e) => {
                warn!(item = %item.name, error = %e, "Deposit of stack failed");
                report.failed.push(ChestError::TransferFailed {
                    item: item.name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if let Err(e) = container.close().await {
        debug!(error = %e, "Closing chest failed");
    }

    let total = harvester.ctx.snapshot().await.total_harvested;
    info!(
        deposited = report.deposited.len(),
        failed = report.failed.len(),
        total,
        "Deposit complete"
    );
    harvester
        .say(format!("💰 Deposited! Total mined: {total}"))
        .await;
    Ok(report)
}

/// Find the nearest container, walk to it, remember it and offload.
pub async fn discover_and_offload(harvester: &Harvester) -> Result<DepositReport, ChestError> {
    let session = &harvester.session;
    let radius = harvester.config.harvest.search_radius;

    info!(radius, "Searching for chest");
    let found = session
        .query
        .find_block(&|b: &Block| b.category() == BlockCategory::Container, radius)
        .await;
    let chest = match found {
        Ok(Some(chest)) => chest,
        Ok(None) => {
            harvester.say("❌ No chest found nearby!").await;
            return Err(ChestError::NotFound { radius });
        }
        Err(e) => {
            warn!(error = %e, "Chest search failed");
            harvester.say("❌ No chest found nearby!").await;
            return Err(ChestError::NotFound { radius });
        }
    };

    let position = chest.position;
    info!(%position, "Found chest");
    harvester.say(format!("Found chest at {position}")).await;

    let target_category = harvest_category(harvester).await;
    let policy = RetryPolicy::chest_discovery(&harvester.config.navigation);
    if let Err(e) = navigation::travel_with_retry(session, position, &policy, target_category).await {
        let attempts = attempts_of(&e, &policy);
        harvester
            .say(format!(
                "❌ Cannot reach that chest after {attempts} attempts! Find one closer or clear the path."
            ))
            .await;
        return Err(ChestError::Unreachable { attempts });
    }

    harvester.ctx.remember_chest(position).await;
    harvester.say("✅ Using this chest! Depositing now...").await;
    offload(harvester).await
}

/// Wait up to `window` for a container window to open, then adopt the
/// container next to the agent and offload into it.
///
/// Windows that are not containers are ignored and the wait continues.
pub async fn watch_and_offload(
    harvester: &Harvester,
    window: Duration,
) -> Result<DepositReport, ChestError> {
    let ctx = &harvester.ctx;
    let opened = ctx.arm_container_watch().await;
    harvester
        .say(format!(
            "👀 Open the chest you want me to use ({}s)...",
            window.as_secs()
        ))
        .await;

    let window_kind = match tokio::time::timeout(window, opened).await {
        Ok(Ok(kind)) => kind,
        Ok(Err(_)) => {
            // Replaced by a newer watch; that one reports.
            return Err(ChestError::WatchTimedOut);
        }
        Err(_) => {
            ctx.disarm_container_watch().await;
            harvester.say("⏰ Timed out waiting for chest").await;
            return Err(ChestError::WatchTimedOut);
        }
    };
    info!(window = %window_kind, "Container window opened");

    let session = &harvester.session;
    let origin = session.body.position().await.ok();
    let nearby = session
        .query
        .find_block(
            &|b: &Block| {
                b.category() == BlockCategory::Container
                    && origin.is_some_and(|o| o.distance_to(&b.position) < OPENED_NEARBY)
            },
            OPENED_NEARBY,
        )
        .await;

    let Ok(Some(chest)) = nearby else {
        harvester.say("❌ Could not find the chest you opened").await;
        return Err(ChestError::NotFound {
            radius: OPENED_NEARBY,
        });
    };

    ctx.remember_chest(chest.position).await;
    harvester
        .say(format!("✅ Chest locked in at {}", chest.position))
        .await;

    if let Err(e) = session.containers.close_window().await {
        debug!(error = %e, "Closing player window failed");
    }
    tokio::time::sleep(WINDOW_SETTLE).await;
    offload(harvester).await
}

async fn harvest_category(harvester: &Harvester) -> BlockCategory {
    BlockCategory::of_kind(&harvester.ctx.target_kind().await)
}

fn attempts_of(error: &NavigationError, policy: &RetryPolicy) -> u32 {
    match error {
        NavigationError::Unreachable { attempts } => *attempts,
        NavigationError::Failed(_) => policy.max_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::harvester;
    use harvestbot_core::Vec3;
    use harvestbot_sandbox::SandboxWorld;

    const CHEST: Vec3 = Vec3::new(3.0, 64.0, 3.0);

    fn loaded_world() -> SandboxWorld {
        SandboxWorld::new()
            .at(Vec3::new(0.0, 64.0, 0.0))
            .with_block(CHEST, "chest")
            .with_item("diamond_pickaxe", 1)
            .with_item("iron_sword", 1)
            .with_item("bread", 5)
            .with_item("oak_log", 64)
            .with_item("cobblestone", 20)
    }

    #[tokio::test(start_paused = true)]
    async fn deposit_keeps_protected_items() {
        let (h, world) = harvester(loaded_world());
        h.ctx.remember_chest(CHEST).await;
        h.ctx.update(|s| s.session_count = 40).await;

        let report = offload(&h).await.unwrap();

        assert_eq!(report.deposited.len(), 2);
        let stored: Vec<String> = world.container_contents(CHEST).into_iter().map(|s| s.name).collect();
        assert_eq!(stored, vec!["oak_log", "cobblestone"]);
        let kept: Vec<String> = world.inventory().into_iter().map(|s| s.name).collect();
        assert_eq!(kept, vec!["diamond_pickaxe", "iron_sword", "bread"]);
        assert_eq!(h.ctx.snapshot().await.session_count, 0);
        assert!(!world.window_open());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_stack_does_not_abort_the_rest() {
        let (h, world) = harvester(loaded_world());
        world.reject_deposits_of("oak_log");
        h.ctx.remember_chest(CHEST).await;

        let report = deposit(&h).await.unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.deposited[0].name, "cobblestone");
        assert!(!world.window_open());
    }

    #[tokio::test(start_paused = true)]
    async fn no_chest_remembered_fails_without_travel() {
        let (h, world) = harvester(loaded_world());
        h.ctx.update(|s| s.session_count = 10).await;

        let err = offload(&h).await.unwrap_err();

        assert!(matches!(err, ChestError::NotSet));
        assert!(world.travel_log().is_empty());
        assert_eq!(h.ctx.snapshot().await.session_count, 0);
        assert!(world.chat_log()[0].contains("No chest set"));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_chest_is_forgotten() {
        let (h, world) = harvester(loaded_world());
        h.ctx.remember_chest(CHEST).await;
        world.set_block(CHEST, "air");

        let err = deposit(&h).await.unwrap_err();

        assert!(matches!(err, ChestError::Missing { .. }));
        assert!(h.ctx.chest_position().await.is_none());
        assert!(world.travel_log().is_empty());

        // the chest comes back, but the forgotten position is not used again
        world.set_block(CHEST, "chest");
        let err = offload(&h).await.unwrap_err();
        assert!(matches!(err, ChestError::NotSet));
        assert!(world.travel_log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn chest_trip_scaffolds_with_logs_when_harvesting_logs() {
        let (h, world) = harvester(
            SandboxWorld::new()
                .with_block(CHEST, "chest")
                .with_item("oak_log", 64)
                .with_item("dirt", 4),
        );
        assert_eq!(h.ctx.target_kind().await, "log");
        h.ctx.remember_chest(CHEST).await;

        deposit(&h).await.unwrap();

        let movements = world.travel_log()[0].movements.clone().unwrap();
        assert!(movements.scaffolding.contains(&"oak_log".to_string()));
        assert!(movements.scaffolding.contains(&"dirt".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_inventory_still_closes_the_chest() {
        let (h, world) = harvester(loaded_world());
        h.ctx.remember_chest(CHEST).await;
        world.set_inventory_unreadable(true);

        let err = deposit(&h).await.unwrap_err();

        assert!(matches!(err, ChestError::OpenFailed(_)));
        assert!(!world.window_open());
        assert!(world.container_contents(CHEST).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_chest_is_reported() {
        let (h, world) = harvester(loaded_world());
        h.ctx.remember_chest(CHEST).await;
        world.make_unreachable(CHEST);

        let err = deposit(&h).await.unwrap_err();

        assert!(matches!(err, ChestError::Unreachable { attempts: 20 }));
        assert_eq!(world.travel_log().len(), 20);
        assert!(world.container_contents(CHEST).is_empty());
        // still remembered
        assert_eq!(h.ctx.chest_position().await, Some(CHEST));
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_remembers_and_deposits() {
        let (h, world) = harvester(loaded_world());

        discover_and_offload(&h).await.unwrap();

        assert_eq!(h.ctx.chest_position().await, Some(CHEST));
        assert_eq!(world.container_contents(CHEST).len(), 2);
        assert!(world.chat_log().iter().any(|l| l == "Found chest at 3, 64, 3"));
    }

    #[tokio::test(start_paused = true)]
    async fn discovery_without_any_chest_issues_no_travel() {
        let (h, world) = harvester(SandboxWorld::new().with_item("oak_log", 3));

        let err = discover_and_offload(&h).await.unwrap_err();

        assert!(matches!(err, ChestError::NotFound { .. }));
        assert!(world.travel_log().is_empty());
        assert!(h.ctx.chest_position().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn passive_watch_adopts_opened_chest() {
        let (h, world) = harvester(loaded_world());
        let task = {
            let h = h.clone();
            tokio::spawn(async move { watch_and_offload(&h, WATCH_WINDOW).await })
        };

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.ctx.container_watch_armed().await);
        world.open_window("minecraft:chest");
        assert!(h.ctx.fire_container_watch("minecraft:chest").await);

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.deposited.len(), 2);
        assert_eq!(h.ctx.chest_position().await, Some(CHEST));
        assert!(!world.window_open());
    }

    #[tokio::test(start_paused = true)]
    async fn passive_watch_times_out() {
        let (h, world) = harvester(loaded_world());

        let err = watch_and_offload(&h, WATCH_WINDOW).await.unwrap_err();

        assert!(matches!(err, ChestError::WatchTimedOut));
        assert!(!h.ctx.container_watch_armed().await);
        assert!(h.ctx.chest_position().await.is_none());
        assert!(world.chat_log().iter().any(|l| l.contains("Timed out")));
    }
}
