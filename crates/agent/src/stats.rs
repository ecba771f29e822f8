//! Periodic progress report to the log.

use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::context::Harvester;

/// Slots in a full inventory, for the report's denominator.
const INVENTORY_SLOTS: usize = 36;

/// Log a progress line once per configured interval while the loop is active.
pub async fn run(harvester: Harvester) {
    let mut ticker = tokio::time::interval(harvester.config.session.stats_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if harvester.ctx.is_active().await {
            report(&harvester).await;
        }
    }
}

/// Build and log one progress line.
pub async fn report(harvester: &Harvester) -> Option<String> {
    let session = &harvester.session;
    let (vitals, items) = match (session.body.vitals().await, session.inventory.items().await) {
        (Ok(v), Ok(i)) => (v, i),
        (Err(e), _) | (_, Err(e)) => {
            debug!(error = %e, "Stats unavailable");
            return None;
        }
    };
    let total = harvester.ctx.snapshot().await.total_harvested;

    let line = format!(
        "📊 HP: {}/20 | Food: {}/20 | Mined: {} | Inv: {}/{}",
        vitals.health,
        vitals.food,
        total,
        items.len(),
        INVENTORY_SLOTS
    );
    info!(
        health = vitals.health,
        food = vitals.food,
        total,
        stacks = items.len(),
        "{line}"
    );
    Some(line)
}
