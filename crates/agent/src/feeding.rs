//! Eating.

use std::time::Duration;

use harvestbot_core::{Session, WorldError};
use tracing::{debug, info};

/// What a feeding attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOutcome {
    Ate(String),
    NothingToEat,
}

/// Equip the first edible item, consume it, then wait `settle` for the
/// effect to land.
pub async fn feed(session: &Session, settle: Duration) -> Result<FeedOutcome, WorldError> {
    let items = session.inventory.items().await?;
    let Some(food) = items.into_iter().find(|i| i.category().is_edible()) else {
        debug!("No food carried");
        return Ok(FeedOutcome::NothingToEat);
    };

    session.inventory.equip(&food).await?;
    session.inventory.activate_item().await?;
    tokio::time::sleep(settle).await;

    info!(food = %food.name, "Ate");
    Ok(FeedOutcome::Ate(food.name))
}
