//! Tool selection and replanting.

use harvestbot_core::{Block, ItemCategory, ItemStack, ToolKind, Vec3, WorldError};
use tracing::{debug, warn};

use crate::context::Harvester;

/// What ended up in hand before harvesting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    Equipped(String),
    /// The block wants a tool the agent does not carry
    BareHanded { needed: ToolKind },
    /// Nothing in particular harvests this block faster
    NotNeeded,
}

/// The best carried tool of `kind`. Higher tiers win; unknown tiers rank last.
pub fn best_tool(items: &[ItemStack], kind: ToolKind) -> Option<&ItemStack> {
    items
        .iter()
        .filter_map(|item| match item.category() {
            ItemCategory::Tool { kind: k, tier } if k == kind => Some((item, tier)),
            _ => None,
        })
        .min_by_key(|(_, tier)| (tier.is_none(), *tier))
        .map(|(item, _)| item)
}

/// Equip the best tool for `block`, asking the operator for one if none is
/// carried.
pub async fn equip_for(harvester: &Harvester, block: &Block) -> Result<ToolChoice, WorldError> {
    let Some(kind) = block.category().preferred_tool() else {
        return Ok(ToolChoice::NotNeeded);
    };

    let items = harvester.session.inventory.items().await?;
    match best_tool(&items, kind) {
        Some(tool) => {
            harvester.session.inventory.equip(tool).await?;
            debug!(tool = %tool.name, block = %block.name, "Equipped");
            Ok(ToolChoice::Equipped(tool.name.clone()))
        }
        None => {
            warn!(block = %block.name, needed = %kind, "No suitable tool");
            harvester.say(format!("⚠️ I need a {kind}!")).await;
            Ok(ToolChoice::BareHanded { needed: kind })
        }
    }
}

/// Plant a sapling where a log used to stand. Returns whether one was placed.
pub async fn replant(harvester: &Harvester, position: Vec3) -> bool {
    let inventory = &harvester.session.inventory;
    let sapling = match inventory.items().await {
        Ok(items) => items
            .into_iter()
            .find(|i| i.category() == ItemCategory::Sapling),
        Err(e) => {
            debug!(error = %e, "Inventory unavailable; not replanting");
            return false;
        }
    };
    let Some(sapling) = sapling else {
        return false;
    };

    let ground = position.offset(0.0, -1.0, 0.0);
    let placed = async {
        inventory.equip(&sapling).await?;
        inventory.place_block(ground, Vec3::new(0.0, 1.0, 0.0)).await
    }
    .await;

    match placed {
        Ok(()) => {
            debug!(sapling = %sapling.name, at = %position, "Replanted");
            true
        }
        Err(e) => {
            debug!(error = %e, at = %position, "Replant failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_support::harvester;
    use harvestbot_sandbox::SandboxWorld;

    fn stack(slot: u32, name: &str) -> ItemStack {
        ItemStack {
            slot,
            name: name.into(),
            count: 1,
        }
    }

    #[test]
    fn best_tier_wins() {
        let items = vec![
            stack(0, "wooden_axe"),
            stack(1, "diamond_pickaxe"),
            stack(2, "iron_axe"),
            stack(3, "stone_axe"),
        ];
        assert_eq!(best_tool(&items, ToolKind::Axe).unwrap().name, "iron_axe");
        assert_eq!(
            best_tool(&items, ToolKind::Pickaxe).unwrap().name,
            "diamond_pickaxe"
        );
        assert!(best_tool(&items, ToolKind::Shovel).is_none());
    }

    #[tokio::test]
    async fn equips_axe_for_logs() {
        let (h, world) = harvester(
            SandboxWorld::new()
                .with_item("wooden_axe", 1)
                .with_item("netherite_axe", 1),
        );
        let log = Block {
            name: "oak_log".into(),
            position: Vec3::new(1.0, 64.0, 0.0),
            diggable: true,
        };
        let choice = equip_for(&h, &log).await.unwrap();
        assert_eq!(choice, ToolChoice::Equipped("netherite_axe".into()));
        assert_eq!(world.held_item().as_deref(), Some("netherite_axe"));
    }

    #[tokio::test]
    async fn asks_for_missing_tool() {
        let (h, world) = harvester(SandboxWorld::new().with_item("wooden_axe", 1));
        let ore = Block {
            name: "iron_ore".into(),
            position: Vec3::new(1.0, 64.0, 0.0),
            diggable: true,
        };
        let choice = equip_for(&h, &ore).await.unwrap();
        assert_eq!(
            choice,
            ToolChoice::BareHanded {
                needed: ToolKind::Pickaxe
            }
        );
        assert_eq!(world.chat_log(), vec!["⚠️ I need a pickaxe!"]);
    }

    #[tokio::test]
    async fn replant_places_sapling_on_ground() {
        let spot = Vec3::new(4.0, 64.0, 4.0);
        let (h, world) = harvester(
            SandboxWorld::new()
                .with_block(Vec3::new(4.0, 63.0, 4.0), "grass_block")
                .with_item("oak_sapling", 2),
        );
        assert!(replant(&h, spot).await);
        assert_eq!(world.block_name_at(spot), "oak_sapling");
        assert_eq!(world.inventory()[0].count, 1);

        // occupied now
        assert!(!replant(&h, spot).await);
    }

    #[tokio::test]
    async fn replant_without_sapling_does_nothing() {
        let (h, _world) = harvester(SandboxWorld::new());
        assert!(!replant(&h, Vec3::new(0.0, 64.0, 0.0)).await);
    }
}
