//! Category lookup table for blocks and items.
//!
//! Block and item names are resolved once into explicit category tags, so
//! tool choice, feeding, scaffolding and the deposit allow-list are decided
//! by membership rather than by loose substring tests (`"pickaxe"` would
//! otherwise also count as an `"axe"`).

use serde::{Deserialize, Serialize};

/// Broad class of a placed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockCategory {
    Air,
    Wood,
    Stone,
    Soil,
    Container,
    Other,
}

/// Harvesting tool families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Axe,
    Pickaxe,
    Shovel,
    Hoe,
}

/// Tool material, best first. Unranked materials have no tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTier {
    Netherite,
    Diamond,
    Iron,
    Stone,
    Wooden,
}

/// Broad class of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "category")]
pub enum ItemCategory {
    Tool {
        kind: ToolKind,
        tier: Option<ToolTier>,
    },
    Weapon,
    Armor,
    Food,
    Sapling,
    Block {
        block: BlockCategory,
    },
    Other,
}

const AIR: &[&str] = &["air", "cave_air", "void_air"];

const CONTAINERS: &[&str] = &["chest", "trapped_chest", "barrel"];

const WOOD_SUFFIXES: &[&str] = &["_log", "_wood", "_stem", "_hyphae"];

const STONE: &[&str] = &[
    "stone",
    "cobblestone",
    "mossy_cobblestone",
    "deepslate",
    "cobbled_deepslate",
    "granite",
    "diorite",
    "andesite",
    "tuff",
    "calcite",
    "netherrack",
    "blackstone",
    "basalt",
    "sandstone",
    "red_sandstone",
    "end_stone",
];

const SOIL: &[&str] = &[
    "dirt",
    "coarse_dirt",
    "rooted_dirt",
    "grass_block",
    "podzol",
    "mycelium",
    "dirt_path",
    "farmland",
    "mud",
    "sand",
    "red_sand",
    "gravel",
    "clay",
    "soul_sand",
    "soul_soil",
];

const WEAPONS: &[&str] = &["bow", "crossbow", "trident", "mace"];

const ARMOR_SUFFIXES: &[&str] = &["_helmet", "_chestplate", "_leggings", "_boots"];

const FOOD: &[&str] = &[
    // cooked meats
    "cooked_beef",
    "cooked_porkchop",
    "cooked_chicken",
    "cooked_mutton",
    "cooked_rabbit",
    "cooked_cod",
    "cooked_salmon",
    // raw meats and fish
    "beef",
    "porkchop",
    "chicken",
    "mutton",
    "rabbit",
    "cod",
    "salmon",
    "tropical_fish",
    // baked goods
    "bread",
    "cookie",
    "pumpkin_pie",
    "cake",
    // fruit
    "apple",
    "golden_apple",
    "enchanted_golden_apple",
    "melon_slice",
    "sweet_berries",
    "glow_berries",
    "chorus_fruit",
    // vegetables
    "carrot",
    "golden_carrot",
    "potato",
    "baked_potato",
    "beetroot",
    "dried_kelp",
    // stews
    "mushroom_stew",
    "rabbit_stew",
    "beetroot_soup",
    "suspicious_stew",
];

impl BlockCategory {
    /// Resolve a block name to its category.
    pub fn of(name: &str) -> Self {
        let name = strip_namespace(name);
        if AIR.contains(&name) {
            Self::Air
        } else if CONTAINERS.contains(&name) {
            Self::Container
        } else if WOOD_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            Self::Wood
        } else if STONE.contains(&name) || name.ends_with("_ore") {
            Self::Stone
        } else if SOIL.contains(&name) {
            Self::Soil
        } else {
            Self::Other
        }
    }

    /// Resolve an operator target kind, which may be a bare family name
    /// such as `log` or `ore`, to its category.
    pub fn of_kind(kind: &str) -> Self {
        let kind = strip_namespace(kind);
        if WOOD_SUFFIXES.iter().any(|s| &s[1..] == kind) {
            Self::Wood
        } else if kind == "ore" {
            Self::Stone
        } else {
            Self::of(kind)
        }
    }

    /// The tool family that harvests this category fastest.
    pub fn preferred_tool(self) -> Option<ToolKind> {
        match self {
            Self::Wood => Some(ToolKind::Axe),
            Self::Stone => Some(ToolKind::Pickaxe),
            Self::Soil => Some(ToolKind::Shovel),
            _ => None,
        }
    }

    /// Whether blocks of this category can be placed to bridge or tower.
    pub fn is_scaffold(self) -> bool {
        matches!(self, Self::Stone | Self::Soil)
    }
}

impl ToolKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Axe => "axe",
            Self::Pickaxe => "pickaxe",
            Self::Shovel => "shovel",
            Self::Hoe => "hoe",
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToolTier {
    fn from_material(material: &str) -> Option<Self> {
        match material {
            "netherite" => Some(Self::Netherite),
            "diamond" => Some(Self::Diamond),
            "iron" => Some(Self::Iron),
            "stone" => Some(Self::Stone),
            "wooden" | "wood" => Some(Self::Wooden),
            _ => None,
        }
    }
}

impl ItemCategory {
    /// Resolve an item name to its category.
    pub fn of(name: &str) -> Self {
        let name = strip_namespace(name);

        // "_pickaxe" must be tested before "_axe".
        for (suffix, kind) in [
            ("_pickaxe", ToolKind::Pickaxe),
            ("_axe", ToolKind::Axe),
            ("_shovel", ToolKind::Shovel),
            ("_hoe", ToolKind::Hoe),
        ] {
            if let Some(material) = name.strip_suffix(suffix) {
                return Self::Tool {
                    kind,
                    tier: ToolTier::from_material(material),
                };
            }
        }

        if name.ends_with("_sword") || WEAPONS.contains(&name) {
            return Self::Weapon;
        }
        if ARMOR_SUFFIXES.iter().any(|s| name.ends_with(s)) || name == "shield" {
            return Self::Armor;
        }
        if FOOD.contains(&name) {
            return Self::Food;
        }
        if name.ends_with("_sapling") || name == "mangrove_propagule" {
            return Self::Sapling;
        }

        match BlockCategory::of(name) {
            BlockCategory::Other | BlockCategory::Air => Self::Other,
            block => Self::Block { block },
        }
    }

    /// Items the deposit workflow never moves out of the inventory.
    pub fn is_protected(self) -> bool {
        matches!(
            self,
            Self::Tool { .. } | Self::Weapon | Self::Armor | Self::Food
        )
    }

    pub fn is_edible(self) -> bool {
        self == Self::Food
    }

    /// Whether the navigation engine may place this item as scaffolding.
    /// Wood counts only when the agent is harvesting wood itself.
    pub fn is_scaffold(self, target: BlockCategory) -> bool {
        match self {
            Self::Block { block } => {
                block.is_scaffold() || (block == BlockCategory::Wood && target == BlockCategory::Wood)
            }
            _ => false,
        }
    }
}

/// Whether `block_name` is an instance of the operator's `kind`.
///
/// `kind` matches the whole name or any `_`-separated suffix of it, so
/// `log` matches `oak_log` and `iron_ore` matches `deepslate_iron_ore`,
/// while `log` does not match `logger`.
pub fn matches_kind(block_name: &str, kind: &str) -> bool {
    let name = strip_namespace(block_name);
    let kind = strip_namespace(kind);
    if kind.is_empty() {
        return false;
    }
    name == kind
        || name
            .strip_suffix(kind)
            .is_some_and(|prefix| prefix.ends_with('_'))
}

/// Whether an opened window belongs to a storage container.
pub fn is_container_window(window_kind: &str) -> bool {
    let kind = strip_namespace(window_kind);
    CONTAINERS.contains(&kind) || kind == "generic_9x3" || kind == "generic_9x6"
}

fn strip_namespace(name: &str) -> &str {
    name.strip_prefix("minecraft:").unwrap_or(name)
}
