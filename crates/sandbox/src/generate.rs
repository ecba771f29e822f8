//! Seeded terrain for demo runs: a grass plain with trees, rock outcrops
//! and one chest near spawn.

use harvestbot_core::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::world::SandboxWorld;

const GROUND_Y: i64 = 63;
const HALF_EXTENT: i64 = 48;

/// Where generated worlds place their chest.
pub const SPAWN_CHEST: Vec3 = Vec3::new(3.0, 64.0, 3.0);

/// Knobs for [`generate`].
#[derive(Debug, Clone)]
pub struct TerrainOptions {
    pub seed: u64,
    pub trees: usize,
    pub outcrops: usize,
}

impl Default for TerrainOptions {
    fn default() -> Self {
        Self {
            seed: 7,
            trees: 30,
            outcrops: 8,
        }
    }
}

/// Build a world from `options`. The same seed always yields the same world.
pub fn generate(options: &TerrainOptions) -> SandboxWorld {
    let mut rng = StdRng::seed_from_u64(options.seed);
    let world = SandboxWorld::new().at(Vec3::new(0.5, 64.0, 0.5));

    for x in -HALF_EXTENT..=HALF_EXTENT {
        for z in -HALF_EXTENT..=HALF_EXTENT {
            world.set_block(cell(x, GROUND_Y, z), "grass_block");
            world.set_block(cell(x, GROUND_Y - 1, z), "dirt");
        }
    }

    for _ in 0..options.trees {
        let x = rng.random_range(-HALF_EXTENT + 2..HALF_EXTENT - 2);
        let z = rng.random_range(-HALF_EXTENT + 2..HALF_EXTENT - 2);
        if x.abs() < 4 && z.abs() < 4 {
            continue;
        }
        let log = if rng.random_bool(0.7) {
            "oak_log"
        } else {
            "birch_log"
        };
        let height = rng.random_range(4..7);
        for y in 1..=height {
            world.set_block(cell(x, GROUND_Y + y, z), log);
        }
        for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            world.set_block(cell(x + dx, GROUND_Y + height, z + dz), "oak_leaves");
        }
    }

    for _ in 0..options.outcrops {
        let x = rng.random_range(-HALF_EXTENT + 2..HALF_EXTENT - 2);
        let z = rng.random_range(-HALF_EXTENT + 2..HALF_EXTENT - 2);
        for dx in 0..3 {
            for dz in 0..3 {
                let roll: f64 = rng.random();
                let name = if roll < 0.1 {
                    "iron_ore"
                } else if roll < 0.25 {
                    "coal_ore"
                } else {
                    "stone"
                };
                world.set_block(cell(x + dx, GROUND_Y + 1, z + dz), name);
            }
        }
    }

    world.set_block(SPAWN_CHEST, "chest");

    world
        .with_item("stone_axe", 1)
        .with_item("wooden_pickaxe", 1)
        .with_item("bread", 8)
        .with_item("dirt", 16)
        .with_item("oak_sapling", 4)
        .with_vitals(20.0, 20)
}

fn cell(x: i64, y: i64, z: i64) -> Vec3 {
    Vec3::new(x as f64, y as f64, z as f64)
}
