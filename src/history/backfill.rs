//! Ancient history pre-pass.
//!
//! A few long-gone empires are grown from well developed, widely spaced cores over the
//! county graph. They collapse before any living polity forms; what survives is the
//! record of their extent, which later pulls the cultures of their former lands
//! together.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::expansion::{Advance, Expansion};
use crate::history::config::BackfillConfig;
use crate::history::entities::culture::{development_order, spaced_hearths};
use crate::history::naming::NameGenerator;
use crate::history::{AncientEmpireId, CountyId};
use crate::world::World;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AncientEmpire {
    pub id: AncientEmpireId,
    pub name: String,
    pub core: CountyId,
    /// Counties the empire held at its height, ascending.
    pub counties: Vec<CountyId>,
}

/// Grow and collapse the ancient empires, marking every county they held.
pub fn backfill_ancient_empires(world: &mut World, config: &BackfillConfig, rng: &mut impl Rng) {
    let centroids: Vec<(f32, f32)> = world.counties.iter().map(|c| c.centroid).collect();
    let candidates = development_order(world, |_| true);
    let spacing = world.width.max(world.height) as f32 / config.core_spacing_factor;
    let cores = spaced_hearths(&candidates, &centroids, spacing, config.empire_count);

    let graph = world.county_graph();
    let counties = &world.counties;
    let expansion = Expansion::new(&graph)
        .sources(cores.iter().enumerate().map(|(owner, &c)| (c, owner)))
        .max_cost(config.empire_reach)
        .run(|step| Some(Advance::claim(config.empire_step_cost + counties[step.to].terrain_cost)));

    let mut empires: Vec<AncientEmpire> = cores
        .iter()
        .enumerate()
        .map(|(i, &core)| {
            let place = NameGenerator::place_name(world.counties[core].naming.style(), rng);
            AncientEmpire {
                id: AncientEmpireId::from(i),
                name: format!("Old Empire of {}", place),
                core: CountyId::from(core),
                counties: Vec::new(),
            }
        })
        .collect();

    for (c, owner) in expansion.owner.iter().enumerate() {
        if let Some(owner) = *owner {
            empires[owner].counties.push(CountyId::from(c));
            world.counties[c].ancient_empire = Some(AncientEmpireId::from(owner));
        }
    }

    info!(
        empires = empires.len(),
        counties = empires.iter().map(|e| e.counties.len()).sum::<usize>(),
        "backfilled ancient empires"
    );
    world.ancient_empires = empires;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::Biome;
    use crate::history::counties::County;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// A strip of one-cell land counties, each bordering the next.
    fn strip(len: usize) -> World {
        let mut world = World::new("strip", len, 1);
        for i in 0..len {
            *world.biomes.at_mut(i) = Biome::Grassland;
            let mut county = County::new(CountyId::from(i), (i, 0));
            county.cells.push(i);
            county.development = 1;
            if i > 0 {
                county.neighbors.push(CountyId::from(i - 1));
            }
            if i + 1 < len {
                county.neighbors.push(CountyId::from(i + 1));
            }
            world.counties.push(county);
        }
        world
    }

    #[test]
    fn test_empires_grow_from_developed_ends() {
        let mut world = strip(20);
        world.counties[0].development = 10;
        world.counties[19].development = 9;
        let config = BackfillConfig {
            enabled: true,
            empire_count: 2,
            empire_step_cost: 9.0,
            empire_reach: 60.0,
            core_spacing_factor: 4.0,
        };
        backfill_ancient_empires(&mut world, &config, &mut ChaCha8Rng::seed_from_u64(5));

        assert_eq!(world.ancient_empires.len(), 2);
        let first = &world.ancient_empires[0];
        assert_eq!(first.core, CountyId(0));
        assert_eq!(first.counties, (0..=6).map(CountyId::from).collect::<Vec<_>>());
        assert!(first.name.starts_with("Old Empire of "));
        assert_eq!(world.ancient_empires[1].core, CountyId(19));

        // The middle of the strip lies beyond both empires' reach
        assert!((7..13).all(|c| world.counties[c].ancient_empire.is_none()));
        assert_eq!(world.counties[15].ancient_empire, Some(AncientEmpireId(1)));
    }
}
