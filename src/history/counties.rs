//! County partitioning.
//!
//! Land is split into counties grown from randomly sampled land capitals with the
//! shared frontier expansion. Water can be crossed for a few consecutive steps but is
//! never owned. Stranded land falls back to the nearest county centroid, so every land
//! cell ends up in exactly one county.

use std::collections::{BTreeSet, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::biomes::Biome;
use crate::error::{GenerationError, Result};
use crate::expansion::{nearest, Advance, Expansion};
use crate::history::config::PartitionConfig;
use crate::history::naming::{NameGenerator, NamingArchetype};
use crate::history::{AncientEmpireId, CountyId, CultureId, PolityId, ReligionId, SubCultureId};
use crate::tilemap::Tilemap;
use crate::world::World;

/// The smallest administrative unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct County {
    pub id: CountyId,
    pub name: String,
    /// Cell the county was grown from.
    pub capital: (usize, usize),
    /// Owned cells, ascending.
    pub cells: Vec<usize>,
    pub centroid: (f32, f32),
    /// Counties sharing a 4-neighbor cell edge with this one, ascending.
    pub neighbors: Vec<CountyId>,
    pub development: u32,
    /// Average movement cost of the county's land cells.
    pub terrain_cost: f32,
    pub naming: NamingArchetype,
    pub culture: Option<CultureId>,
    pub sub_culture: Option<SubCultureId>,
    pub religion: ReligionId,
    pub polity: Option<PolityId>,
    pub ancient_empire: Option<AncientEmpireId>,
}

impl County {
    pub(crate) fn new(id: CountyId, capital: (usize, usize)) -> Self {
        Self {
            id,
            name: String::new(),
            capital,
            cells: Vec::new(),
            centroid: (capital.0 as f32, capital.1 as f32),
            neighbors: Vec::new(),
            development: 0,
            terrain_cost: 0.0,
            naming: NamingArchetype::default(),
            culture: None,
            sub_culture: None,
            religion: ReligionId(0),
            polity: None,
            ancient_empire: None,
        }
    }

    /// Whether the county owns at least one land cell. Landless counties never
    /// become hearths or capitals.
    pub fn has_land(&self, biomes: &Tilemap<Biome>) -> bool {
        self.cells.iter().any(|&c| !biomes.at(c).is_water())
    }
}

/// Partition all land cells into counties and compute their development.
pub fn partition(world: &mut World, config: &PartitionConfig, rng: &mut impl Rng) -> Result<()> {
    let capitals = sample_capitals(&world.biomes, config, rng)?;

    let expansion = {
        let biomes = &world.biomes;
        Expansion::new(biomes)
            .sources(capitals.iter().enumerate().map(|(i, &cell)| (cell, i)))
            .run(|step| {
                let jitter = rng.gen::<f32>() * config.step_jitter;
                let biome = *biomes.at(step.to);
                if biome.is_water() {
                    let carry = step.carry + 1;
                    (carry <= config.max_sea_steps).then(|| Advance {
                        cost: config.sea_step_cost + jitter,
                        carry,
                        claim: false,
                    })
                } else {
                    Some(Advance::claim(biome.movement_cost() as f32 + jitter))
                }
            })
    };

    let mut counties: Vec<County> = capitals
        .iter()
        .enumerate()
        .map(|(i, &cell)| County::new(CountyId::from(i), world.biomes.coords(cell)))
        .collect();

    let mut cell_owner: Vec<Option<usize>> = expansion.owner;
    for (cell, owner) in cell_owner.iter().enumerate() {
        if let Some(county) = owner {
            counties[*county].cells.push(cell);
        }
    }
    update_centroids(&mut counties, &world.biomes);

    // Land cells the frontier never reached (islands beyond the sea limit)
    let centroids: Vec<(f32, f32)> = counties.iter().map(|c| c.centroid).collect();
    let mut stranded = 0usize;
    for cell in 0..cell_owner.len() {
        if cell_owner[cell].is_some() || world.biomes.at(cell).is_water() {
            continue;
        }
        let (x, y) = world.biomes.coords(cell);
        if let Some(county) = nearest(&centroids, x as f32, y as f32) {
            cell_owner[cell] = Some(county);
            counties[county].cells.push(cell);
            stranded += 1;
        }
    }
    if stranded > 0 {
        warn!(cells = stranded, "assigned stranded land cells to the nearest county centroid");
        for county in counties.iter_mut() {
            county.cells.sort_unstable();
        }
        update_centroids(&mut counties, &world.biomes);
    }

    let mut cell_county = Tilemap::new(world.width, world.height);
    for (cell, owner) in cell_owner.iter().enumerate() {
        *cell_county.at_mut(cell) = owner.map(CountyId::from);
    }

    link_neighbors(&mut counties, &cell_county);
    score_development(&mut counties, &world.biomes, config, rng);
    name_counties(&mut counties, world.width, world.height, config, rng);

    info!(
        counties = counties.len(),
        land_cells = cell_owner.iter().filter(|o| o.is_some()).count(),
        "partitioned land into counties"
    );

    world.cell_county = cell_county;
    world.counties = counties;
    Ok(())
}

/// Sample distinct land capitals, giving up after a bounded number of draws.
fn sample_capitals(
    biomes: &Tilemap<Biome>,
    config: &PartitionConfig,
    rng: &mut impl Rng,
) -> Result<Vec<usize>> {
    let target = (biomes.len() / config.cells_per_county).max(1);
    let attempts = target * config.capital_attempts_per_county;

    let mut capitals = Vec::with_capacity(target);
    let mut taken = HashSet::new();
    for _ in 0..attempts {
        if capitals.len() == target {
            break;
        }
        let cell = rng.gen_range(0..biomes.len());
        if !biomes.at(cell).is_water() && taken.insert(cell) {
            capitals.push(cell);
        }
    }

    if capitals.is_empty() {
        return Err(GenerationError::NoLandForCapitals { attempts });
    }
    Ok(capitals)
}

fn update_centroids(counties: &mut [County], biomes: &Tilemap<Biome>) {
    for county in counties.iter_mut() {
        if county.cells.is_empty() {
            continue;
        }
        let (sx, sy) = county.cells.iter().fold((0.0f32, 0.0f32), |(sx, sy), &c| {
            let (x, y) = biomes.coords(c);
            (sx + x as f32, sy + y as f32)
        });
        let n = county.cells.len() as f32;
        county.centroid = (sx / n, sy / n);
    }
}

/// Counties touching across a right or down cell edge are neighbors.
fn link_neighbors(counties: &mut [County], cell_county: &Tilemap<Option<CountyId>>) {
    let mut links: Vec<BTreeSet<CountyId>> = vec![BTreeSet::new(); counties.len()];
    for y in 0..cell_county.height {
        for x in 0..cell_county.width {
            let Some(a) = *cell_county.get(x, y) else { continue };
            let right = (x + 1 < cell_county.width).then(|| *cell_county.get(x + 1, y)).flatten();
            let down = (y + 1 < cell_county.height).then(|| *cell_county.get(x, y + 1)).flatten();
            for b in [right, down].into_iter().flatten() {
                if a != b {
                    links[a.index()].insert(b);
                    links[b.index()].insert(a);
                }
            }
        }
    }
    for (county, set) in counties.iter_mut().zip(links) {
        county.neighbors = set.into_iter().collect();
    }
}

/// Development = base + weighted biome quality + development cores + jitter.
fn score_development(
    counties: &mut [County],
    biomes: &Tilemap<Biome>,
    config: &PartitionConfig,
    rng: &mut impl Rng,
) {
    let core_count = rng.gen_range(config.development_cores_min..=config.development_cores_max);
    let cores: Vec<(f32, f32)> = (0..core_count)
        .map(|_| (rng.gen_range(0.0..biomes.width as f32), rng.gen_range(0.0..biomes.height as f32)))
        .collect();
    let radius = biomes.width.max(biomes.height) as f32 * config.development_core_radius;

    for county in counties.iter_mut() {
        let core_bonus: f32 = cores
            .iter()
            .map(|&(cx, cy)| {
                let d = ((county.centroid.0 - cx).powi(2) + (county.centroid.1 - cy).powi(2)).sqrt();
                if radius > 0.0 { config.development_core_strength * (1.0 - d / radius).max(0.0) } else { 0.0 }
            })
            .sum();
        let jitter = rng.gen_range(-1.0f32..=1.0) * config.development_jitter;
        let land: Vec<Biome> = county.cells.iter().map(|&c| *biomes.at(c)).filter(|b| !b.is_water()).collect();
        county.terrain_cost = average_cost(&land);
        county.development = development_score(&land, core_bonus, jitter, config);
    }
}

/// Integer development of a county given its land biomes. No land means 0.
pub fn development_score(land: &[Biome], core_bonus: f32, jitter: f32, config: &PartitionConfig) -> u32 {
    if land.is_empty() {
        return 0;
    }
    let avg_modifier = land.iter().map(|b| b.development_modifier()).sum::<f32>() / land.len() as f32;
    let raw = config.development_base + config.development_biome_weight * avg_modifier + core_bonus + jitter;
    raw.max(1.0).round() as u32
}

fn average_cost(land: &[Biome]) -> f32 {
    if land.is_empty() {
        return 0.0;
    }
    land.iter().map(|b| b.movement_cost() as f32).sum::<f32>() / land.len() as f32
}

/// Split the map into naming regions and name every county in its region's style.
fn name_counties(
    counties: &mut [County],
    width: usize,
    height: usize,
    config: &PartitionConfig,
    rng: &mut impl Rng,
) {
    let anchors: Vec<(f32, f32)> = (0..config.naming_regions)
        .map(|_| (rng.gen_range(0.0..width as f32), rng.gen_range(0.0..height as f32)))
        .collect();
    let mut archetypes = NamingArchetype::all().to_vec();
    archetypes.shuffle(rng);

    let mut used = HashSet::new();
    for county in counties.iter_mut() {
        let region = nearest(&anchors, county.centroid.0, county.centroid.1).unwrap_or(0);
        county.naming = archetypes[region % archetypes.len()];
        let style = county.naming.style();
        // A few retries keep county names unique in practice
        let mut name = NameGenerator::place_name(style, rng);
        for _ in 0..4 {
            if used.insert(name.clone()) {
                break;
            }
            name = NameGenerator::place_name(style, rng);
        }
        county.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::config::HistoryConfig;
    use crate::seeds::SeededRng;

    /// Two islands of grassland separated by a strip of ocean.
    fn islands(width: usize, height: usize, gap: std::ops::Range<usize>) -> World {
        let mut world = World::new("test", width, height);
        for y in 0..height {
            for x in 0..width {
                let biome = if gap.contains(&x) { Biome::Ocean } else { Biome::Grassland };
                world.biomes.set(x, y, biome);
            }
        }
        world
    }

    #[test]
    fn test_every_land_cell_owned_once() {
        let mut world = islands(30, 20, 14..16);
        let config = HistoryConfig::default().partition;
        let mut rng = SeededRng::from_seed_str("counties").unwrap();
        partition(&mut world, &config, &mut rng).unwrap();

        let mut seen = vec![0u32; world.biomes.len()];
        for county in &world.counties {
            for &cell in &county.cells {
                seen[cell] += 1;
            }
        }
        for cell in 0..seen.len() {
            let expected = if world.biomes.at(cell).is_water() { 0 } else { 1 };
            assert_eq!(seen[cell], expected, "cell {}", cell);
            assert_eq!(world.cell_county.at(cell).is_some(), expected == 1);
        }
    }

    #[test]
    fn test_target_capital_count_and_neighbors_symmetric() {
        let mut world = islands(40, 25, 100..100);
        let config = HistoryConfig::default().partition;
        let mut rng = SeededRng::from_seed_str("counties").unwrap();
        partition(&mut world, &config, &mut rng).unwrap();
        assert_eq!(world.counties.len(), 10);
        for county in &world.counties {
            assert!(county.development >= 1);
            for n in &county.neighbors {
                assert!(world.counties[n.index()].neighbors.contains(&county.id));
            }
        }
    }

    #[test]
    fn test_all_ocean_fails_fast() {
        let mut world = World::new("test", 10, 10);
        let config = HistoryConfig::default().partition;
        let mut rng = SeededRng::from_seed_str("counties").unwrap();
        let result = partition(&mut world, &config, &mut rng);
        assert!(matches!(result, Err(GenerationError::NoLandForCapitals { attempts: 200 })));
    }

    #[test]
    fn test_landless_county_has_zero_development() {
        let config = HistoryConfig::default().partition;
        assert_eq!(development_score(&[], 10.0, 1.0, &config), 0);
        assert!(development_score(&[Biome::Desert], 0.0, -1.0, &config) >= 1);

        let biomes = Tilemap::new_with(2, 1, Biome::Ocean);
        let mut county = County::new(CountyId(0), (0, 0));
        county.cells = vec![0, 1];
        assert!(!county.has_land(&biomes));
    }
}
