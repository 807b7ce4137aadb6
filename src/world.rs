//! World snapshot and the generation pipeline.
//!
//! `World` bundles every generated layer: terrain grids, counties, polities and the
//! sociology and diplomacy built on top of them. It is produced once per `generate`
//! call and never mutated afterwards.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::biomes::{self, Biome};
use crate::climate::{self, ClimateParams};
use crate::erosion::{self, params::ErosionParams};
use crate::error::{GenerationError, Result};
use crate::heightmap::{self, TerrainParams};
use crate::history::backfill::{backfill_ancient_empires, AncientEmpire};
use crate::history::civilizations::court::crown_rulers;
use crate::history::civilizations::diplomacy::{simulate_diplomacy, Alliance, DiplomacyRules};
use crate::history::civilizations::faction::form_factions;
use crate::history::civilizations::polity::{form_base_polities, realm_of, Polity};
use crate::history::civilizations::realms::form_realms;
use crate::history::counties::{partition, County};
use crate::history::entities::culture::spread_cultures;
use crate::history::entities::{CultureGroup, Dynasty, SubCulture};
use crate::history::finalize::finalize;
use crate::history::religion::{spread_religions, Religion};
use crate::history::{CountyId, HistoryConfig, PolityId};
use crate::seeds::{SeedSystem, WorldSeeds};
use crate::tilemap::Tilemap;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Every tunable of the pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub terrain: TerrainParams,
    pub erosion: ErosionParams,
    pub climate: ClimateParams,
    pub history: HistoryConfig,
}

impl WorldConfig {
    /// Parse overrides from JSON; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(GenerationError::InvalidConfig(message.to_string()));
        let t = &self.terrain;
        if t.octaves == 0 {
            return invalid("terrain.octaves must be > 0");
        }
        if !(0.0..1.0).contains(&t.sea_level) {
            return invalid("terrain.sea_level must be in [0, 1)");
        }
        let e = &self.erosion;
        if !(0.0..=1.0).contains(&e.water_retention) {
            return invalid("erosion.water_retention must be in [0, 1]");
        }
        if e.capacity_factor < 0.0 || e.erosion_rate < 0.0 || e.deposition_rate < 0.0 {
            return invalid("erosion rates must be >= 0");
        }
        if self.climate.moisture_radius == 0 {
            return invalid("climate.moisture_radius must be > 0");
        }
        self.history.validate()
    }
}

/// Seed and grid size of one generation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub seed: String,
    pub width: usize,
    pub height: usize,
}

impl GenerationRequest {
    pub fn new(seed: impl Into<String>, width: usize, height: usize) -> Self {
        Self { seed: seed.into(), width, height }
    }

    pub fn validate(&self) -> Result<()> {
        if self.seed.is_empty() {
            return Err(GenerationError::EmptySeed);
        }
        if self.width == 0 || self.height == 0 {
            return Err(GenerationError::InvalidDimensions { width: self.width, height: self.height });
        }
        Ok(())
    }
}

// =============================================================================
// WORLD
// =============================================================================

/// All generated world data bundled together
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub seed: String,
    pub width: usize,
    pub height: usize,
    pub sea_level: f32,
    /// Normalized elevation (0.0-1.0)
    pub elevation: Tilemap<f32>,
    /// Moisture (0.0-1.0)
    pub moisture: Tilemap<f32>,
    /// Temperature (0.0-1.0)
    pub temperature: Tilemap<f32>,
    /// River paths crossing each cell
    pub river_flow: Tilemap<u32>,
    pub biomes: Tilemap<Biome>,
    /// County owning each land cell; water is never owned
    pub cell_county: Tilemap<Option<CountyId>>,
    pub counties: Vec<County>,
    pub polities: Vec<Polity>,
    pub culture_groups: Vec<CultureGroup>,
    pub sub_cultures: Vec<SubCulture>,
    pub religions: Vec<Religion>,
    pub dynasties: Vec<Dynasty>,
    pub alliances: Vec<Alliance>,
    pub ancient_empires: Vec<AncientEmpire>,
}

impl World {
    /// Empty world of the given size: flat ocean, no counties.
    pub fn new(seed: &str, width: usize, height: usize) -> Self {
        Self {
            seed: seed.to_string(),
            width,
            height,
            sea_level: TerrainParams::default().sea_level,
            elevation: Tilemap::new_with(width, height, 0.0),
            moisture: Tilemap::new_with(width, height, 0.0),
            temperature: Tilemap::new_with(width, height, 0.0),
            river_flow: Tilemap::new_with(width, height, 0),
            biomes: Tilemap::new_with(width, height, Biome::Ocean),
            cell_county: Tilemap::new_with(width, height, None),
            counties: Vec::new(),
            polities: Vec::new(),
            culture_groups: Vec::new(),
            sub_cultures: Vec::new(),
            religions: Vec::new(),
            dynasties: Vec::new(),
            alliances: Vec::new(),
            ancient_empires: Vec::new(),
        }
    }

    /// County adjacency lists, indexed by county.
    pub fn county_graph(&self) -> Vec<Vec<usize>> {
        self.counties.iter().map(|c| c.neighbors.iter().map(|n| n.index()).collect()).collect()
    }

    pub fn polity(&self, id: PolityId) -> Option<&Polity> {
        self.polities.get(id.index())
    }

    /// Independent polities.
    pub fn realms(&self) -> impl Iterator<Item = &Polity> {
        self.polities.iter().filter(|p| p.is_independent())
    }

    /// Get tile info at coordinates
    pub fn tile_info(&self, x: usize, y: usize) -> TileInfo {
        let county = *self.cell_county.get(x, y);
        let polity = county.and_then(|c| self.counties[c.index()].polity);
        TileInfo {
            x,
            y,
            elevation: *self.elevation.get(x, y),
            temperature: *self.temperature.get(x, y),
            moisture: *self.moisture.get(x, y),
            river_flow: *self.river_flow.get(x, y),
            biome: *self.biomes.get(x, y),
            county: county.map(|c| self.counties[c.index()].name.clone()),
            polity: polity.and_then(|p| self.polity(p)).map(Polity::full_name),
            realm: polity
                .and_then(|p| realm_of(&self.polities, p).ok())
                .and_then(|r| self.polity(r))
                .map(Polity::full_name),
            culture: county
                .and_then(|c| self.counties[c.index()].culture)
                .and_then(|c| self.culture_groups.get(c.index()))
                .map(|g| g.name.clone()),
            religion: county
                .and_then(|c| self.religions.get(self.counties[c.index()].religion.index()))
                .map(|r| r.name.clone()),
        }
    }
}

/// Information about a single tile
#[derive(Clone, Debug)]
pub struct TileInfo {
    pub x: usize,
    pub y: usize,
    pub elevation: f32,
    pub temperature: f32,
    pub moisture: f32,
    pub river_flow: u32,
    pub biome: Biome,
    pub county: Option<String>,
    pub polity: Option<String>,
    pub realm: Option<String>,
    pub culture: Option<String>,
    pub religion: Option<String>,
}

impl TileInfo {
    /// Format moisture as string
    pub fn moisture_str(&self) -> String {
        let desc = if self.moisture < 0.2 {
            "arid"
        } else if self.moisture < 0.4 {
            "dry"
        } else if self.moisture < 0.6 {
            "moderate"
        } else if self.moisture < 0.8 {
            "wet"
        } else {
            "saturated"
        };
        format!("{:.2} ({})", self.moisture, desc)
    }
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Stages reported on the progress channel, in pipeline order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Terrain,
    Erosion,
    Rivers,
    Climate,
    Counties,
    Backfill,
    Polities,
    Cultures,
    Religions,
    Court,
    Diplomacy,
    Factions,
    Finalize,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Stage::Terrain => "Shaping terrain",
            Stage::Erosion => "Simulating erosion",
            Stage::Rivers => "Tracing rivers",
            Stage::Climate => "Computing climate and biomes",
            Stage::Counties => "Partitioning counties",
            Stage::Backfill => "Backfilling ancient history",
            Stage::Polities => "Forming polities and realms",
            Stage::Cultures => "Spreading cultures",
            Stage::Religions => "Spreading religions",
            Stage::Court => "Crowning rulers and dynasties",
            Stage::Diplomacy => "Simulating diplomacy",
            Stage::Factions => "Forming factions",
            Stage::Finalize => "Finalizing world",
        }
    }
}

/// Generate a world with the default configuration.
pub fn generate(seed: &str, width: usize, height: usize) -> Result<World> {
    generate_with(&GenerationRequest::new(seed, width, height), &WorldConfig::default(), &mut |_: &str| {})
}

/// Run the full pipeline, reporting each stage before it starts.
pub fn generate_with(
    request: &GenerationRequest,
    config: &WorldConfig,
    progress: &mut dyn FnMut(&str),
) -> Result<World> {
    request.validate()?;
    config.validate()?;
    let seeds = WorldSeeds::from_master(&request.seed)?;
    let (width, height) = (request.width, request.height);
    let history = &config.history;

    let mut report = |stage: Stage| {
        debug!(stage = stage.label(), "stage started");
        progress(stage.label());
    };

    let mut world = World::new(&request.seed, width, height);
    world.sea_level = config.terrain.sea_level;
    let sea_level = world.sea_level;

    report(Stage::Terrain);
    world.elevation = heightmap::generate_heightmap(width, height, &seeds, &config.terrain);

    report(Stage::Erosion);
    erosion::erode(&mut world.elevation, &config.erosion, sea_level, &mut seeds.rng(SeedSystem::Erosion));

    report(Stage::Rivers);
    world.river_flow =
        erosion::rivers(&mut world.elevation, &config.erosion, sea_level, &mut seeds.rng(SeedSystem::Rivers));

    report(Stage::Climate);
    world.temperature = climate::generate_temperature(&world.elevation, sea_level, &config.climate);
    world.moisture =
        climate::generate_moisture(&world.elevation, &world.river_flow, sea_level, &seeds, &config.climate);
    world.biomes = biomes::generate_biomes(
        &world.elevation,
        &world.moisture,
        &world.temperature,
        &world.river_flow,
        sea_level,
    );

    report(Stage::Counties);
    partition(&mut world, &history.partition, &mut seeds.rng(SeedSystem::Counties))?;

    if history.backfill.enabled {
        report(Stage::Backfill);
        backfill_ancient_empires(&mut world, &history.backfill, &mut seeds.rng(SeedSystem::Backfill));
    }

    report(Stage::Polities);
    form_base_polities(&mut world, &history.politics, &mut seeds.rng(SeedSystem::Polities))?;
    form_realms(&mut world, &history.politics)?;

    report(Stage::Cultures);
    spread_cultures(&mut world, &history.sociology, &mut seeds.rng(SeedSystem::Cultures));

    report(Stage::Religions);
    spread_religions(&mut world, &history.sociology, &mut seeds.rng(SeedSystem::Religions));

    report(Stage::Court);
    crown_rulers(&mut world, &history.court, &mut seeds.rng(SeedSystem::Court));

    report(Stage::Diplomacy);
    let rules = DiplomacyRules { politics: &history.politics, court: &history.court, diplomacy: &history.diplomacy };
    simulate_diplomacy(&mut world, &rules, &mut seeds.rng(SeedSystem::Diplomacy))?;

    report(Stage::Factions);
    form_factions(&mut world, &history.diplomacy)?;

    report(Stage::Finalize);
    finalize(&mut world, &mut seeds.rng(SeedSystem::Colors))?;

    info!(
        seed = %request.seed,
        width,
        height,
        counties = world.counties.len(),
        realms = world.realms().count(),
        "world generated"
    );
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(matches!(GenerationRequest::new("", 10, 10).validate(), Err(GenerationError::EmptySeed)));
        assert!(matches!(
            GenerationRequest::new("a", 0, 10).validate(),
            Err(GenerationError::InvalidDimensions { width: 0, height: 10 })
        ));
        assert!(GenerationRequest::new("a", 1, 1).validate().is_ok());
    }

    #[test]
    fn test_config_overrides_keep_defaults() {
        let config = WorldConfig::from_json_str(r#"{"erosion": {"hydraulic_iterations": 10}}"#).unwrap();
        assert_eq!(config.erosion.hydraulic_iterations, 10);
        assert_eq!(config.erosion.water_retention, ErosionParams::default().water_retention);
        assert_eq!(config.history, HistoryConfig::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = WorldConfig::from_json_str(r#"{"terrain": {"sea_level": 1.5}}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidConfig(_)));
        assert!(matches!(WorldConfig::from_json_str("{not json"), Err(GenerationError::Config(_))));
    }

    #[test]
    fn test_invalid_request_fails_before_any_stage() {
        let mut stages = Vec::new();
        let result = generate_with(&GenerationRequest::new("", 8, 8), &WorldConfig::default(), &mut |s: &str| {
            stages.push(s.to_string())
        });
        assert!(result.is_err());
        assert!(stages.is_empty());
    }

    #[test]
    fn test_county_graph_mirrors_neighbors() {
        let mut world = World::new("g", 4, 4);
        let mut a = County::new(CountyId(0), (0, 0));
        let mut b = County::new(CountyId(1), (3, 3));
        a.neighbors.push(CountyId(1));
        b.neighbors.push(CountyId(0));
        world.counties = vec![a, b];
        assert_eq!(world.county_graph(), vec![vec![1], vec![0]]);
    }
}
