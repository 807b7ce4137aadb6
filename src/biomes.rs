//! Biome classification and per-biome movement/development properties.
//!
//! Biomes come from a fixed decision table over normalized elevation, moisture and
//! temperature. Elevation bands decide ocean, beach, mountain and snow; the remaining
//! land is split by temperature/moisture quadrants. River cells override the table.

use serde::{Deserialize, Serialize};

use crate::tilemap::Tilemap;

/// Movement cost at or above which a biome counts as water.
pub const WATER_COST: u32 = 1000;

// Ocean bands as fractions of the sea level
const DEEP_OCEAN_FRACTION: f32 = 0.6;
const OCEAN_FRACTION: f32 = 0.86;
// Land bands (normalized elevation)
const BEACH_BAND: f32 = 0.03;
const MOUNTAIN_MIN: f32 = 0.75;
const SNOW_MIN: f32 = 0.88;

// Climate quadrants
const FROZEN_TEMP: f32 = 0.2;
const COLD_TEMP: f32 = 0.35;
const HOT_TEMP: f32 = 0.7;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    DeepOcean,
    #[default]
    Ocean,
    CoastalWater,
    River,
    Beach,
    Grassland,
    Forest,
    Jungle,
    Taiga,
    Tundra,
    Desert,
    Mountain,
    Snow,
    Wetland,
    Savanna,
}

impl Biome {
    pub fn all() -> &'static [Biome] {
        &[
            Biome::DeepOcean,
            Biome::Ocean,
            Biome::CoastalWater,
            Biome::River,
            Biome::Beach,
            Biome::Grassland,
            Biome::Forest,
            Biome::Jungle,
            Biome::Taiga,
            Biome::Tundra,
            Biome::Desert,
            Biome::Mountain,
            Biome::Snow,
            Biome::Wetland,
            Biome::Savanna,
        ]
    }

    /// Cost of stepping into a cell of this biome. Water is `WATER_COST` or more.
    pub fn movement_cost(self) -> u32 {
        match self {
            Biome::DeepOcean => 2000,
            Biome::Ocean => 1500,
            Biome::CoastalWater => WATER_COST,
            Biome::Grassland => 1,
            Biome::River | Biome::Beach | Biome::Savanna => 2,
            Biome::Forest => 3,
            Biome::Taiga => 4,
            Biome::Jungle | Biome::Tundra => 5,
            Biome::Desert | Biome::Wetland => 6,
            Biome::Mountain => 12,
            Biome::Snow => 20,
        }
    }

    /// How much the biome contributes to a county's development.
    pub fn development_modifier(self) -> f32 {
        match self {
            Biome::DeepOcean | Biome::Ocean | Biome::CoastalWater | Biome::Snow => 0.0,
            Biome::River => 3.0,
            Biome::Grassland => 2.5,
            Biome::Savanna => 1.8,
            Biome::Beach | Biome::Forest => 1.5,
            Biome::Jungle | Biome::Taiga | Biome::Wetland => 1.0,
            Biome::Mountain => 0.5,
            Biome::Tundra | Biome::Desert => 0.3,
        }
    }

    pub fn is_water(self) -> bool {
        self.movement_cost() >= WATER_COST
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Biome::DeepOcean => "Deep Ocean",
            Biome::Ocean => "Ocean",
            Biome::CoastalWater => "Coastal Water",
            Biome::River => "River",
            Biome::Beach => "Beach",
            Biome::Grassland => "Grassland",
            Biome::Forest => "Forest",
            Biome::Jungle => "Jungle",
            Biome::Taiga => "Taiga",
            Biome::Tundra => "Tundra",
            Biome::Desert => "Desert",
            Biome::Mountain => "Mountain",
            Biome::Snow => "Snow",
            Biome::Wetland => "Wetland",
            Biome::Savanna => "Savanna",
        }
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Decision table for one cell.
pub fn classify(elevation: f32, moisture: f32, temperature: f32, sea_level: f32) -> Biome {
    if elevation < sea_level * DEEP_OCEAN_FRACTION {
        return Biome::DeepOcean;
    }
    if elevation < sea_level * OCEAN_FRACTION {
        return Biome::Ocean;
    }
    if elevation < sea_level {
        return Biome::CoastalWater;
    }
    if elevation < sea_level + BEACH_BAND {
        return Biome::Beach;
    }
    if elevation >= SNOW_MIN {
        return Biome::Snow;
    }
    if elevation >= MOUNTAIN_MIN {
        return Biome::Mountain;
    }

    if temperature < FROZEN_TEMP {
        Biome::Tundra
    } else if temperature < COLD_TEMP {
        if moisture > 0.4 { Biome::Taiga } else { Biome::Tundra }
    } else if temperature > HOT_TEMP {
        if moisture < 0.25 {
            Biome::Desert
        } else if moisture < 0.5 {
            Biome::Savanna
        } else {
            Biome::Jungle
        }
    } else if moisture < 0.2 {
        Biome::Desert
    } else if moisture < 0.45 {
        Biome::Grassland
    } else if moisture < 0.75 {
        Biome::Forest
    } else {
        Biome::Wetland
    }
}

/// Classify every cell; river flow above sea level overrides the table.
pub fn generate_biomes(
    heightmap: &Tilemap<f32>,
    moisture: &Tilemap<f32>,
    temperature: &Tilemap<f32>,
    river_flow: &Tilemap<u32>,
    sea_level: f32,
) -> Tilemap<Biome> {
    let mut biomes = Tilemap::new_with(heightmap.width, heightmap.height, Biome::Ocean);
    for idx in 0..heightmap.len() {
        let elevation = *heightmap.at(idx);
        let biome = if *river_flow.at(idx) > 0 && elevation >= sea_level {
            Biome::River
        } else {
            classify(elevation, *moisture.at(idx), *temperature.at(idx), sea_level)
        };
        *biomes.at_mut(idx) = biome;
    }
    biomes
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEA: f32 = 0.42;

    #[test]
    fn test_elevation_bands() {
        assert_eq!(classify(0.1, 0.5, 0.5, SEA), Biome::DeepOcean);
        assert_eq!(classify(0.3, 0.5, 0.5, SEA), Biome::Ocean);
        assert_eq!(classify(0.40, 0.5, 0.5, SEA), Biome::CoastalWater);
        assert_eq!(classify(0.43, 0.5, 0.5, SEA), Biome::Beach);
        assert_eq!(classify(0.8, 0.5, 0.5, SEA), Biome::Mountain);
        assert_eq!(classify(0.95, 0.5, 0.5, SEA), Biome::Snow);
    }

    #[test]
    fn test_ocean_bands_follow_sea_level() {
        let low = 0.2;
        assert_eq!(classify(0.05, 0.5, 0.5, low), Biome::DeepOcean);
        assert_eq!(classify(0.15, 0.5, 0.5, low), Biome::Ocean);
        assert_eq!(classify(0.19, 0.5, 0.5, low), Biome::CoastalWater);
        // Everything at or above the sea level is land
        for e in [0.2f32, 0.25, 0.3, 0.4, 0.6] {
            assert!(!classify(e, 0.5, 0.5, low).is_water(), "{} classified as water", e);
        }
        assert_eq!(classify(0.3, 0.5, 0.5, low), Biome::Grassland);
    }

    #[test]
    fn test_climate_quadrants() {
        assert_eq!(classify(0.55, 0.3, 0.5, SEA), Biome::Grassland);
        assert_eq!(classify(0.55, 0.6, 0.5, SEA), Biome::Forest);
        assert_eq!(classify(0.55, 0.1, 0.9, SEA), Biome::Desert);
        assert_eq!(classify(0.55, 0.8, 0.9, SEA), Biome::Jungle);
        assert_eq!(classify(0.55, 0.5, 0.1, SEA), Biome::Tundra);
        assert_eq!(classify(0.55, 0.6, 0.3, SEA), Biome::Taiga);
    }

    #[test]
    fn test_water_costs() {
        for biome in Biome::all() {
            let water = matches!(biome, Biome::DeepOcean | Biome::Ocean | Biome::CoastalWater);
            assert_eq!(biome.is_water(), water, "{:?}", biome);
        }
    }

    #[test]
    fn test_river_overrides_table() {
        let heightmap = Tilemap::new_with(2, 1, 0.6f32);
        let moisture = Tilemap::new_with(2, 1, 0.1f32);
        let temperature = Tilemap::new_with(2, 1, 0.9f32);
        let mut flow = Tilemap::new_with(2, 1, 0u32);
        flow.set(1, 0, 3);
        let biomes = generate_biomes(&heightmap, &moisture, &temperature, &flow, SEA);
        assert_eq!(*biomes.get(0, 0), Biome::Desert);
        assert_eq!(*biomes.get(1, 0), Biome::River);
    }
}
