//! Climate system for generating temperature and moisture maps
//! Based on latitude, elevation, and proximity to water

use noise::NoiseFn;
use serde::{Deserialize, Serialize};

use crate::gradient_noise::GradientNoise;
use crate::seeds::{SeedSystem, WorldSeeds};
use crate::tilemap::Tilemap;

// =============================================================================
// CLIMATE CONFIGURATION
// =============================================================================

/// Climate simulation mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClimateMode {
    /// Temperature varies by latitude (cold top and bottom rows, warm middle)
    #[default]
    Globe,
    /// Uniform base temperature; only elevation matters
    Flat,
    /// A mid-latitude strip with mild variation
    TemperateBand,
    /// An equatorial strip, warm throughout
    TropicalBand,
}

impl ClimateMode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Globe => "Latitude-based (poles to equator)",
            Self::Flat => "Uniform temperature (elevation only)",
            Self::TemperateBand => "Mid-latitude region (temperate)",
            Self::TropicalBand => "Equatorial region (tropical)",
        }
    }

    /// Base temperature before elevation damping, for `latitude` in `[0, 1]`
    /// (0 = vertical center, 1 = top/bottom edge).
    fn base_temperature(self, latitude: f32) -> f32 {
        match self {
            Self::Globe => 1.0 - latitude,
            Self::Flat => 0.6,
            Self::TemperateBand => 0.55 - latitude * 0.15,
            Self::TropicalBand => 0.9 - latitude * 0.1,
        }
    }
}

impl std::fmt::Display for ClimateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Globe => write!(f, "globe"),
            Self::Flat => write!(f, "flat"),
            Self::TemperateBand => write!(f, "temperate"),
            Self::TropicalBand => write!(f, "tropical"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClimateParams {
    pub mode: ClimateMode,
    /// Cells within this distance of water receive moisture from it
    pub moisture_radius: usize,
    /// Weight of the noise term in the final moisture blend
    pub moisture_noise_weight: f32,
    /// Frequency of the moisture noise, in periods across the longer side
    pub moisture_noise_frequency: f64,
    /// How strongly elevation above sea level cools a cell
    pub elevation_damping: f32,
}

impl Default for ClimateParams {
    fn default() -> Self {
        Self {
            mode: ClimateMode::Globe,
            moisture_radius: 20,
            moisture_noise_weight: 0.3,
            moisture_noise_frequency: 4.0,
            elevation_damping: 0.6,
        }
    }
}

// =============================================================================
// TEMPERATURE
// =============================================================================

/// Temperature from latitude, damped by elevation above sea level, normalized to `[0, 1]`.
pub fn generate_temperature(
    heightmap: &Tilemap<f32>,
    sea_level: f32,
    params: &ClimateParams,
) -> Tilemap<f32> {
    let (width, height) = (heightmap.width, heightmap.height);
    let mut temperature = Tilemap::new_with(width, height, 0.0f32);
    let center = (height as f32 - 1.0) * 0.5;
    let land_span = (1.0 - sea_level).max(f32::EPSILON);

    for y in 0..height {
        let latitude = if center > 0.0 { (y as f32 - center).abs() / center } else { 0.0 };
        let base = params.mode.base_temperature(latitude);
        for x in 0..width {
            let above_sea = ((*heightmap.get(x, y) - sea_level) / land_span).max(0.0);
            temperature.set(x, y, base - above_sea * params.elevation_damping);
        }
    }

    temperature.normalize();
    temperature
}

// =============================================================================
// MOISTURE
// =============================================================================

/// Moisture from inverse-distance contributions of nearby water and river cells,
/// blended with noise and normalized to `[0, 1]`.
pub fn generate_moisture(
    heightmap: &Tilemap<f32>,
    river_flow: &Tilemap<u32>,
    sea_level: f32,
    seeds: &WorldSeeds,
    params: &ClimateParams,
) -> Tilemap<f32> {
    let (width, height) = (heightmap.width, heightmap.height);
    let is_wet: Vec<bool> = (0..heightmap.len())
        .map(|i| *heightmap.at(i) < sea_level || *river_flow.at(i) > 0)
        .collect();

    let radius = params.moisture_radius as i64;
    let radius_sq = (radius * radius) as f32;
    let mut accumulated = Tilemap::new_with(width, height, 0.0f32);

    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut total = 0.0f32;
            for dy in -radius..=radius {
                let ny = y + dy;
                if ny < 0 || ny >= height as i64 {
                    continue;
                }
                for dx in -radius..=radius {
                    let nx = x + dx;
                    if nx < 0 || nx >= width as i64 {
                        continue;
                    }
                    let dist_sq = (dx * dx + dy * dy) as f32;
                    if dist_sq > radius_sq || !is_wet[ny as usize * width + nx as usize] {
                        continue;
                    }
                    total += 1.0 / (1.0 + dist_sq.sqrt());
                }
            }
            accumulated.set(x as usize, y as usize, total);
        }
    }
    accumulated.normalize();

    let noise = GradientNoise::new(&mut seeds.rng(SeedSystem::Moisture));
    let scale = params.moisture_noise_frequency / width.max(height) as f64;
    let w = params.moisture_noise_weight.clamp(0.0, 1.0);

    let mut moisture = Tilemap::new_with(width, height, 0.0f32);
    for (x, y, &wet) in accumulated.iter() {
        let n = ((noise.get([x as f64 * scale, y as f64 * scale]) + 1.0) * 0.5) as f32;
        moisture.set(x, y, wet * (1.0 - w) + n * w);
    }

    moisture.normalize();
    moisture
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equator_warmer_than_poles() {
        let heightmap = Tilemap::new_with(10, 21, 0.5f32);
        let temp = generate_temperature(&heightmap, 0.42, &ClimateParams::default());
        assert!(*temp.get(5, 10) > *temp.get(5, 0));
        assert!(*temp.get(5, 10) > *temp.get(5, 20));
        let (min, max) = temp.range();
        assert!(min >= 0.0 && max <= 1.0);
    }

    #[test]
    fn test_elevation_cools() {
        let mut heightmap = Tilemap::new_with(2, 3, 0.5f32);
        heightmap.set(1, 1, 0.95);
        let params = ClimateParams { mode: ClimateMode::Flat, ..Default::default() };
        let temp = generate_temperature(&heightmap, 0.42, &params);
        assert!(*temp.get(1, 1) < *temp.get(0, 1));
    }

    #[test]
    fn test_moisture_highest_near_water() {
        let mut heightmap = Tilemap::new_with(40, 5, 0.8f32);
        for y in 0..5 {
            heightmap.set(0, y, 0.1);
        }
        let flow = Tilemap::new_with(40, 5, 0u32);
        let seeds = WorldSeeds::from_master("alpha").unwrap();
        let params = ClimateParams { moisture_noise_weight: 0.0, ..Default::default() };
        let moisture = generate_moisture(&heightmap, &flow, 0.42, &seeds, &params);
        assert!(*moisture.get(1, 2) > *moisture.get(30, 2));
        // Beyond the radius nothing reaches
        assert_eq!(*moisture.get(39, 2), 0.0);
    }
}
