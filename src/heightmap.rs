use noise::NoiseFn;
use serde::{Deserialize, Serialize};

use crate::gradient_noise::GradientNoise;
use crate::seeds::{SeedSystem, WorldSeeds};
use crate::tilemap::Tilemap;

// =============================================================================
// TERRAIN PARAMETERS
// =============================================================================

/// Parameters for terrain generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Noise periods across the longer grid side for the first octave
    pub base_frequency: f64,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency multiplier per octave
    pub lacunarity: f64,
    /// Domain warping strength, in noise-space units
    pub warp_strength: f64,
    /// Frequency of the warp field relative to the base frequency
    pub warp_frequency: f64,
    /// Exponent of the radial falloff (higher = flatter center, sharper rim)
    pub falloff_power: f64,
    /// Exponent applied after falloff to sharpen coastlines
    pub sharpen_exponent: f64,
    /// Normalized elevation below which a cell is water
    pub sea_level: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            base_frequency: 3.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
            warp_strength: 0.6,
            warp_frequency: 1.0,
            falloff_power: 2.2,
            sharpen_exponent: 1.2,
            sea_level: 0.42,
        }
    }
}

// =============================================================================
// MAIN HEIGHTMAP GENERATION
// =============================================================================

/// Generate a heightmap normalized to `[0, 1]`:
/// 1. Multi-octave fBm, every octave sampled at domain-warped coordinates
/// 2. Radial falloff so landmasses cluster around the grid center
/// 3. Exponent sharpening, then min-max normalization
pub fn generate_heightmap(
    width: usize,
    height: usize,
    seeds: &WorldSeeds,
    params: &TerrainParams,
) -> Tilemap<f32> {
    let base = GradientNoise::new(&mut seeds.rng(SeedSystem::Heightmap));
    let mut warp_rng = seeds.rng(SeedSystem::Warp);
    let warp_x = GradientNoise::new(&mut warp_rng);
    let warp_y = GradientNoise::new(&mut warp_rng);

    let scale = params.base_frequency / width.max(height) as f64;
    let mut heightmap = Tilemap::new_with(width, height, 0.0f32);

    for y in 0..height {
        for x in 0..width {
            let nx = x as f64 * scale;
            let ny = y as f64 * scale;

            let raw = warped_fbm(&base, &warp_x, &warp_y, nx, ny, params);
            let falloff = radial_falloff(x, y, width, height, params.falloff_power);
            let shaped = (((raw + 1.0) * 0.5) * falloff).max(0.0).powf(params.sharpen_exponent);

            heightmap.set(x, y, shaped as f32);
        }
    }

    heightmap.normalize();
    heightmap
}

/// Fractal sum of noise octaves, each sampled at warped coordinates.
/// Returns roughly `[-1, 1]`.
fn warped_fbm(
    base: &GradientNoise,
    warp_x: &GradientNoise,
    warp_y: &GradientNoise,
    x: f64,
    y: f64,
    params: &TerrainParams,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amplitude = 0.0;

    for octave in 0..params.octaves {
        let sx = x * frequency;
        let sy = y * frequency;
        let wf = params.warp_frequency;
        // Offset the warp sample per octave so octaves are not warped identically
        let offset = octave as f64 * 17.31;
        let dx = warp_x.get([sx * wf + offset, sy * wf]) * params.warp_strength;
        let dy = warp_y.get([sx * wf, sy * wf + offset]) * params.warp_strength;

        total += base.get([sx + dx, sy + dy]) * amplitude;
        max_amplitude += amplitude;
        amplitude *= params.persistence;
        frequency *= params.lacunarity;
    }

    if max_amplitude > 0.0 { total / max_amplitude } else { 0.0 }
}

/// 1.0 at the grid center, falling to 0.0 at the corners.
fn radial_falloff(x: usize, y: usize, width: usize, height: usize, power: f64) -> f64 {
    let cx = (width as f64 - 1.0) * 0.5;
    let cy = (height as f64 - 1.0) * 0.5;
    let dx = if cx > 0.0 { (x as f64 - cx) / cx } else { 0.0 };
    let dy = if cy > 0.0 { (y as f64 - cy) / cy } else { 0.0 };
    let d = ((dx * dx + dy * dy) / 2.0).sqrt();
    (1.0 - d.powf(power)).clamp(0.0, 1.0)
}
