//! Erosion and river simulation parameters

use serde::{Deserialize, Serialize};

/// Global erosion simulation parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErosionParams {
    // =========================================================================
    // Hydraulic Erosion Parameters
    // =========================================================================

    /// Number of water droplets to simulate (default: 75000)
    pub hydraulic_iterations: usize,

    /// Maximum path length (steps) per droplet
    pub droplet_max_steps: usize,

    /// Initial water volume for each droplet
    pub droplet_initial_water: f32,

    /// Sediment carrying capacity multiplier: `capacity = flow * Kc`
    pub capacity_factor: f32,

    /// Fraction of the capacity deficit taken from the source cell per step
    pub erosion_rate: f32,

    /// Fraction of the capacity surplus dropped per step
    pub deposition_rate: f32,

    /// Share of water a droplet keeps after each step (0.0-1.0)
    pub water_retention: f32,

    /// Minimum water volume before droplet dies
    pub droplet_min_water: f32,

    // =========================================================================
    // River Tracing Parameters
    // =========================================================================

    /// Minimum normalized elevation for a river source
    pub river_source_elevation: f32,

    /// Number of source candidates sampled per 1000 cells
    pub river_sources_per_1000_cells: f32,

    /// Depth a pit outlet is carved below the pit floor to keep water moving
    pub river_carve_depth: f32,
}

impl Default for ErosionParams {
    fn default() -> Self {
        Self {
            hydraulic_iterations: 75_000,
            droplet_max_steps: 48,
            droplet_initial_water: 1.0,
            capacity_factor: 0.35,
            erosion_rate: 0.05,
            deposition_rate: 0.3,
            water_retention: 0.9,
            droplet_min_water: 0.01,
            river_source_elevation: 0.65,
            river_sources_per_1000_cells: 8.0,
            river_carve_depth: 0.002,
        }
    }
}
