//! Erosion simulation module
//!
//! Two passes run after the heightmap is shaped:
//! - **Hydraulic erosion**: particle-based water droplets wear slopes and fill basins
//! - **River tracing**: steepest-descent paths that accumulate flow toward the sea

pub mod hydraulic;
pub mod params;
pub mod rivers;

pub use params::ErosionParams;

use rand::Rng;
use tracing::debug;

use crate::tilemap::Tilemap;

/// Statistics from erosion simulation
#[derive(Clone, Debug, Default)]
pub struct ErosionStats {
    /// Total material removed from the terrain
    pub total_eroded: f64,
    /// Total material added back by deposition
    pub total_deposited: f64,
    /// Droplet steps across all droplets
    pub steps_taken: usize,
    /// Droplets simulated
    pub iterations: usize,
    /// Largest single erosion event
    pub max_erosion: f32,
    /// Largest single deposition event
    pub max_deposition: f32,
    /// Cells visited by each traced river
    pub river_lengths: Vec<usize>,
}

/// Run hydraulic erosion over the heightmap, re-normalizing it afterwards.
pub fn erode(
    heightmap: &mut Tilemap<f32>,
    params: &ErosionParams,
    sea_level: f32,
    rng: &mut impl Rng,
) -> ErosionStats {
    let stats = hydraulic::simulate(heightmap, params, sea_level, rng);
    debug!(
        droplets = stats.iterations,
        steps = stats.steps_taken,
        eroded = stats.total_eroded,
        deposited = stats.total_deposited,
        max_erosion = stats.max_erosion,
        max_deposition = stats.max_deposition,
        "hydraulic erosion finished"
    );
    stats
}

/// Trace rivers and return the flow accumulator.
pub fn rivers(
    heightmap: &mut Tilemap<f32>,
    params: &ErosionParams,
    sea_level: f32,
    rng: &mut impl Rng,
) -> Tilemap<u32> {
    let mut stats = ErosionStats::default();
    let flow = rivers::trace_rivers(heightmap, params, sea_level, rng, &mut stats);
    debug!(
        rivers = stats.river_lengths.len(),
        longest = stats.river_lengths.iter().max().copied().unwrap_or(0),
        "rivers traced"
    );
    flow
}
