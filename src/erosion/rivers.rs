//! River tracing by steepest descent.
//!
//! Sources are sampled among high cells. Each river walks to its strictly lowest
//! 8-neighbor until it reaches the sea, incrementing the flow accumulator of every
//! cell it crosses. When a path ends in a pit, the lowest unvisited neighbor is carved
//! just below the pit floor and the river spills into it. A per-path visited set and a
//! length bound guarantee termination.

use std::collections::HashSet;

use rand::Rng;

use crate::erosion::params::ErosionParams;
use crate::erosion::ErosionStats;
use crate::tilemap::Tilemap;

/// Trace rivers over `heightmap`, carving pit outlets in place.
///
/// Returns the per-cell flow accumulator (number of river paths through the cell).
pub fn trace_rivers(
    heightmap: &mut Tilemap<f32>,
    params: &ErosionParams,
    sea_level: f32,
    rng: &mut impl Rng,
    stats: &mut ErosionStats,
) -> Tilemap<u32> {
    let mut flow = Tilemap::new_with(heightmap.width, heightmap.height, 0u32);
    if heightmap.is_empty() {
        return flow;
    }

    let candidates =
        ((heightmap.len() as f32 / 1000.0) * params.river_sources_per_1000_cells).ceil() as usize;
    let max_length = (heightmap.width + heightmap.height) * 4;

    for _ in 0..candidates {
        let source = rng.gen_range(0..heightmap.len());
        if *heightmap.at(source) <= params.river_source_elevation {
            continue;
        }
        let length = trace_path(heightmap, &mut flow, source, sea_level, max_length, params);
        stats.river_lengths.push(length);
    }

    flow
}

/// Follow one river from `source`. Returns the number of cells visited.
fn trace_path(
    heightmap: &mut Tilemap<f32>,
    flow: &mut Tilemap<u32>,
    source: usize,
    sea_level: f32,
    max_length: usize,
    params: &ErosionParams,
) -> usize {
    let mut visited: HashSet<usize> = HashSet::new();
    let mut current = source;

    while visited.len() < max_length {
        visited.insert(current);
        *flow.at_mut(current) += 1;

        let here = *heightmap.at(current);
        if here < sea_level {
            break;
        }

        let lowest = lowest_neighbor(heightmap, current, |_| true);
        match lowest {
            Some((next, h)) if h < here && !visited.contains(&next) => {
                current = next;
            }
            _ => {
                // Pit: spill into the lowest neighbor not already on this path
                let Some((outlet, _)) = lowest_neighbor(heightmap, current, |n| !visited.contains(&n))
                else {
                    break;
                };
                *heightmap.at_mut(outlet) = (here - params.river_carve_depth).max(0.0);
                current = outlet;
            }
        }
    }

    visited.len()
}

/// Lowest 8-neighbor passing `filter`, with its elevation. Ties keep the first in
/// clockwise order.
fn lowest_neighbor(
    heightmap: &Tilemap<f32>,
    idx: usize,
    filter: impl Fn(usize) -> bool,
) -> Option<(usize, f32)> {
    heightmap
        .neighbors_8(idx)
        .filter(|&n| filter(n))
        .map(|n| (n, *heightmap.at(n)))
        .fold(None, |best, (n, h)| match best {
            Some((_, bh)) if bh <= h => best,
            _ => Some((n, h)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::SeededRng;

    fn params() -> ErosionParams {
        ErosionParams { river_sources_per_1000_cells: 1000.0, ..Default::default() }
    }

    #[test]
    fn test_river_runs_down_a_ramp_to_the_sea() {
        // Elevation falls from 1.0 on the left to 0.0 on the right
        let mut map = Tilemap::new_with(10, 3, 0.0f32);
        for y in 0..3 {
            for x in 0..10 {
                map.set(x, y, 1.0 - x as f32 / 9.0);
            }
        }
        let mut stats = ErosionStats::default();
        let mut rng = SeededRng::from_seed_str("rivers").unwrap();
        let flow = trace_rivers(&mut map, &params(), 0.42, &mut rng, &mut stats);

        assert!(!stats.river_lengths.is_empty());
        // Every river crosses the column just below sea level
        assert!((0..3).any(|y| *flow.get(6, y) > 0));
    }

    #[test]
    fn test_pit_is_carved_and_path_terminates() {
        // A high plateau with a pit in the middle and no way down except carving
        let mut map = Tilemap::new_with(5, 5, 0.9f32);
        map.set(2, 2, 0.7);
        let before = map.clone();
        let mut flow = Tilemap::new_with(5, 5, 0u32);
        let start = map.index(2, 2);
        let length = trace_path(&mut map, &mut flow, start, 0.42, 40, &params());

        assert!(length <= 40);
        assert!(*flow.get(2, 2) >= 1);
        assert_ne!(map, before);
    }

    #[test]
    fn test_low_sources_are_skipped() {
        let mut map = Tilemap::new_with(8, 8, 0.5f32);
        let mut stats = ErosionStats::default();
        let mut rng = SeededRng::from_seed_str("rivers").unwrap();
        let flow = trace_rivers(&mut map, &params(), 0.42, &mut rng, &mut stats);
        assert!(flow.as_slice().iter().all(|&f| f == 0));
        assert!(stats.river_lengths.is_empty());
    }
}
