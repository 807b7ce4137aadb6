//! Hydraulic erosion simulation using particle-based water droplets.
//!
//! Each droplet lands on a random cell and walks downhill. At every step its water
//! is shared among the lower 8-neighbors in proportion to the height drop; the
//! droplet follows one of them picked with the same weighting. While it carries less
//! sediment than `flow * Kc` it erodes the cell it leaves, otherwise it deposits the
//! surplus. Water decays by a fixed retention factor so every droplet dies.

use rand::Rng;

use crate::erosion::params::ErosionParams;
use crate::erosion::ErosionStats;
use crate::tilemap::Tilemap;

/// A single water droplet
struct WaterDroplet {
    cell: usize,
    water: f32,
    sediment: f32,
}

/// Run hydraulic erosion simulation.
///
/// Algorithm per droplet:
/// 1. Spawn on a uniformly random cell (droplets in water deposit nothing and die)
/// 2. Collect lower neighbors and the total height drop
/// 3. Outflow = min(water, total drop); capacity = outflow * Kc
/// 4. Under capacity: erode the source cell (never below the chosen target)
///    Over capacity: deposit part of the surplus on the source cell
/// 5. Move to a lower neighbor chosen proportionally to its drop
/// 6. Keep `water_retention` of the water; stop when dry, stuck or at sea
pub fn simulate(
    heightmap: &mut Tilemap<f32>,
    params: &ErosionParams,
    sea_level: f32,
    rng: &mut impl Rng,
) -> ErosionStats {
    let mut stats = ErosionStats {
        iterations: params.hydraulic_iterations,
        ..Default::default()
    };
    let cells = heightmap.len();
    if cells == 0 {
        return stats;
    }

    let mut lower: Vec<(usize, f32)> = Vec::with_capacity(8);

    for _ in 0..params.hydraulic_iterations {
        let mut droplet = WaterDroplet {
            cell: rng.gen_range(0..cells),
            water: params.droplet_initial_water,
            sediment: 0.0,
        };

        for _ in 0..params.droplet_max_steps {
            let here = *heightmap.at(droplet.cell);

            if here < sea_level {
                deposit(heightmap, droplet.cell, droplet.sediment, &mut stats);
                break;
            }

            lower.clear();
            lower.extend(
                heightmap
                    .neighbors_8(droplet.cell)
                    .map(|n| (n, here - *heightmap.at(n)))
                    .filter(|&(_, drop)| drop > 0.0),
            );
            let total_drop: f32 = lower.iter().map(|&(_, d)| d).sum();

            if lower.is_empty() || total_drop <= f32::EPSILON {
                // Pit: the droplet evaporates and leaves its load behind
                deposit(heightmap, droplet.cell, droplet.sediment, &mut stats);
                break;
            }

            let target = pick_weighted(&lower, total_drop, rng);
            let target_drop = lower
                .iter()
                .find(|&&(n, _)| n == target)
                .map(|&(_, d)| d)
                .unwrap_or(0.0);

            let outflow = droplet.water.min(total_drop);
            let capacity = outflow * params.capacity_factor;

            if droplet.sediment < capacity {
                // Never dig the source below the cell the water runs into
                let erode = ((capacity - droplet.sediment) * params.erosion_rate)
                    .min(target_drop * 0.5);
                *heightmap.at_mut(droplet.cell) -= erode;
                droplet.sediment += erode;
                stats.total_eroded += erode as f64;
                stats.max_erosion = stats.max_erosion.max(erode);
            } else {
                let amount = (droplet.sediment - capacity) * params.deposition_rate;
                deposit(heightmap, droplet.cell, amount, &mut stats);
                droplet.sediment -= amount;
            }

            droplet.cell = target;
            droplet.water *= params.water_retention;
            stats.steps_taken += 1;

            if droplet.water < params.droplet_min_water {
                deposit(heightmap, droplet.cell, droplet.sediment, &mut stats);
                break;
            }
        }
    }

    heightmap.normalize();
    stats
}

fn deposit(heightmap: &mut Tilemap<f32>, cell: usize, amount: f32, stats: &mut ErosionStats) {
    if amount <= 0.0 || !amount.is_finite() {
        return;
    }
    *heightmap.at_mut(cell) += amount;
    stats.total_deposited += amount as f64;
    stats.max_deposition = stats.max_deposition.max(amount);
}

/// Pick a neighbor with probability proportional to its height drop.
fn pick_weighted(lower: &[(usize, f32)], total: f32, rng: &mut impl Rng) -> usize {
    let mut roll = rng.gen::<f32>() * total;
    for &(cell, drop) in lower {
        if roll < drop {
            return cell;
        }
        roll -= drop;
    }
    lower[lower.len() - 1].0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::SeededRng;

    fn cone(size: usize) -> Tilemap<f32> {
        let mut map = Tilemap::new_with(size, size, 0.0f32);
        let c = (size as f32 - 1.0) / 2.0;
        for y in 0..size {
            for x in 0..size {
                let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2)).sqrt();
                map.set(x, y, (1.0 - d / c).max(0.0));
            }
        }
        map
    }

    #[test]
    fn test_erosion_moves_material() {
        let mut map = cone(21);
        let before = map.clone();
        let params = ErosionParams { hydraulic_iterations: 2_000, ..Default::default() };
        let mut rng = SeededRng::from_seed_str("erosion").unwrap();
        let stats = simulate(&mut map, &params, 0.1, &mut rng);
        assert!(stats.total_eroded > 0.0);
        assert!(stats.steps_taken > 0);
        assert_ne!(map, before);
    }

    #[test]
    fn test_result_is_renormalized() {
        let mut map = cone(15);
        let params = ErosionParams { hydraulic_iterations: 500, ..Default::default() };
        let mut rng = SeededRng::from_seed_str("erosion").unwrap();
        simulate(&mut map, &params, 0.1, &mut rng);
        let (min, max) = map.range();
        assert!(min.abs() < 1e-6);
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weighted_pick_prefers_steeper_drop() {
        let mut rng = SeededRng::from_seed_str("pick").unwrap();
        let lower = [(1usize, 0.9f32), (2usize, 0.1f32)];
        let steep = (0..1000).filter(|_| pick_weighted(&lower, 1.0, &mut rng) == 1).count();
        assert!(steep > 800);
    }
}
