//! Culture groups and sub-cultures.
//!
//! Hearths are picked greedily from the most developed land counties with a minimum
//! spacing, then painted outward over the county graph. Sub-cultures repeat the same
//! process inside each group's territory.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::expansion::{nearest, Advance, Expansion};
use crate::history::config::SociologyConfig;
use crate::history::finalize::hsv_to_rgb;
use crate::history::naming::{NameGenerator, NamingArchetype};
use crate::history::{CountyId, CultureId, SubCultureId};
use crate::world::World;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CultureGroup {
    pub id: CultureId,
    pub name: String,
    pub color: [u8; 3],
    pub hearth: CountyId,
    pub naming: NamingArchetype,
    pub sub_cultures: Vec<SubCultureId>,
    /// False when the group has a single sub-culture carrying the group name.
    pub composite: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubCulture {
    pub id: SubCultureId,
    pub name: String,
    pub parent: CultureId,
    pub hearth: CountyId,
    pub color: [u8; 3],
}

/// Greedy hearth selection: walk `candidates` in order and keep every county at
/// least `min_distance` away from the hearths already kept.
pub fn spaced_hearths(
    candidates: &[usize],
    centroids: &[(f32, f32)],
    min_distance: f32,
    target: usize,
) -> Vec<usize> {
    let mut hearths: Vec<usize> = Vec::with_capacity(target);
    for &c in candidates {
        if hearths.len() >= target {
            break;
        }
        let (x, y) = centroids[c];
        let spaced = hearths.iter().all(|&h| {
            let (hx, hy) = centroids[h];
            ((hx - x).powi(2) + (hy - y).powi(2)).sqrt() >= min_distance
        });
        if spaced {
            hearths.push(c);
        }
    }
    hearths
}

/// Land counties, most developed first (ties by id).
pub fn development_order(world: &World, filter: impl Fn(usize) -> bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..world.counties.len())
        .filter(|&c| world.counties[c].has_land(&world.biomes) && filter(c))
        .collect();
    order.sort_by(|&a, &b| {
        world.counties[b].development.cmp(&world.counties[a].development).then(a.cmp(&b))
    });
    order
}

/// Place culture hearths and spread culture groups and sub-cultures over all counties.
pub fn spread_cultures(world: &mut World, config: &SociologyConfig, rng: &mut impl Rng) {
    let centroids: Vec<(f32, f32)> = world.counties.iter().map(|c| c.centroid).collect();
    let graph = world.county_graph();

    // Ancient empire cores claim their hearths first
    let mut candidates: Vec<usize> = world.ancient_empires.iter().map(|e| e.core.index()).collect();
    for c in development_order(world, |_| true) {
        if !candidates.contains(&c) {
            candidates.push(c);
        }
    }
    let target = (world.counties.len() / config.counties_per_culture).max(config.min_cultures);
    let min_distance = world.width as f32 / config.hearth_spacing_factor;
    let hearths = spaced_hearths(&candidates, &centroids, min_distance, target);
    if hearths.is_empty() {
        warn!("no land county can host a culture hearth");
        return;
    }

    let counties = &world.counties;
    let expansion = Expansion::new(&graph)
        .sources(hearths.iter().enumerate().map(|(owner, &c)| (c, owner)))
        .run(|step| {
            let mut cost = config.culture_step_cost + counties[step.to].terrain_cost;
            let (from, to) = (&counties[step.from], &counties[step.to]);
            if from.ancient_empire.is_some() && from.ancient_empire == to.ancient_empire {
                cost *= config.ancient_empire_discount;
            }
            Some(Advance::claim(cost))
        });
    let culture_of = fill_unreached(expansion.owner, &hearths, &centroids);

    let mut groups: Vec<CultureGroup> = hearths
        .iter()
        .enumerate()
        .map(|(i, &h)| {
            let naming = world.counties[h].naming;
            CultureGroup {
                id: CultureId::from(i),
                name: NameGenerator::culture_name(naming.style(), rng),
                color: hsv_to_rgb(rng.gen_range(0.0..360.0), 0.55, 0.85),
                hearth: CountyId::from(h),
                naming,
                sub_cultures: Vec::new(),
                composite: true,
            }
        })
        .collect();
    for (c, &group) in culture_of.iter().enumerate() {
        world.counties[c].culture = Some(CultureId::from(group));
    }

    let mut sub_cultures = Vec::new();
    for group in groups.iter_mut() {
        spread_sub_cultures(world, group, &graph, &culture_of, &centroids, config, rng, &mut sub_cultures);
    }

    for polity in world.polities.iter_mut() {
        polity.culture = world.counties[polity.capital.index()].culture;
    }

    info!(groups = groups.len(), sub_cultures = sub_cultures.len(), "spread cultures");
    world.culture_groups = groups;
    world.sub_cultures = sub_cultures;
}

#[allow(clippy::too_many_arguments)]
fn spread_sub_cultures(
    world: &mut World,
    group: &mut CultureGroup,
    graph: &Vec<Vec<usize>>,
    culture_of: &[usize],
    centroids: &[(f32, f32)],
    config: &SociologyConfig,
    rng: &mut impl Rng,
    sub_cultures: &mut Vec<SubCulture>,
) {
    let group_index = group.id.index();
    let territory: Vec<usize> = (0..culture_of.len()).filter(|&c| culture_of[c] == group_index).collect();
    let candidates = development_order(world, |c| culture_of[c] == group_index);
    let target = (territory.len() / config.counties_per_subculture).max(1);
    let min_distance = world.width as f32 / (config.hearth_spacing_factor * 2.0);
    let mut hearths = spaced_hearths(&candidates, centroids, min_distance, target);
    if hearths.is_empty() {
        hearths.push(group.hearth.index());
    }

    let counties = &world.counties;
    let expansion = Expansion::new(graph)
        .sources(hearths.iter().enumerate().map(|(owner, &c)| (c, owner)))
        .within(|node, _| culture_of[node] == group_index)
        .run(|step| Some(Advance::claim(config.culture_step_cost + counties[step.to].terrain_cost)));

    let hearth_points: Vec<(f32, f32)> = hearths.iter().map(|&h| centroids[h]).collect();
    group.composite = hearths.len() > 1;
    let first_id = sub_cultures.len();
    for (i, &h) in hearths.iter().enumerate() {
        let id = SubCultureId::from(first_id + i);
        let name = if group.composite {
            NameGenerator::culture_name(group.naming.style(), rng)
        } else {
            group.name.clone()
        };
        let shade = rng.gen_range(0.6..1.0);
        let color = group.color.map(|ch| (ch as f32 * shade) as u8);
        sub_cultures.push(SubCulture { id, name, parent: group.id, hearth: CountyId::from(h), color });
        group.sub_cultures.push(id);
    }

    for &c in &territory {
        let local = expansion.owner[c].or_else(|| {
            let (x, y) = centroids[c];
            nearest(&hearth_points, x, y)
        });
        if let Some(local) = local {
            world.counties[c].sub_culture = Some(SubCultureId::from(first_id + local));
        }
    }
}

/// Give every unreached county the owner of its nearest hearth.
fn fill_unreached(owner: Vec<Option<usize>>, hearths: &[usize], centroids: &[(f32, f32)]) -> Vec<usize> {
    let hearth_points: Vec<(f32, f32)> = hearths.iter().map(|&h| centroids[h]).collect();
    let mut unreached = 0;
    let filled: Vec<usize> = owner
        .into_iter()
        .enumerate()
        .map(|(c, o)| {
            o.unwrap_or_else(|| {
                unreached += 1;
                let (x, y) = centroids[c];
                nearest(&hearth_points, x, y).unwrap_or(0)
            })
        })
        .collect();
    if unreached > 0 {
        warn!(counties = unreached, "assigned unreached counties to the nearest hearth");
    }
    filled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacing_skips_close_candidates() {
        let centroids = [(0.0, 0.0), (1.0, 0.0), (10.0, 0.0), (20.0, 0.0)];
        let hearths = spaced_hearths(&[0, 1, 2, 3], &centroids, 5.0, 3);
        assert_eq!(hearths, vec![0, 2, 3]);
        assert_eq!(spaced_hearths(&[0, 1, 2, 3], &centroids, 5.0, 1), vec![0]);
    }

    #[test]
    fn test_fill_unreached_uses_nearest_hearth() {
        let centroids = [(0.0, 0.0), (10.0, 0.0), (9.0, 0.0)];
        let filled = fill_unreached(vec![Some(0), Some(1), None], &[0, 1], &centroids);
        assert_eq!(filled, vec![0, 1, 1]);
    }
}
