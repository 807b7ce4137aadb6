//! Religion system: folk faith, cultural religions and universalist religions.
//!
//! Every county starts on the folk religion. Cultural religions appear at the most
//! developed county of well developed cultures; universalist religions are placed at
//! high-development counties. All of them then spread in one joint expansion where
//! each step pays the destination's resistance, until their reach runs out.

pub mod worship;

pub use worship::{Religion, ReligionBranch, ReligionKind};

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::expansion::{Advance, Expansion};
use crate::history::config::SociologyConfig;
use crate::history::counties::County;
use crate::history::entities::culture::development_order;
use crate::history::finalize::hsv_to_rgb;
use crate::history::naming::NameGenerator;
use crate::history::{CountyId, CultureId, ReligionId};
use crate::world::World;

/// Resistance a county puts up against any religion entering it.
pub fn county_resistance(county: &County, config: &SociologyConfig) -> f32 {
    let raw = config.resistance_base - 3.0 * county.development as f32 + county.terrain_cost;
    raw.max(config.resistance_floor)
}

/// Place religion hearths and spread every religion over the county graph.
pub fn spread_religions(world: &mut World, config: &SociologyConfig, rng: &mut impl Rng) {
    let mut religions = vec![Religion::folk()];
    let mut claimed: BTreeSet<usize> = BTreeSet::new();

    // Cultural religions
    for group in &world.culture_groups {
        let group_id = group.id;
        let Some(&top) = development_order(world, |c| world.counties[c].culture == Some(group_id)).first()
        else {
            continue;
        };
        if world.counties[top].development < config.cultural_religion_development
            || !rng.gen_bool(config.cultural_religion_chance)
        {
            continue;
        }
        religions.push(Religion {
            id: ReligionId::from(religions.len()),
            name: NameGenerator::faith_name(group.naming.style(), rng),
            kind: ReligionKind::Cultural,
            branch: ReligionBranch::Mainstream,
            origin_culture: Some(group_id),
            hearth: Some(CountyId::from(top)),
            color: hsv_to_rgb(rng.gen_range(0.0..360.0), 0.45, 0.75),
        });
        claimed.insert(top);
    }
    let cultural = religions.len() - 1;

    // Universalist religions, lowering the development bar until a hearth is found
    let target = rng.gen_range(config.universalist_min..=config.universalist_max);
    for _ in 0..target {
        let Some(hearth) = pick_universalist_hearth(world, &claimed, config, rng) else {
            debug!("no land county left for a universalist hearth");
            break;
        };
        claimed.insert(hearth);
        let branch = if rng.gen_bool(config.fringe_chance) { ReligionBranch::Fringe } else { ReligionBranch::Mainstream };
        let style = world.counties[hearth].naming.style();
        religions.push(Religion {
            id: ReligionId::from(religions.len()),
            name: NameGenerator::faith_name(style, rng),
            kind: ReligionKind::Universalist,
            branch,
            origin_culture: None,
            hearth: Some(CountyId::from(hearth)),
            color: hsv_to_rgb(rng.gen_range(0.0..360.0), 0.65, 0.9),
        });
    }

    let graph = world.county_graph();
    let counties = &world.counties;
    let origin: Vec<Option<CultureId>> = religions.iter().map(|r| r.origin_culture).collect();
    let reach: Vec<f32> = religions.iter().map(|r| r.reach(config)).collect();
    let modifier: Vec<f32> = religions.iter().map(|r| r.resistance_modifier(config)).collect();

    let expansion = Expansion::new(&graph)
        .sources(religions.iter().filter_map(|r| r.hearth.map(|h| (h.index(), r.id.index()))))
        .within(|node, owner| match origin[owner] {
            Some(culture) => counties[node].culture == Some(culture),
            None => true,
        })
        .run(|step| {
            let resistance =
                (county_resistance(&counties[step.to], config) + modifier[step.owner]).max(config.resistance_floor);
            (step.cost + resistance <= reach[step.owner]).then(|| Advance::claim(resistance))
        });

    for (c, owner) in expansion.owner.iter().enumerate() {
        world.counties[c].religion = ReligionId::from(owner.unwrap_or(0));
    }
    for polity in world.polities.iter_mut() {
        polity.religion = Some(world.counties[polity.capital.index()].religion);
    }

    let folk = world.counties.iter().filter(|c| c.religion == ReligionId(0)).count();
    info!(
        cultural,
        universalist = religions.len() - 1 - cultural,
        folk_counties = folk,
        "spread religions"
    );
    world.religions = religions;
}

/// Random county meeting the highest satisfiable development threshold, falling back
/// to any unclaimed land county.
fn pick_universalist_hearth(
    world: &World,
    claimed: &BTreeSet<usize>,
    config: &SociologyConfig,
    rng: &mut impl Rng,
) -> Option<usize> {
    let open = development_order(world, |c| !claimed.contains(&c));
    for &threshold in &config.universalist_thresholds {
        let eligible: Vec<usize> =
            open.iter().copied().filter(|&c| world.counties[c].development >= threshold).collect();
        if let Some(&hearth) = eligible.choose(rng) {
            return Some(hearth);
        }
    }
    open.choose(rng).copied()
}
