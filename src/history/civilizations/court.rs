//! Court: ruling houses, rulers, opinions and the laws of independent rulers.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::info;

use crate::history::civilizations::government::{Laws, SuccessionLaw};
use crate::history::civilizations::polity::{Polity, Ruler};
use crate::history::config::CourtConfig;
use crate::history::entities::Dynasty;
use crate::history::naming::{NameGenerator, NamingArchetype};
use crate::history::{DynastyId, IdGenerator, PolityId};
use crate::world::World;

/// Naming archetype a polity's court speaks: its culture's, else its capital's.
pub fn court_naming(world: &World, polity: &Polity) -> NamingArchetype {
    polity
        .culture
        .and_then(|c| world.culture_groups.get(c.index()))
        .map(|g| g.naming)
        .unwrap_or(world.counties[polity.capital.index()].naming)
}

/// Polities owning counties that share a border, per polity.
pub fn polity_neighbors(world: &World) -> Vec<BTreeSet<PolityId>> {
    let mut neighbors = vec![BTreeSet::new(); world.polities.len()];
    for county in &world.counties {
        let Some(a) = county.polity else { continue };
        for other in &county.neighbors {
            if let Some(b) = world.counties[other.index()].polity {
                if a != b {
                    neighbors[a.index()].insert(b);
                }
            }
        }
    }
    neighbors
}

/// Opinion `from` holds of `to`, clamped to `[-100, 100]`.
pub fn roll_opinion(from: &Polity, to: &Polity, config: &CourtConfig, rng: &mut impl Rng) -> i32 {
    let mut opinion = if from.culture.is_some() && from.culture == to.culture {
        config.same_culture_opinion
    } else {
        config.different_culture_opinion
    };
    opinion += if from.religion == to.religion {
        config.same_religion_opinion
    } else {
        config.different_religion_opinion
    };
    opinion += (to.ruler.diplomacy as i32 - 5) * config.diplomacy_opinion;
    if config.opinion_jitter > 0 {
        opinion += rng.gen_range(-config.opinion_jitter..=config.opinion_jitter);
    }
    opinion.clamp(-100, 100)
}

/// Extra opinion a vassal holds of its suzerain: a standing grievance plus resentment
/// that grows with the suzerain's share of their combined realm power.
pub fn vassal_grievance(vassal: &Polity, suzerain: &Polity, config: &CourtConfig) -> i32 {
    let total = vassal.realm_power + suzerain.realm_power;
    let dominance = if total > 0.0 { suzerain.realm_power / total } else { 0.5 };
    config.vassal_grievance + (config.dominance_resentment as f32 * dominance).round() as i32
}

/// Opinion `vassal` holds of `suzerain`, clamped to `[-100, 100]`.
pub fn roll_vassal_opinion(vassal: &Polity, suzerain: &Polity, config: &CourtConfig, rng: &mut impl Rng) -> i32 {
    let opinion = roll_opinion(vassal, suzerain, config, rng);
    (opinion + vassal_grievance(vassal, suzerain, config)).clamp(-100, 100)
}

/// Found ruling houses, crown a ruler in every polity and roll opinions toward the
/// suzerain and every bordering polity.
pub fn crown_rulers(world: &mut World, config: &CourtConfig, rng: &mut impl Rng) {
    let mut ids = IdGenerator::new();
    let mut dynasties = Vec::new();

    for p in 0..world.polities.len() {
        let naming = court_naming(world, &world.polities[p]);
        let polity = &world.polities[p];
        if polity.government.has_dynasty() {
            let id: DynastyId = ids.next_id();
            let name = NameGenerator::house_name(naming.style(), rng);
            dynasties.push(Dynasty::new(id, name, polity.culture, polity.id));
            world.polities[p].dynasty = Some(id);
        }
        world.polities[p].ruler = Ruler {
            name: NameGenerator::personal_name(naming.style(), rng),
            diplomacy: rng.gen_range(0..=10),
            martial: rng.gen_range(0..=10),
            stewardship: rng.gen_range(0..=10),
        };
    }

    let neighbors = polity_neighbors(world);
    for p in 0..world.polities.len() {
        let mut targets: BTreeSet<PolityId> = neighbors[p].clone();
        if let Some(suzerain) = world.polities[p].suzerain {
            targets.insert(suzerain);
        }
        for target in targets {
            let (from, to) = (&world.polities[p], &world.polities[target.index()]);
            let opinion = if from.suzerain == Some(target) {
                roll_vassal_opinion(from, to, config, rng)
            } else {
                roll_opinion(from, to, config, rng)
            };
            world.polities[p].opinions.insert(target, opinion);
        }
    }

    info!(dynasties = dynasties.len(), rulers = world.polities.len(), "crowned rulers");
    world.dynasties = dynasties;
}

/// Independent rulers hold laws; vassals live under their realm's. A ruler without a
/// house cannot pass the crown by blood and is always elected.
pub fn assign_laws(polities: &mut [Polity], rng: &mut impl Rng) {
    for polity in polities.iter_mut() {
        if !polity.is_independent() {
            polity.laws = None;
            continue;
        }
        let mut laws = Laws::roll(polity.government, rng);
        if polity.dynasty.is_none() && laws.succession.requires_dynasty() {
            laws.succession = SuccessionLaw::Elective;
        }
        polity.laws = Some(laws);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::civilizations::diplomacy::liberty_desire;
    use crate::history::civilizations::polity::{set_suzerain, tests::arena};
    use crate::history::{CultureId, ReligionId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_opinion_components() {
        let mut polities = arena(&[10, 10]);
        for p in polities.iter_mut() {
            p.culture = Some(CultureId(0));
            p.religion = Some(ReligionId(0));
        }
        polities[1].ruler.diplomacy = 10;
        let config = CourtConfig { opinion_jitter: 0, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(roll_opinion(&polities[0], &polities[1], &config, &mut rng), 10 + 10 + 40);

        polities[1].culture = Some(CultureId(1));
        polities[1].religion = Some(ReligionId(2));
        polities[1].ruler.diplomacy = 0;
        assert_eq!(roll_opinion(&polities[0], &polities[1], &config, &mut rng), -15 - 10 - 40);
    }

    #[test]
    fn test_opinion_is_clamped() {
        let polities = arena(&[1, 1]);
        let config = CourtConfig { same_religion_opinion: 500, opinion_jitter: 0, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(roll_opinion(&polities[0], &polities[1], &config, &mut rng), 100);
    }

    #[test]
    fn test_grievance_grows_with_dominance() {
        let mut polities = arena(&[30, 10]);
        polities[0].realm_power = 30.0;
        polities[1].realm_power = 10.0;
        let config = CourtConfig::default();
        // Suzerain holds three quarters of the pair's power
        assert_eq!(vassal_grievance(&polities[1], &polities[0], &config), -20 - 38);

        polities[0].realm_power = 10.0;
        assert_eq!(vassal_grievance(&polities[1], &polities[0], &config), -20 - 25);

        let quiet = CourtConfig { vassal_grievance: 0, dominance_resentment: 0, ..Default::default() };
        assert_eq!(vassal_grievance(&polities[1], &polities[0], &quiet), 0);
    }

    #[test]
    fn test_vassal_of_a_distant_lord_can_reach_faction_territory() {
        let mut polities = arena(&[90, 10]);
        polities[0].realm_power = 90.0;
        polities[1].realm_power = 10.0;
        polities[0].culture = Some(CultureId(0));
        polities[1].culture = Some(CultureId(1));
        polities[0].ruler.diplomacy = 1;
        let config = CourtConfig { opinion_jitter: 0, ..Default::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let opinion = roll_vassal_opinion(&polities[1], &polities[0], &config, &mut rng);
        // -15 culture, +10 religion, -32 diplomacy, -20 grievance, -45 dominance
        assert_eq!(opinion, -100);
        let liberty = liberty_desire(0.3, opinion, 1, 5.0);
        assert!(liberty > 50, "liberty {}", liberty);
    }

    #[test]
    fn test_only_independents_hold_laws() {
        let mut polities = arena(&[10, 5]);
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        assign_laws(&mut polities, &mut ChaCha8Rng::seed_from_u64(3));
        // No dynasty in the arena, so every ruler is elected
        assert_eq!(polities[0].laws.map(|l| l.succession), Some(SuccessionLaw::Elective));
        assert!(polities[1].laws.is_none());
    }
}
