//! Realm forming: promotion, vassalization by claim score, sub-infeudation and
//! exclave repair, followed by power and title assignment.

use std::collections::{BTreeMap, BTreeSet};

use ordered_float::OrderedFloat;
use tracing::{debug, info};

use crate::error::Result;
use crate::history::civilizations::polity::{
    check_acyclic, realm_of, set_suzerain, subtree, update_raw_power, update_realm_power, Polity,
};
use crate::history::civilizations::titles::{assign_titles, rename_single_children, TitleTier};
use crate::history::config::PoliticsConfig;
use crate::history::{CountyId, PolityId};
use crate::world::World;

/// Build vassal hierarchies out of the base polities.
pub fn form_realms(world: &mut World, config: &PoliticsConfig) -> Result<()> {
    let leaders = promote_leaders(&world.polities, config);
    let claim_range = config.claim_range * world.width.max(world.height) as f32;
    let claimed = vassalize_by_claims(world, &leaders, claim_range);
    subinfeudate(&mut world.polities, &leaders, config);

    let borders = county_borders(world);
    repair_exclaves(world, &borders)?;

    update_raw_power(world);
    update_realm_power(&mut world.polities, config)?;
    assign_titles(&mut world.polities, config);
    rename_single_children(&mut world.polities, &mut world.counties);
    check_acyclic(&world.polities)?;

    info!(
        leaders = leaders.len(),
        vassals = claimed,
        realms = world.polities.iter().filter(|p| p.is_independent()).count(),
        "formed realms"
    );
    Ok(())
}

/// Preliminary tier a polity's raw power earns for promotion.
fn preliminary_tier(power: u32, config: &PoliticsConfig) -> Option<TitleTier> {
    if power >= config.empire_promotion {
        Some(TitleTier::Empire)
    } else if power >= config.kingdom_promotion {
        Some(TitleTier::Kingdom)
    } else if power >= config.principality_promotion {
        Some(TitleTier::GrandDuchy)
    } else {
        None
    }
}

/// Strongest polities crossing a promotion threshold, up to the cap. The strongest
/// polity always leads a realm.
pub fn promote_leaders(polities: &[Polity], config: &PoliticsConfig) -> Vec<PolityId> {
    let mut order: Vec<&Polity> = polities.iter().collect();
    order.sort_by(|a, b| b.power.cmp(&a.power).then(a.id.cmp(&b.id)));

    let mut leaders = Vec::new();
    for (i, polity) in order.iter().enumerate() {
        if leaders.len() >= config.realm_leader_cap {
            break;
        }
        let tier = preliminary_tier(polity.power, config);
        if tier.is_some() || i == 0 {
            debug!(polity = %polity.id, power = polity.power, ?tier, "promoted realm leader");
            leaders.push(polity.id);
        }
    }
    leaders
}

fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Global auction over every (leader, target) claim scored `power / (distance + 1)`.
/// Returns the number of polities vassalized.
fn vassalize_by_claims(world: &mut World, leaders: &[PolityId], claim_range: f32) -> usize {
    let is_leader: BTreeSet<PolityId> = leaders.iter().copied().collect();
    let capital_at = |p: &Polity| world.counties[p.capital.index()].centroid;

    let mut claims: Vec<(OrderedFloat<f32>, PolityId, PolityId)> = Vec::new();
    for &leader in leaders {
        let lp = &world.polities[leader.index()];
        for target in world.polities.iter().filter(|p| !is_leader.contains(&p.id)) {
            let d = distance(capital_at(lp), capital_at(target));
            if d <= claim_range {
                claims.push((OrderedFloat(lp.power as f32 / (d + 1.0)), leader, target.id));
            }
        }
    }
    claims.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut claimed = 0;
    for (_, leader, target) in claims {
        if world.polities[target.index()].suzerain.is_none() {
            set_suzerain(&mut world.polities, target, Some(leader));
            claimed += 1;
        }
    }
    claimed
}

/// Duchy-tier vassals take weaker County-tier siblings as their own vassals,
/// smallest first, while the taken power stays within their share.
fn subinfeudate(polities: &mut [Polity], leaders: &[PolityId], config: &PoliticsConfig) {
    for &leader in leaders {
        let mut dukes: Vec<PolityId> = polities[leader.index()]
            .vassals
            .iter()
            .copied()
            .filter(|v| polities[v.index()].power >= config.duchy_power)
            .collect();
        dukes.sort_by(|a, b| polities[b.index()].power.cmp(&polities[a.index()].power).then(a.cmp(b)));

        for duke in dukes {
            let duke_power = polities[duke.index()].power;
            let budget = duke_power as f32 * config.subinfeudation_share;
            let mut candidates: Vec<PolityId> = polities[leader.index()]
                .vassals
                .iter()
                .copied()
                .filter(|&v| {
                    let p = &polities[v.index()];
                    v != duke && p.power < config.duchy_power && p.power < duke_power && p.vassals.is_empty()
                })
                .collect();
            candidates.sort_by(|a, b| polities[a.index()].power.cmp(&polities[b.index()].power).then(a.cmp(b)));

            let mut taken = 0.0f32;
            for candidate in candidates {
                let power = polities[candidate.index()].power as f32;
                if taken + power > budget {
                    break;
                }
                set_suzerain(polities, candidate, Some(duke));
                taken += power;
                debug!(duke = %duke, vassal = %candidate, "sub-infeudated");
            }
        }
    }
}

/// Number of shared cell edges between every pair of touching counties.
pub fn county_borders(world: &World) -> Vec<BTreeMap<CountyId, u32>> {
    let mut borders = vec![BTreeMap::new(); world.counties.len()];
    let grid = &world.cell_county;
    for y in 0..grid.height {
        for x in 0..grid.width {
            let Some(a) = *grid.get(x, y) else { continue };
            let right = (x + 1 < grid.width).then(|| *grid.get(x + 1, y)).flatten();
            let down = (y + 1 < grid.height).then(|| *grid.get(x, y + 1)).flatten();
            for b in [right, down].into_iter().flatten() {
                if a != b {
                    *borders[a.index()].entry(b).or_insert(0) += 1;
                    *borders[b.index()].entry(a).or_insert(0) += 1;
                }
            }
        }
    }
    borders
}

/// Key with the largest value; ties keep the smallest key.
fn strongest<K: Copy + Ord>(contacts: &BTreeMap<K, u32>) -> Option<K> {
    let mut best: Option<(K, u32)> = None;
    for (&k, &v) in contacts {
        if best.map_or(true, |(_, bv)| v > bv) {
            best = Some((k, v));
        }
    }
    best.map(|(k, _)| k)
}

/// Move vassals, then single counties, that touch no territory of their own realm
/// but do touch other realms to the realm they border most.
pub fn repair_exclaves(world: &mut World, borders: &[BTreeMap<CountyId, u32>]) -> Result<()> {
    let mut moved_vassals = 0;
    for v in 0..world.polities.len() {
        let vassal = PolityId::from(v);
        if world.polities[v].suzerain.is_none() {
            continue;
        }
        let realm = realm_of(&world.polities, vassal)?;
        let own: BTreeSet<PolityId> = subtree(&world.polities, vassal).into_iter().collect();

        let mut same_realm = 0u32;
        let mut contacts: BTreeMap<PolityId, u32> = BTreeMap::new();
        for county in &world.polities[v].counties {
            for (other, &len) in &borders[county.index()] {
                let Some(owner) = world.counties[other.index()].polity else { continue };
                if own.contains(&owner) {
                    continue;
                }
                let other_realm = realm_of(&world.polities, owner)?;
                if other_realm == realm {
                    same_realm += len;
                } else {
                    *contacts.entry(other_realm).or_insert(0) += len;
                }
            }
        }
        if same_realm == 0 {
            if let Some(target) = strongest(&contacts) {
                set_suzerain(&mut world.polities, vassal, Some(target));
                moved_vassals += 1;
            }
        }
    }

    let mut moved_counties = 0;
    for c in 0..world.counties.len() {
        let county = CountyId::from(c);
        let Some(owner) = world.counties[c].polity else { continue };
        if world.polities[owner.index()].capital == county {
            continue;
        }
        let realm = realm_of(&world.polities, owner)?;

        let mut same_realm = 0u32;
        let mut realm_contacts: BTreeMap<PolityId, u32> = BTreeMap::new();
        let mut polity_contacts: BTreeMap<PolityId, BTreeMap<PolityId, u32>> = BTreeMap::new();
        for (other, &len) in &borders[c] {
            let Some(other_owner) = world.counties[other.index()].polity else { continue };
            let other_realm = realm_of(&world.polities, other_owner)?;
            if other_realm == realm {
                same_realm += len;
            } else {
                *realm_contacts.entry(other_realm).or_insert(0) += len;
                *polity_contacts.entry(other_realm).or_default().entry(other_owner).or_insert(0) += len;
            }
        }
        if same_realm > 0 {
            continue;
        }
        let Some(target_realm) = strongest(&realm_contacts) else { continue };
        let Some(target) = polity_contacts.get(&target_realm).and_then(strongest) else { continue };

        world.polities[owner.index()].counties.retain(|&k| k != county);
        world.polities[target.index()].counties.push(county);
        world.counties[c].polity = Some(target);
        moved_counties += 1;
    }

    if moved_vassals + moved_counties > 0 {
        debug!(vassals = moved_vassals, counties = moved_counties, "repaired exclaves");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::civilizations::polity::tests::arena;
    use crate::history::counties::County;

    /// World whose cells follow `rows` (county ids), with county `i` owned by `owners[i]`.
    fn grid_world(rows: &[&[u32]], owners: &[u32], polities: Vec<Polity>) -> World {
        let mut world = World::new("exclaves", rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, &county) in row.iter().enumerate() {
                world.cell_county.set(x, y, Some(CountyId(county)));
            }
        }
        world.counties = owners
            .iter()
            .enumerate()
            .map(|(i, &owner)| {
                let mut county = County::new(CountyId::from(i), (0, 0));
                county.polity = Some(PolityId(owner));
                county
            })
            .collect();
        world.polities = polities;
        world
    }

    #[test]
    fn test_strongest_always_leads() {
        let polities = arena(&[10, 30, 20]);
        let leaders = promote_leaders(&polities, &PoliticsConfig::default());
        assert_eq!(leaders, vec![PolityId(1)]);
    }

    #[test]
    fn test_promotion_cap() {
        let polities = arena(&[90, 70, 50, 46, 10]);
        let config = PoliticsConfig { realm_leader_cap: 2, ..Default::default() };
        assert_eq!(promote_leaders(&polities, &config), vec![PolityId(0), PolityId(1)]);
        let all = promote_leaders(&polities, &PoliticsConfig::default());
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_subinfeudation_respects_share() {
        // Leader 0 with a duke (power 60) and three small vassals
        let mut polities = arena(&[100, 60, 2, 3, 5]);
        for v in 1..5 {
            set_suzerain(&mut polities, PolityId(v), Some(PolityId(0)));
        }
        subinfeudate(&mut polities, &[PolityId(0)], &PoliticsConfig::default());
        // Budget is 6: the 2 and 3 fit, the 5 does not
        assert_eq!(polities[1].vassals, vec![PolityId(2), PolityId(3)]);
        assert_eq!(polities[4].suzerain, Some(PolityId(0)));
    }

    #[test]
    fn test_strongest_tie_keeps_smallest_key() {
        let mut contacts = BTreeMap::new();
        contacts.insert(PolityId(4), 3);
        contacts.insert(PolityId(2), 3);
        contacts.insert(PolityId(9), 1);
        assert_eq!(strongest(&contacts), Some(PolityId(2)));
    }

    #[test]
    fn test_cut_off_vassal_joins_the_realm_it_borders_most() {
        // P2 is P0's vassal but only touches realms P1 (two edges) and P3 (one edge)
        let mut polities = arena(&[10, 8, 6, 1]);
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(0)));
        let mut world = grid_world(&[&[0, 1, 2], &[0, 1, 2], &[0, 3, 2]], &[0, 1, 2, 3], polities);

        let borders = county_borders(&world);
        assert_eq!(borders[2].get(&CountyId(1)), Some(&2));
        assert_eq!(borders[2].get(&CountyId(3)), Some(&1));
        assert_eq!(borders[2].get(&CountyId(0)), None);

        repair_exclaves(&mut world, &borders).unwrap();
        assert_eq!(world.polities[2].suzerain, Some(PolityId(1)));
        assert_eq!(world.polities[1].vassals, vec![PolityId(2)]);
        assert!(world.polities[0].vassals.is_empty());
        assert!(world.polities[3].vassals.is_empty());
        check_acyclic(&world.polities).unwrap();
    }

    #[test]
    fn test_vassal_touching_its_realm_stays() {
        let mut polities = arena(&[10, 8, 6]);
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(0)));
        let mut world = grid_world(&[&[0, 2, 1]], &[0, 1, 2], polities);

        let borders = county_borders(&world);
        repair_exclaves(&mut world, &borders).unwrap();
        assert_eq!(world.polities[2].suzerain, Some(PolityId(0)));
    }

    #[test]
    fn test_exclave_county_goes_to_its_strongest_neighbor() {
        // C3 belongs to P0 but sits beyond realm P1, touching P1 once and its vassal P2 twice
        let mut polities = arena(&[10, 8, 3]);
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(1)));
        polities[0].counties.push(CountyId(3));
        let mut world = grid_world(&[&[0, 1, 3], &[0, 2, 3], &[0, 2, 3]], &[0, 1, 2, 0], polities);

        let borders = county_borders(&world);
        repair_exclaves(&mut world, &borders).unwrap();

        assert_eq!(world.polities[0].counties, vec![CountyId(0)]);
        assert_eq!(world.polities[2].counties, vec![CountyId(2), CountyId(3)]);
        assert_eq!(world.counties[3].polity, Some(PolityId(2)));
        // P2 shares a border with its own suzerain, so it keeps its place
        assert_eq!(world.polities[2].suzerain, Some(PolityId(1)));
        // Capitals never move
        assert_eq!(world.counties[0].polity, Some(PolityId(0)));
    }
}
