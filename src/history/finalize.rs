//! Final pass before the snapshot is emitted: cull landless polities, keep relation
//! lists symmetric, place labels and color the realms.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{info, warn};

use crate::error::Result;
use crate::history::civilizations::polity::{check_acyclic, post_order, subtree, Polity};
use crate::history::{AllianceId, DynastyId, PolityId};
use crate::world::World;

/// HSV (hue in degrees, saturation and value in `[0, 1]`) to RGB.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [u8; 3] {
    let h = h.rem_euclid(360.0) / 60.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    [r, g, b].map(|ch| ((ch + m) * 255.0).round().clamp(0.0, 255.0) as u8)
}

/// Move a color a fraction of the way toward white.
fn tint(color: [u8; 3], amount: f32) -> [u8; 3] {
    color.map(|ch| (ch as f32 + (255.0 - ch as f32) * amount).round() as u8)
}

/// Run every finalization step in order.
pub fn finalize(world: &mut World, rng: &mut impl Rng) -> Result<()> {
    check_acyclic(&world.polities)?;
    let culled = cull_landless(world);
    enforce_symmetry(&mut world.polities);
    place_labels(world);
    color_realms(&mut world.polities, rng);
    check_acyclic(&world.polities)?;

    info!(
        culled,
        polities = world.polities.len(),
        realms = world.polities.iter().filter(|p| p.is_independent()).count(),
        "finalized world"
    );
    Ok(())
}

// =============================================================================
// CULLING
// =============================================================================

/// Drop polities whose whole subtree owns no county and renumber the rest densely.
/// Returns the number of polities removed.
pub fn cull_landless(world: &mut World) -> usize {
    let mut landed = vec![false; world.polities.len()];
    for id in post_order(&world.polities) {
        let polity = &world.polities[id.index()];
        landed[id.index()] = !polity.counties.is_empty() || polity.vassals.iter().any(|v| landed[v.index()]);
    }
    let culled = landed.iter().filter(|&&l| !l).count();
    if culled == 0 {
        return 0;
    }

    let mut remap: BTreeMap<PolityId, PolityId> = BTreeMap::new();
    for (old, _) in landed.iter().enumerate().filter(|(_, &l)| l) {
        remap.insert(PolityId::from(old), PolityId::from(remap.len()));
    }
    let map = |id: PolityId| remap.get(&id).copied();
    let map_all = |ids: &[PolityId]| ids.iter().filter_map(|&id| map(id)).collect::<Vec<_>>();

    let polities = std::mem::take(&mut world.polities);
    for mut polity in polities {
        let Some(id) = map(polity.id) else { continue };
        polity.id = id;
        polity.suzerain = polity.suzerain.and_then(map);
        polity.vassals = map_all(&polity.vassals);
        polity.allies = map_all(&polity.allies);
        polity.at_war_with = map_all(&polity.at_war_with);
        polity.opinions = polity.opinions.into_iter().filter_map(|(k, v)| map(k).map(|k| (k, v))).collect();
        polity.factions.retain_mut(|f| {
            let Some(leader) = map(f.leader) else { return false };
            f.leader = leader;
            f.members = map_all(&f.members);
            f.members.len() > 1
        });
        world.polities.push(polity);
    }

    for county in world.counties.iter_mut() {
        county.polity = county.polity.and_then(map);
    }

    // Dynasties seated in culled polities go with them
    let mut dynasty_remap: BTreeMap<DynastyId, DynastyId> = BTreeMap::new();
    world.dynasties.retain_mut(|d| {
        let Some(seat) = map(d.seat) else { return false };
        let id = DynastyId::from(dynasty_remap.len());
        dynasty_remap.insert(d.id, id);
        d.id = id;
        d.seat = seat;
        true
    });

    // Alliances lose culled members; a bloc under two members dissolves
    let mut alliance_remap: BTreeMap<AllianceId, AllianceId> = BTreeMap::new();
    world.alliances.retain_mut(|a| {
        a.members = map_all(&a.members);
        if a.members.len() < 2 {
            return false;
        }
        a.leader = map(a.leader).unwrap_or(a.members[0]);
        let id = AllianceId::from(alliance_remap.len());
        alliance_remap.insert(a.id, id);
        a.id = id;
        true
    });

    for polity in world.polities.iter_mut() {
        polity.dynasty = polity.dynasty.and_then(|d| dynasty_remap.get(&d).copied());
        polity.alliance = polity.alliance.and_then(|a| alliance_remap.get(&a).copied());
        if polity.alliance.is_none() {
            polity.allies.clear();
        }
    }

    warn!(polities = culled, "culled landless polities");
    culled
}

// =============================================================================
// SYMMETRY
// =============================================================================

/// Every ally and war link must point both ways. One-sided links are completed.
pub fn enforce_symmetry(polities: &mut [Polity]) {
    let mut missing: Vec<(PolityId, PolityId, bool)> = Vec::new();
    for polity in polities.iter() {
        for &ally in &polity.allies {
            if !polities[ally.index()].allies.contains(&polity.id) {
                missing.push((ally, polity.id, true));
            }
        }
        for &enemy in &polity.at_war_with {
            if !polities[enemy.index()].at_war_with.contains(&polity.id) {
                missing.push((enemy, polity.id, false));
            }
        }
    }
    if missing.is_empty() {
        return;
    }
    warn!(links = missing.len(), "completed one-sided diplomatic links");
    for (from, to, ally) in missing {
        let list = if ally { &mut polities[from.index()].allies } else { &mut polities[from.index()].at_war_with };
        if !list.contains(&to) {
            list.push(to);
        }
    }
}

// =============================================================================
// LABELS AND COLORS
// =============================================================================

/// Anchor each polity's label on the subtree cell closest to the subtree centroid.
pub fn place_labels(world: &mut World) {
    let width = world.width;
    for p in 0..world.polities.len() {
        let cells: Vec<usize> = subtree(&world.polities, PolityId::from(p))
            .into_iter()
            .flat_map(|id| world.polities[id.index()].counties.iter())
            .flat_map(|c| world.counties[c.index()].cells.iter().copied())
            .collect();
        if cells.is_empty() {
            world.polities[p].label_anchor = None;
            continue;
        }
        let n = cells.len() as f32;
        let (sx, sy) = cells.iter().fold((0.0f32, 0.0f32), |(sx, sy), &c| (sx + (c % width) as f32, sy + (c / width) as f32));
        let (cx, cy) = (sx / n, sy / n);

        let mut best = cells[0];
        let mut best_d = f32::INFINITY;
        for &c in &cells {
            let (x, y) = ((c % width) as f32, (c / width) as f32);
            let d = (x - cx).powi(2) + (y - cy).powi(2);
            if d < best_d || (d == best_d && c < best) {
                best = c;
                best_d = d;
            }
        }
        world.polities[p].label_anchor = Some((best % width, best / width));
    }
}

/// Realms get a random hue; vassals take their suzerain's color, tinted lighter.
pub fn color_realms(polities: &mut [Polity], rng: &mut impl Rng) {
    let roots: Vec<PolityId> = polities.iter().filter(|p| p.is_independent()).map(|p| p.id).collect();
    for root in roots {
        let hue = rng.gen_range(0.0..360.0);
        polities[root.index()].color = hsv_to_rgb(hue, 0.6, 0.85);
        for id in subtree(polities, root).into_iter().skip(1) {
            if let Some(suzerain) = polities[id.index()].suzerain {
                let color = tint(polities[suzerain.index()].color, 0.2);
                polities[id.index()].color = color;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::civilizations::diplomacy::Alliance;
    use crate::history::civilizations::faction::{Faction, FactionKind};
    use crate::history::civilizations::polity::{set_suzerain, tests::arena};
    use crate::history::counties::County;
    use crate::history::entities::lineage::Dynasty;
    use crate::history::{CountyId, FactionId};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), [255, 0, 0]);
        assert_eq!(hsv_to_rgb(120.0, 1.0, 1.0), [0, 255, 0]);
        assert_eq!(hsv_to_rgb(240.0, 1.0, 1.0), [0, 0, 255]);
        assert_eq!(hsv_to_rgb(360.0, 0.0, 0.5), [128, 128, 128]);
    }

    #[test]
    fn test_symmetry_completed() {
        let mut polities = arena(&[1, 1, 1]);
        polities[0].allies.push(PolityId(1));
        polities[2].at_war_with.push(PolityId(0));
        enforce_symmetry(&mut polities);
        assert_eq!(polities[1].allies, vec![PolityId(0)]);
        assert_eq!(polities[0].at_war_with, vec![PolityId(2)]);
    }

    #[test]
    fn test_vassal_colors_follow_suzerain() {
        let mut polities = arena(&[5, 3]);
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        color_realms(&mut polities, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(polities[1].color, tint(polities[0].color, 0.2));
        assert!(polities[1].color.iter().zip(polities[0].color.iter()).all(|(v, s)| v >= s));
    }

    fn faction(leader: u32, members: &[u32]) -> Faction {
        Faction {
            id: FactionId(leader),
            kind: FactionKind::Independence,
            leader: PolityId(leader),
            members: members.iter().map(|&m| PolityId(m)).collect(),
            power: 0,
            name: format!("F{}", leader),
        }
    }

    /// P1 is a landless vassal of P0 that leads a bloc, fights a war, seats a dynasty
    /// and sits in two factions.
    fn landless_world() -> World {
        let mut world = World::new("cull", 6, 1);
        let mut polities = arena(&[5, 0, 3, 2, 1, 4]);
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        set_suzerain(&mut polities, PolityId(3), Some(PolityId(2)));
        set_suzerain(&mut polities, PolityId(4), Some(PolityId(2)));
        polities[1].counties.clear();
        polities[0].counties.push(CountyId(1));

        world.counties = (0..6)
            .map(|i| {
                let mut county = County::new(CountyId::from(i), (i, 0));
                county.polity = Some(PolityId::from(if i == 1 { 0 } else { i }));
                county
            })
            .collect();

        world.alliances = vec![
            Alliance { id: AllianceId(0), name: "Doomed".into(), leader: PolityId(1), members: vec![PolityId(1), PolityId(5)] },
            Alliance { id: AllianceId(1), name: "Kept".into(), leader: PolityId(0), members: vec![PolityId(0), PolityId(2)] },
        ];
        for (a, b, alliance) in [(1, 5, 0), (0, 2, 1)] {
            polities[a].allies.push(PolityId::from(b));
            polities[b].allies.push(PolityId::from(a));
            polities[a].alliance = Some(AllianceId(alliance));
            polities[b].alliance = Some(AllianceId(alliance));
        }
        for (a, b) in [(1, 5), (0, 5)] {
            polities[a].at_war_with.push(PolityId::from(b));
            polities[b].at_war_with.push(PolityId::from(a));
        }
        polities[0].opinions = BTreeMap::from([(PolityId(1), -10), (PolityId(2), 5)]);
        polities[0].factions.push(faction(1, &[1]));
        polities[2].factions.push(faction(3, &[3, 4, 1]));

        world.dynasties = vec![
            Dynasty::new(DynastyId(0), "Lost".into(), None, PolityId(1)),
            Dynasty::new(DynastyId(1), "Kept".into(), None, PolityId(3)),
        ];
        polities[1].dynasty = Some(DynastyId(0));
        polities[3].dynasty = Some(DynastyId(1));
        world.polities = polities;
        world
    }

    #[test]
    fn test_cull_renumbers_polities_densely() {
        let mut world = landless_world();
        assert_eq!(cull_landless(&mut world), 1);

        // 0 -> 0, 2 -> 1, 3 -> 2, 4 -> 3, 5 -> 4
        assert_eq!(world.polities.len(), 5);
        for (i, polity) in world.polities.iter().enumerate() {
            assert_eq!(polity.id, PolityId::from(i));
        }
        assert!(world.polities[0].vassals.is_empty());
        assert_eq!(world.polities[1].vassals, vec![PolityId(2), PolityId(3)]);
        assert_eq!(world.polities[2].suzerain, Some(PolityId(1)));
        assert_eq!(world.polities[3].suzerain, Some(PolityId(1)));
        assert_eq!(world.polities[0].opinions, BTreeMap::from([(PolityId(1), 5)]));
        check_acyclic(&world.polities).unwrap();

        assert_eq!(world.counties[1].polity, Some(PolityId(0)));
        assert_eq!(world.counties[5].polity, Some(PolityId(4)));
        assert!(world.counties.iter().all(|c| c.polity.is_some()));
    }

    #[test]
    fn test_cull_remaps_relations_and_records() {
        let mut world = landless_world();
        cull_landless(&mut world);

        // The bloc P1 led dissolves; the other is renumbered
        assert_eq!(world.alliances.len(), 1);
        assert_eq!(world.alliances[0].id, AllianceId(0));
        assert_eq!(world.alliances[0].leader, PolityId(0));
        assert_eq!(world.alliances[0].members, vec![PolityId(0), PolityId(1)]);
        assert_eq!(world.polities[0].alliance, Some(AllianceId(0)));
        assert_eq!(world.polities[0].allies, vec![PolityId(1)]);
        assert_eq!(world.polities[4].alliance, None);
        assert!(world.polities[4].allies.is_empty());

        assert_eq!(world.polities[0].at_war_with, vec![PolityId(4)]);
        assert_eq!(world.polities[4].at_war_with, vec![PolityId(0)]);

        assert!(world.polities[0].factions.is_empty());
        let faction = &world.polities[1].factions[0];
        assert_eq!(faction.leader, PolityId(2));
        assert_eq!(faction.members, vec![PolityId(2), PolityId(3)]);

        assert_eq!(world.dynasties.len(), 1);
        assert_eq!(world.dynasties[0].id, DynastyId(0));
        assert_eq!(world.dynasties[0].seat, PolityId(2));
        assert_eq!(world.polities[2].dynasty, Some(DynastyId(0)));

        let before = world.polities.clone();
        enforce_symmetry(&mut world.polities);
        assert_eq!(world.polities, before);
    }

    #[test]
    fn test_cull_keeps_landless_suzerain_of_landed_vassals() {
        let mut world = landless_world();
        world.polities[2].counties.clear();
        world.counties[2].polity = Some(PolityId(3));
        world.polities[3].counties.push(CountyId(2));

        assert_eq!(cull_landless(&mut world), 1);
        assert_eq!(world.polities[1].vassals.len(), 2);
        assert!(world.polities[1].counties.is_empty());
    }
}
