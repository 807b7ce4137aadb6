//! Diplomacy between realms: great-power vassalization, alliance blocs, wars and
//! vassal liberty desire.

use std::collections::{BTreeSet, VecDeque};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::history::civilizations::court::{assign_laws, court_naming, roll_vassal_opinion};
use crate::history::civilizations::polity::{realm_of, set_suzerain, subtree, update_realm_power, Polity};
use crate::history::civilizations::titles::assign_titles;
use crate::history::config::{CourtConfig, DiplomacyConfig, PoliticsConfig};
use crate::history::naming::NameGenerator;
use crate::history::{AllianceId, PolityId};
use crate::world::World;

/// An alliance bloc of independent realms.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alliance {
    pub id: AllianceId,
    pub name: String,
    pub leader: PolityId,
    /// Leader first.
    pub members: Vec<PolityId>,
}

/// Configuration for one diplomacy run.
pub struct DiplomacyRules<'a> {
    pub politics: &'a PoliticsConfig,
    pub court: &'a CourtConfig,
    pub diplomacy: &'a DiplomacyConfig,
}

// =============================================================================
// ADJACENCY
// =============================================================================

/// Realm of every polity, indexed by polity.
pub fn realm_roots(polities: &[Polity]) -> Result<Vec<PolityId>> {
    polities.iter().map(|p| realm_of(polities, p.id)).collect()
}

/// Realms touching each other through right/down cell pairs, indexed by polity.
/// Entries of non-realm polities stay empty.
pub fn realm_adjacency(world: &World) -> Result<Vec<BTreeSet<PolityId>>> {
    let roots = realm_roots(&world.polities)?;
    let realm_at = |x: usize, y: usize| {
        let county = *world.cell_county.get(x, y);
        county.and_then(|c| world.counties[c.index()].polity).map(|p| roots[p.index()])
    };

    let mut adjacency = vec![BTreeSet::new(); world.polities.len()];
    for y in 0..world.height {
        for x in 0..world.width {
            let Some(a) = realm_at(x, y) else { continue };
            let right = (x + 1 < world.width).then(|| realm_at(x + 1, y)).flatten();
            let down = (y + 1 < world.height).then(|| realm_at(x, y + 1)).flatten();
            for b in [right, down].into_iter().flatten() {
                if a != b {
                    adjacency[a.index()].insert(b);
                    adjacency[b.index()].insert(a);
                }
            }
        }
    }
    Ok(adjacency)
}

// =============================================================================
// DIPLOMACY
// =============================================================================

/// Run great-power vassalization, laws, alliances, wars and liberty desire.
pub fn simulate_diplomacy(world: &mut World, rules: &DiplomacyRules, rng: &mut impl Rng) -> Result<()> {
    let adjacency = realm_adjacency(world)?;
    let conquered = vassalize_by_great_powers(world, &adjacency, rules, rng);
    update_realm_power(&mut world.polities, rules.politics)?;
    assign_titles(&mut world.polities, rules.politics);
    assign_laws(&mut world.polities, rng);

    let adjacency = realm_adjacency(world)?;
    let alliances = form_alliances(world, &adjacency, rules.diplomacy, rng);
    let wars = declare_wars(world, &alliances, &adjacency, rules.diplomacy, rng);
    world.alliances = alliances;

    update_liberty_desire(&mut world.polities)?;

    info!(
        conquered,
        alliances = world.alliances.len(),
        wars,
        "simulated diplomacy"
    );
    Ok(())
}

/// Great powers that pass their isolationism roll swallow much weaker realms.
/// Returns the number of realms vassalized.
fn vassalize_by_great_powers(
    world: &mut World,
    adjacency: &[BTreeSet<PolityId>],
    rules: &DiplomacyRules,
    rng: &mut impl Rng,
) -> usize {
    let config = rules.diplomacy;
    let mut realms: Vec<PolityId> = world.polities.iter().filter(|p| p.is_independent()).map(|p| p.id).collect();
    realms.sort_by(|a, b| {
        let (pa, pb) = (&world.polities[a.index()], &world.polities[b.index()]);
        pb.realm_power.total_cmp(&pa.realm_power).then(a.cmp(b))
    });
    let great_powers: Vec<PolityId> = realms.iter().copied().take(config.great_power_count).collect();
    let minor: Vec<PolityId> = realms.iter().copied().skip(config.great_power_count).collect();

    let mut conquered = 0;
    for &power in &great_powers {
        if rng.gen_bool(config.isolationism_chance) {
            debug!(polity = %power, "great power stays isolationist");
            continue;
        }
        for &target in &minor {
            if !world.polities[target.index()].is_independent() {
                continue;
            }
            let ratio_met = world.polities[power.index()].realm_power
                > config.vassalize_power_ratio * world.polities[target.index()].realm_power;
            if !ratio_met {
                continue;
            }
            let mut chance = config.vassalize_chance;
            if adjacency[power.index()].contains(&target) {
                chance += config.vassalize_adjacent_bonus;
            }
            if !rng.gen_bool(chance.min(1.0)) {
                continue;
            }

            set_suzerain(&mut world.polities, target, Some(power));
            let (vassal, suzerain) = (&world.polities[target.index()], &world.polities[power.index()]);
            let opinion = roll_vassal_opinion(vassal, suzerain, rules.court, rng);
            let opinion = (opinion + rules.court.conquest_opinion).clamp(-100, 100);
            world.polities[target.index()].opinions.insert(power, opinion);
            conquered += 1;
            debug!(suzerain = %power, vassal = %target, "great power vassalized realm");
        }
    }
    conquered
}

/// Strongest unaligned realm leads a new bloc; neighbors join by coin flip through
/// a breadth-first walk over realm adjacency. A leader nobody joins is released and
/// can still be recruited by a later bloc. Single-member blocs do not count toward
/// the cap.
fn form_alliances(
    world: &mut World,
    adjacency: &[BTreeSet<PolityId>],
    config: &DiplomacyConfig,
    rng: &mut impl Rng,
) -> Vec<Alliance> {
    let chance = config.alliance_join_chance;
    let blocs = gather_blocs(&world.polities, adjacency, config.max_alliances, |_| rng.gen_bool(chance));

    let mut alliances: Vec<Alliance> = Vec::with_capacity(blocs.len());
    for members in blocs {
        let id = AllianceId::from(alliances.len());
        let leader = members[0];
        let naming = court_naming(world, &world.polities[leader.index()]);
        let name = NameGenerator::league_name(naming.style(), rng);
        for &member in &members {
            let polity = &mut world.polities[member.index()];
            polity.alliance = Some(id);
            polity.allies = members.iter().copied().filter(|&m| m != member).collect();
        }
        debug!(alliance = %name, members = members.len(), "alliance formed");
        alliances.push(Alliance { id, name, leader, members });
    }
    alliances
}

/// Member lists of every bloc, leader first. `join` decides whether a neighbor accepts.
fn gather_blocs(
    polities: &[Polity],
    adjacency: &[BTreeSet<PolityId>],
    max_blocs: usize,
    mut join: impl FnMut(PolityId) -> bool,
) -> Vec<Vec<PolityId>> {
    let mut candidates: Vec<PolityId> = polities.iter().filter(|p| p.is_independent()).map(|p| p.id).collect();
    candidates.sort_by(|a, b| {
        let (pa, pb) = (&polities[a.index()], &polities[b.index()]);
        pb.realm_power.total_cmp(&pa.realm_power).then(a.cmp(b))
    });

    let mut taken: BTreeSet<PolityId> = BTreeSet::new();
    let mut blocs: Vec<Vec<PolityId>> = Vec::new();
    for &leader in &candidates {
        if blocs.len() >= max_blocs {
            break;
        }
        if !taken.insert(leader) {
            continue;
        }

        let mut members = vec![leader];
        let mut considered: BTreeSet<PolityId> = BTreeSet::from([leader]);
        let mut queue = VecDeque::from([leader]);
        while let Some(current) = queue.pop_front() {
            for &neighbor in &adjacency[current.index()] {
                if taken.contains(&neighbor) || !considered.insert(neighbor) {
                    continue;
                }
                if join(neighbor) {
                    taken.insert(neighbor);
                    members.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        if members.len() < 2 {
            taken.remove(&leader);
            continue;
        }
        blocs.push(members);
    }
    blocs
}

fn declare_war(polities: &mut [Polity], a: PolityId, b: PolityId) -> bool {
    if a == b || polities[a.index()].at_war_with.contains(&b) {
        return false;
    }
    polities[a.index()].at_war_with.push(b);
    polities[b.index()].at_war_with.push(a);
    true
}

/// Bloc power: summed realm power of its members.
fn bloc_power(polities: &[Polity], alliance: &Alliance) -> f32 {
    alliance.members.iter().map(|m| polities[m.index()].realm_power).sum()
}

/// A possible great war between the two strongest blocs (with their vassals), then
/// border wars between adjacent realms of different blocs. Returns the number of
/// wars declared.
fn declare_wars(
    world: &mut World,
    alliances: &[Alliance],
    adjacency: &[BTreeSet<PolityId>],
    config: &DiplomacyConfig,
    rng: &mut impl Rng,
) -> usize {
    let mut wars = 0;
    if alliances.len() >= 2 && rng.gen_bool(config.great_war_chance) {
        let mut blocs: Vec<&Alliance> = alliances.iter().collect();
        blocs.sort_by(|a, b| {
            bloc_power(&world.polities, b).total_cmp(&bloc_power(&world.polities, a)).then(a.id.cmp(&b.id))
        });
        let side = |bloc: &Alliance| -> Vec<PolityId> {
            bloc.members.iter().flat_map(|&m| subtree(&world.polities, m)).collect()
        };
        let (left, right) = (side(blocs[0]), side(blocs[1]));
        for &a in &left {
            for &b in &right {
                if declare_war(&mut world.polities, a, b) {
                    wars += 1;
                }
            }
        }
        info!(attackers = %blocs[0].name, defenders = %blocs[1].name, "great war declared");
    }

    for a in 0..adjacency.len() {
        let pa = PolityId::from(a);
        for &pb in adjacency[a].iter().filter(|&&b| b > pa) {
            let (ba, bb) = (world.polities[a].alliance, world.polities[pb.index()].alliance);
            let cross_bloc = matches!((ba, bb), (Some(x), Some(y)) if x != y);
            if cross_bloc && rng.gen_bool(config.border_war_chance) && declare_war(&mut world.polities, pa, pb) {
                debug!(a = %pa, b = %pb, "border war");
                wars += 1;
            }
        }
    }
    wars
}

// =============================================================================
// LIBERTY DESIRE
// =============================================================================

/// `20 * power share - 0.5 * opinion - 4 * suzerain diplomacy + crown bonus`,
/// clamped to `[0, 100]` and rounded.
pub fn liberty_desire(power_share: f32, opinion: i32, suzerain_diplomacy: u8, crown_bonus: f32) -> u32 {
    let raw = 20.0 * power_share - 0.5 * opinion as f32 - 4.0 * suzerain_diplomacy as f32 + crown_bonus;
    raw.clamp(0.0, 100.0).round() as u32
}

/// Recompute liberty desire for every vassal; independent polities have none.
pub fn update_liberty_desire(polities: &mut [Polity]) -> Result<()> {
    let roots = realm_roots(polities)?;
    for v in 0..polities.len() {
        let Some(suzerain) = polities[v].suzerain else {
            polities[v].liberty_desire = None;
            continue;
        };
        let top = &polities[roots[v].index()];
        let share = if top.realm_power > 0.0 { polities[v].realm_power / top.realm_power } else { 0.0 };
        let crown_bonus = top.laws.map(|l| l.crown_authority.liberty_bonus()).unwrap_or(0.0);
        let opinion = polities[v].opinions.get(&suzerain).copied().unwrap_or(0);
        let diplomacy = polities[suzerain.index()].ruler.diplomacy;
        polities[v].liberty_desire = Some(liberty_desire(share, opinion, diplomacy, crown_bonus));
    }
    Ok(())
}
