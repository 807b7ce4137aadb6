//! Polities and the vassal hierarchy arena.
//!
//! Polities live in a `Vec` indexed by `PolityId`; the hierarchy is expressed with
//! `suzerain` / `vassals` id links only. All traversals are explicit worklists, and
//! every walk up the suzerain chain is bounded by the polity count so a cycle shows
//! up as `GenerationError::HierarchyCycle` instead of a hang.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{GenerationError, Result};
use crate::expansion::{nearest, Advance, Expansion};
use crate::history::civilizations::faction::Faction;
use crate::history::civilizations::government::{GovernmentType, Laws};
use crate::history::civilizations::titles::TitleTier;
use crate::history::config::PoliticsConfig;
use crate::history::{AllianceId, CountyId, CultureId, DynastyId, PolityId, ReligionId};
use crate::world::World;

/// A ruler's first name and three bounded skills (0..=10).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruler {
    pub name: String,
    pub diplomacy: u8,
    pub martial: u8,
    pub stewardship: u8,
}

/// A political entity owning counties and possibly vassals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Polity {
    pub id: PolityId,
    pub name: String,
    /// Title in the polity's government vocabulary ("Kingdom", "Khanate", ...).
    pub title: String,
    pub tier: TitleTier,
    pub capital: CountyId,
    pub counties: Vec<CountyId>,
    pub vassals: Vec<PolityId>,
    pub suzerain: Option<PolityId>,
    /// Sum of owned county development.
    pub power: u32,
    /// Own power plus weighted vassal realm power.
    pub realm_power: f32,
    pub government: GovernmentType,
    pub dynasty: Option<DynastyId>,
    pub ruler: Ruler,
    /// Only independent rulers hold laws.
    pub laws: Option<Laws>,
    pub factions: Vec<Faction>,
    pub allies: Vec<PolityId>,
    pub at_war_with: Vec<PolityId>,
    pub alliance: Option<AllianceId>,
    pub opinions: BTreeMap<PolityId, i32>,
    /// 0..=100, vassals only.
    pub liberty_desire: Option<u32>,
    pub culture: Option<CultureId>,
    pub religion: Option<ReligionId>,
    pub color: [u8; 3],
    /// Cell where the polity's label sits.
    pub label_anchor: Option<(usize, usize)>,
}

impl Polity {
    pub fn new(id: PolityId, name: String, capital: CountyId, government: GovernmentType) -> Self {
        Self {
            id,
            name,
            title: String::new(),
            tier: TitleTier::Barony,
            capital,
            counties: vec![capital],
            vassals: Vec::new(),
            suzerain: None,
            power: 0,
            realm_power: 0.0,
            government,
            dynasty: None,
            ruler: Ruler::default(),
            laws: None,
            factions: Vec::new(),
            allies: Vec::new(),
            at_war_with: Vec::new(),
            alliance: None,
            opinions: BTreeMap::new(),
            liberty_desire: None,
            culture: None,
            religion: None,
            color: [0, 0, 0],
            label_anchor: None,
        }
    }

    pub fn is_independent(&self) -> bool {
        self.suzerain.is_none()
    }

    /// Display name with title, e.g. "Kingdom of Redford".
    pub fn full_name(&self) -> String {
        if self.title.is_empty() {
            self.name.clone()
        } else {
            format!("{} of {}", self.title, self.name)
        }
    }
}

// =============================================================================
// BASE POLITIES
// =============================================================================

/// Group counties into base polities around the most developed counties.
pub fn form_base_polities(world: &mut World, config: &PoliticsConfig, rng: &mut impl Rng) -> Result<()> {
    let mut candidates: Vec<usize> = (0..world.counties.len())
        .filter(|&i| world.counties[i].has_land(&world.biomes))
        .collect();
    candidates.sort_by(|&a, &b| {
        world.counties[b].development.cmp(&world.counties[a].development).then(a.cmp(&b))
    });
    let count = (world.counties.len() / config.counties_per_polity).max(1).min(candidates.len());
    let capitals: Vec<usize> = candidates[..count].to_vec();

    let graph = world.county_graph();
    let counties = &world.counties;
    let expansion = Expansion::new(&graph)
        .sources(capitals.iter().enumerate().map(|(owner, &county)| (county, owner)))
        .run(|step| Some(Advance::claim(config.polity_step_cost + counties[step.to].terrain_cost)));

    let centroids: Vec<(f32, f32)> = capitals.iter().map(|&c| world.counties[c].centroid).collect();
    let mut owner = expansion.owner;
    let mut unreached = 0;
    for county in 0..owner.len() {
        if owner[county].is_none() {
            let (x, y) = world.counties[county].centroid;
            owner[county] = nearest(&centroids, x, y);
            unreached += 1;
        }
    }
    if unreached > 0 {
        warn!(counties = unreached, "joined unreached counties to the nearest polity capital");
    }

    let mut polities: Vec<Polity> = capitals
        .iter()
        .enumerate()
        .map(|(i, &capital)| {
            let government = GovernmentType::roll(&config.government_weights, rng);
            Polity::new(PolityId::from(i), world.counties[capital].name.clone(), CountyId::from(capital), government)
        })
        .collect();

    for (county, owner) in owner.iter().enumerate() {
        let Some(owner) = *owner else {
            return Err(GenerationError::UnassignedCounty(CountyId::from(county)));
        };
        let county_id = CountyId::from(county);
        if polities[owner].capital != county_id {
            polities[owner].counties.push(county_id);
        }
        world.counties[county].polity = Some(PolityId::from(owner));
    }

    world.polities = polities;
    update_raw_power(world);
    info!(polities = world.polities.len(), "formed base polities");
    Ok(())
}

// =============================================================================
// HIERARCHY HELPERS
// =============================================================================

/// Follow suzerain links to the realm root.
pub fn realm_of(polities: &[Polity], id: PolityId) -> Result<PolityId> {
    let mut current = id;
    for _ in 0..=polities.len() {
        match polities[current.index()].suzerain {
            Some(next) => current = next,
            None => return Ok(current),
        }
    }
    Err(GenerationError::HierarchyCycle(id))
}

/// Every suzerain chain must end within the polity count.
pub fn check_acyclic(polities: &[Polity]) -> Result<()> {
    for polity in polities {
        realm_of(polities, polity.id)?;
    }
    Ok(())
}

/// `root` and everything below it, parents before children.
pub fn subtree(polities: &[Polity], root: PolityId) -> Vec<PolityId> {
    let mut order = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        if order.len() > polities.len() {
            break;
        }
        order.push(id);
        stack.extend(polities[id.index()].vassals.iter().rev().copied());
    }
    order
}

/// All polities ordered so every vassal comes before its suzerain.
pub fn post_order(polities: &[Polity]) -> Vec<PolityId> {
    let mut order = Vec::with_capacity(polities.len());
    for root in polities.iter().filter(|p| p.is_independent()) {
        let mut top_down = subtree(polities, root.id);
        top_down.reverse();
        order.extend(top_down);
    }
    order
}

/// Move `vassal` (with its own subtree) under `suzerain`, or make it independent.
pub fn set_suzerain(polities: &mut [Polity], vassal: PolityId, suzerain: Option<PolityId>) {
    if let Some(old) = polities[vassal.index()].suzerain {
        polities[old.index()].vassals.retain(|&v| v != vassal);
    }
    polities[vassal.index()].suzerain = suzerain;
    if let Some(new) = suzerain {
        let vassals = &mut polities[new.index()].vassals;
        if !vassals.contains(&vassal) {
            vassals.push(vassal);
        }
    }
}

/// Recompute every polity's raw power from its counties.
pub fn update_raw_power(world: &mut World) {
    for polity in world.polities.iter_mut() {
        polity.power = polity.counties.iter().map(|c| world.counties[c.index()].development).sum();
    }
}

/// Realm power bottom-up: own power, 40% of the strongest direct vassal and 20% of
/// every other one. Each polity is computed once, after all of its vassals.
pub fn update_realm_power(polities: &mut [Polity], config: &PoliticsConfig) -> Result<()> {
    check_acyclic(polities)?;
    let mut memo: Vec<Option<f32>> = vec![None; polities.len()];

    for id in post_order(polities) {
        let polity = &polities[id.index()];
        let mut child_powers: Vec<f32> = polity
            .vassals
            .iter()
            .map(|v| memo[v.index()].unwrap_or(polities[v.index()].power as f32))
            .collect();
        child_powers.sort_by(|a, b| b.total_cmp(a));

        let mut total = polity.power as f32;
        for (i, p) in child_powers.iter().enumerate() {
            let weight = if i == 0 { config.primary_vassal_weight } else { config.other_vassal_weight };
            total += p * weight;
        }
        memo[id.index()] = Some(total);
    }

    for polity in polities.iter_mut() {
        polity.realm_power = memo[polity.id.index()].unwrap_or(polity.power as f32);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Polities with the given raw powers and no hierarchy.
    pub(crate) fn arena(powers: &[u32]) -> Vec<Polity> {
        powers
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                let mut polity = Polity::new(PolityId::from(i), format!("P{}", i), CountyId::from(i), GovernmentType::FeudalKingdom);
                polity.power = p;
                polity
            })
            .collect()
    }

    #[test]
    fn test_realm_power_weights() {
        let mut polities = arena(&[100, 50, 20, 10]);
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(0)));
        set_suzerain(&mut polities, PolityId(3), Some(PolityId(1)));
        update_realm_power(&mut polities, &PoliticsConfig::default()).unwrap();

        assert!((polities[1].realm_power - 54.0).abs() < 1e-4);
        assert!((polities[0].realm_power - (100.0 + 0.4 * 54.0 + 0.2 * 20.0)).abs() < 1e-4);
        for p in &polities {
            assert!(p.realm_power >= p.power as f32);
        }
    }

    #[test]
    fn test_cycle_detected() {
        let mut polities = arena(&[1, 1]);
        polities[0].suzerain = Some(PolityId(1));
        polities[1].suzerain = Some(PolityId(0));
        assert!(matches!(check_acyclic(&polities), Err(GenerationError::HierarchyCycle(_))));
    }

    #[test]
    fn test_post_order_children_first() {
        let mut polities = arena(&[1, 1, 1]);
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(1)));
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        assert_eq!(post_order(&polities), vec![PolityId(2), PolityId(1), PolityId(0)]);
        assert_eq!(realm_of(&polities, PolityId(2)).unwrap(), PolityId(0));
    }

    #[test]
    fn test_set_suzerain_moves_link() {
        let mut polities = arena(&[1, 1, 1]);
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(0)));
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(1)));
        assert!(polities[0].vassals.is_empty());
        assert_eq!(polities[1].vassals, vec![PolityId(2)]);
        set_suzerain(&mut polities, PolityId(2), None);
        assert!(polities[1].vassals.is_empty());
        assert!(polities[2].is_independent());
    }
}
