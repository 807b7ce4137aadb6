//! Vassal factions inside realms.
//!
//! Factions form per suzerain, walking every independent realm top-down. Discontented
//! direct vassals lead or join factions, strongest first, and always bring their own
//! vassals along. Remaining direct vassals may then be invited in.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::history::civilizations::polity::{check_acyclic, subtree, Polity};
use crate::history::config::DiplomacyConfig;
use crate::history::{FactionId, IdGenerator, PolityId};
use crate::world::World;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactionKind {
    /// Break away from the realm.
    Independence,
    /// Put the faction leader on the suzerain's throne.
    Claimant,
    /// Curb the crown's authority over its vassals.
    LowerCrownAuthority,
}

impl FactionKind {
    pub fn label(self) -> &'static str {
        match self {
            FactionKind::Independence => "Independence",
            FactionKind::Claimant => "Claimant",
            FactionKind::LowerCrownAuthority => "Crown Authority",
        }
    }
}

/// A faction of vassals against their suzerain, stored on the suzerain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub kind: FactionKind,
    pub leader: PolityId,
    /// Leader first, then every other member in joining order.
    pub members: Vec<PolityId>,
    /// Sum of the members' own power.
    pub power: u32,
    pub name: String,
}

impl Faction {
    fn new(id: FactionId, kind: FactionKind, leader: &Polity) -> Self {
        let name = match kind {
            FactionKind::Independence => format!("{} Independence Faction", leader.name),
            FactionKind::Claimant => format!("Claimant Faction of {}", leader.name),
            FactionKind::LowerCrownAuthority => format!("{} Crown Authority Faction", leader.name),
        };
        Self { id, kind, leader: leader.id, members: Vec::new(), power: 0, name }
    }
}

/// Kind of faction a discontented vassal leads.
pub fn faction_kind(vassal: &Polity, suzerain: &Polity, liberty: u32, config: &DiplomacyConfig) -> FactionKind {
    let same_culture = vassal.culture.is_some() && vassal.culture == suzerain.culture;
    if liberty > config.independence_liberty && !same_culture {
        FactionKind::Independence
    } else if same_culture && vassal.realm_power >= config.claimant_power_share * suzerain.realm_power {
        FactionKind::Claimant
    } else {
        FactionKind::LowerCrownAuthority
    }
}

/// Thresholds a direct vassal must meet to accept an invitation.
fn accepts_invite(kind: FactionKind, liberty: u32, opinion: i32, config: &DiplomacyConfig) -> bool {
    let (min_liberty, max_opinion) = match kind {
        FactionKind::Independence => config.independence_invite,
        FactionKind::Claimant => config.claimant_invite,
        FactionKind::LowerCrownAuthority => config.crown_authority_invite,
    };
    liberty >= min_liberty && opinion <= max_opinion
}

/// Form factions under every suzerain of every independent realm.
pub fn form_factions(world: &mut World, config: &DiplomacyConfig) -> Result<()> {
    check_acyclic(&world.polities)?;
    let mut ids = IdGenerator::new();
    let roots: Vec<PolityId> = world.polities.iter().filter(|p| p.is_independent()).map(|p| p.id).collect();

    let mut total = 0;
    for root in roots {
        for suzerain in subtree(&world.polities, root) {
            if world.polities[suzerain.index()].vassals.is_empty() {
                continue;
            }
            let factions = factions_under(&world.polities, suzerain, config, &mut ids);
            total += factions.len();
            world.polities[suzerain.index()].factions = factions;
        }
    }

    info!(factions = total, "formed factions");
    Ok(())
}

fn factions_under(
    polities: &[Polity],
    suzerain_id: PolityId,
    config: &DiplomacyConfig,
    ids: &mut IdGenerator,
) -> Vec<Faction> {
    let suzerain = &polities[suzerain_id.index()];
    let liberty = |v: PolityId| polities[v.index()].liberty_desire.unwrap_or(0);
    let opinion = |v: PolityId| polities[v.index()].opinions.get(&suzerain_id).copied().unwrap_or(0);

    let mut leaders: Vec<PolityId> = suzerain
        .vassals
        .iter()
        .copied()
        .filter(|&v| liberty(v) > config.faction_liberty && opinion(v) < 0)
        .collect();
    leaders.sort_by(|a, b| {
        polities[b.index()].realm_power.total_cmp(&polities[a.index()].realm_power).then(a.cmp(b))
    });

    let mut factions: Vec<Faction> = Vec::new();
    let mut committed: BTreeSet<PolityId> = BTreeSet::new();
    let join = |faction: &mut Faction, vassal: PolityId, committed: &mut BTreeSet<PolityId>| {
        for member in subtree(polities, vassal) {
            if committed.insert(member) {
                faction.members.push(member);
                faction.power += polities[member.index()].power;
            }
        }
    };

    for leader in leaders {
        let vassal = &polities[leader.index()];
        let kind = faction_kind(vassal, suzerain, liberty(leader), config);
        let slot = match factions.iter().position(|f| f.kind == kind) {
            Some(i) => i,
            None if factions.len() < config.max_factions => {
                factions.push(Faction::new(ids.next_id(), kind, vassal));
                factions.len() - 1
            }
            None => continue,
        };
        join(&mut factions[slot], leader, &mut committed);
    }

    for &vassal in &suzerain.vassals {
        if committed.contains(&vassal) {
            continue;
        }
        if let Some(faction) =
            factions.iter_mut().find(|f| accepts_invite(f.kind, liberty(vassal), opinion(vassal), config))
        {
            join(faction, vassal, &mut committed);
        }
    }

    factions.retain(|f| f.members.len() > 1);
    for f in &factions {
        debug!(suzerain = %suzerain_id, faction = %f.name, members = f.members.len(), "faction formed");
    }
    factions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::civilizations::polity::{set_suzerain, tests::arena};
    use crate::history::CultureId;

    fn realm(powers: &[u32]) -> Vec<Polity> {
        let mut polities = arena(powers);
        for v in 1..powers.len() {
            set_suzerain(&mut polities, PolityId::from(v), Some(PolityId(0)));
        }
        for p in polities.iter_mut() {
            p.realm_power = p.power as f32;
            p.culture = Some(CultureId(0));
        }
        polities
    }

    fn discontent(polity: &mut Polity, liberty: u32, opinion: i32) {
        polity.liberty_desire = Some(liberty);
        polity.opinions.insert(PolityId(0), opinion);
    }

    #[test]
    fn test_kind_rules() {
        let config = DiplomacyConfig::default();
        let mut polities = realm(&[100, 60, 10]);
        assert_eq!(faction_kind(&polities[1], &polities[0], 60, &config), FactionKind::Claimant);
        assert_eq!(faction_kind(&polities[2], &polities[0], 80, &config), FactionKind::LowerCrownAuthority);
        polities[2].culture = Some(CultureId(1));
        assert_eq!(faction_kind(&polities[2], &polities[0], 80, &config), FactionKind::Independence);
        assert_eq!(faction_kind(&polities[2], &polities[0], 60, &config), FactionKind::LowerCrownAuthority);
    }

    #[test]
    fn test_leader_only_factions_are_dropped() {
        let mut polities = realm(&[100, 10, 10]);
        discontent(&mut polities[1], 60, -20);
        let factions = factions_under(&polities, PolityId(0), &DiplomacyConfig::default(), &mut IdGenerator::new());
        assert!(factions.is_empty());
    }

    #[test]
    fn test_leader_drags_vassals_and_invites() {
        let mut polities = realm(&[100, 10, 10, 5]);
        // 3 is a vassal of 1
        set_suzerain(&mut polities, PolityId(3), Some(PolityId(1)));
        discontent(&mut polities[1], 60, -20);
        // 2 accepts a crown authority invite (liberty >= 25, opinion <= 10)
        discontent(&mut polities[2], 30, 5);

        let factions = factions_under(&polities, PolityId(0), &DiplomacyConfig::default(), &mut IdGenerator::new());
        assert_eq!(factions.len(), 1);
        let f = &factions[0];
        assert_eq!(f.kind, FactionKind::LowerCrownAuthority);
        assert_eq!(f.leader, PolityId(1));
        assert_eq!(f.members, vec![PolityId(1), PolityId(3), PolityId(2)]);
        assert_eq!(f.power, 25);
    }

    #[test]
    fn test_faction_cap() {
        let mut polities = realm(&[100, 10, 10]);
        polities[2].culture = Some(CultureId(1));
        discontent(&mut polities[1], 60, -20);
        discontent(&mut polities[2], 90, -20);
        let config = DiplomacyConfig { max_factions: 1, ..Default::default() };
        let factions = factions_under(&polities, PolityId(0), &config, &mut IdGenerator::new());
        // One slot: the crown authority faction is created first (ties break by id),
        // the independence leader finds no room and accepts the invitation instead
        assert_eq!(factions.len(), 1);
        assert_eq!(factions[0].kind, FactionKind::LowerCrownAuthority);
        assert_eq!(factions[0].members, vec![PolityId(1), PolityId(2)]);
    }
}
