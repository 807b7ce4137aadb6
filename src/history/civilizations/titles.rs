//! Title ladder and government-specific vocabularies.
//!
//! Ranks run Empire (0) > Kingdom (1) > Grand Duchy / Principality (2) > Duchy (3) >
//! County (4) > Barony (5). Titles are handed out top-down: a polity takes the rank its
//! realm power earns, but never at or above its suzerain's rank, and a polity with
//! `h` levels of vassals below it holds at least rank `5 - h` so its vassals still fit.

use serde::{Deserialize, Serialize};

use crate::history::civilizations::government::GovernmentType;
use crate::history::civilizations::polity::{post_order, subtree, Polity};
use crate::history::counties::County;
use crate::history::config::PoliticsConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TitleTier {
    Empire,
    Kingdom,
    GrandDuchy,
    Duchy,
    County,
    #[default]
    Barony,
}

impl TitleTier {
    const LADDER: [TitleTier; 6] = [
        TitleTier::Empire,
        TitleTier::Kingdom,
        TitleTier::GrandDuchy,
        TitleTier::Duchy,
        TitleTier::County,
        TitleTier::Barony,
    ];

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub fn from_rank(rank: u8) -> Self {
        Self::LADDER[(rank as usize).min(5)]
    }

    /// Tier earned by realm power alone.
    pub fn for_power(realm_power: f32, gov: GovernmentType, thresholds: &[f32; 5]) -> Self {
        let mult = gov.threshold_multiplier();
        thresholds
            .iter()
            .position(|&t| realm_power >= t * mult)
            .map(|i| Self::LADDER[i])
            .unwrap_or(TitleTier::Barony)
    }

    /// Title word in a government's vocabulary. Rank 2 reads "Principality" for an
    /// independent feudal ruler and "Grand Duchy" for a vassal.
    pub fn title(self, gov: GovernmentType, independent: bool) -> &'static str {
        let vocabulary: [&str; 6] = match gov {
            GovernmentType::FeudalKingdom => [
                "Empire",
                "Kingdom",
                if independent { "Principality" } else { "Grand Duchy" },
                "Duchy",
                "County",
                "Barony",
            ],
            GovernmentType::ImperialConfederation => [
                "Imperial Confederation",
                "Electorate",
                "Principality",
                "Margraviate",
                "Landgraviate",
                "Lordship",
            ],
            GovernmentType::TribalFederation => {
                ["Great Horde", "Khanate", "Chiefdom", "Clan", "Tribe", "Band"]
            }
            GovernmentType::MerchantRepublic => [
                "Merchant League",
                "Republic",
                "City-State",
                "Guild Domain",
                "Trading Post",
                "Free Town",
            ],
        };
        vocabulary[self.rank() as usize]
    }
}

/// Assign tiers and titles to every polity. Vassals adopt the government of their
/// realm so one hierarchy speaks one vocabulary.
///
/// The strict ladder takes precedence over earned rank: a polity with `h` levels of
/// vassals is lifted to at least rank `5 - h`. A weak polity with one level of vassals
/// therefore holds a County, never more; deeper trees only arise under dukes, whose
/// own power already clears the County threshold.
pub fn assign_titles(polities: &mut [Polity], config: &PoliticsConfig) {
    // Height of each subtree (0 for a polity without vassals)
    let mut height = vec![0u8; polities.len()];
    for id in post_order(polities) {
        let h = polities[id.index()]
            .vassals
            .iter()
            .map(|v| height[v.index()] + 1)
            .max()
            .unwrap_or(0);
        height[id.index()] = h;
    }

    let roots: Vec<_> = polities.iter().filter(|p| p.is_independent()).map(|p| p.id).collect();
    for root in roots {
        let gov = polities[root.index()].government;
        for id in subtree(polities, root) {
            let polity = &polities[id.index()];
            let earned = TitleTier::for_power(polity.realm_power, gov, &config.title_thresholds).rank();
            let below_suzerain = polity
                .suzerain
                .map(|s| polities[s.index()].tier.rank() + 1)
                .unwrap_or(0);
            let ceiling = 5u8.saturating_sub(height[id.index()]);
            let rank = earned.max(below_suzerain).min(ceiling);

            let independent = polity.is_independent();
            let tier = TitleTier::from_rank(rank);
            let polity = &mut polities[id.index()];
            polity.government = gov;
            polity.tier = tier;
            polity.title = tier.title(gov, independent).to_string();
        }
    }
}

/// A polity with exactly one child (county or vassal) passes its name down.
pub fn rename_single_children(polities: &mut [Polity], counties: &mut [County]) {
    for i in 0..polities.len() {
        let children = polities[i].counties.len() + polities[i].vassals.len();
        if children != 1 {
            continue;
        }
        let name = polities[i].name.clone();
        if let Some(&vassal) = polities[i].vassals.first() {
            polities[vassal.index()].name = name;
        } else if let Some(&county) = polities[i].counties.first() {
            counties[county.index()].name = name;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::civilizations::polity::{set_suzerain, tests::arena};
    use crate::history::{CountyId, PolityId};

    #[test]
    fn test_power_tiers() {
        let t = PoliticsConfig::default().title_thresholds;
        let feudal = GovernmentType::FeudalKingdom;
        assert_eq!(TitleTier::for_power(400.0, feudal, &t), TitleTier::Empire);
        assert_eq!(TitleTier::for_power(50.0, feudal, &t), TitleTier::Duchy);
        assert_eq!(TitleTier::for_power(14.0, feudal, &t), TitleTier::Barony);
        // Tribes need more power for the same rank
        assert_eq!(TitleTier::for_power(16.0, GovernmentType::TribalFederation, &t), TitleTier::Barony);
    }

    #[test]
    fn test_vassal_always_below_suzerain() {
        let mut polities = arena(&[200, 190, 5]);
        for p in polities.iter_mut() {
            p.realm_power = p.power as f32;
        }
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(1)));
        assign_titles(&mut polities, &PoliticsConfig::default());

        assert_eq!(polities[0].tier, TitleTier::Kingdom);
        assert_eq!(polities[1].tier, TitleTier::GrandDuchy);
        assert_eq!(polities[1].title, "Grand Duchy");
        assert!(polities[2].tier > polities[1].tier);
    }

    #[test]
    fn test_weak_realm_is_barony() {
        let mut polities = arena(&[3]);
        polities[0].realm_power = 3.0;
        assign_titles(&mut polities, &PoliticsConfig::default());
        assert_eq!(polities[0].tier, TitleTier::Barony);
        assert_eq!(polities[0].title, "Barony");
    }

    #[test]
    fn test_weak_suzerain_stops_at_county() {
        let mut polities = arena(&[3, 1]);
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        polities[0].realm_power = 3.4;
        polities[1].realm_power = 1.0;
        assign_titles(&mut polities, &PoliticsConfig::default());
        assert_eq!(polities[0].tier, TitleTier::County);
        assert_eq!(polities[1].tier, TitleTier::Barony);
    }

    #[test]
    fn test_ladder_outranks_earned_tier_in_deep_trees() {
        let mut polities = arena(&[3, 2, 1]);
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        set_suzerain(&mut polities, PolityId(2), Some(PolityId(1)));
        for p in polities.iter_mut() {
            p.realm_power = p.power as f32;
        }
        assign_titles(&mut polities, &PoliticsConfig::default());
        assert_eq!(polities[0].tier, TitleTier::Duchy);
        assert!(polities[1].tier > polities[0].tier);
        assert!(polities[2].tier > polities[1].tier);
    }

    #[test]
    fn test_vocabulary_by_government() {
        assert_eq!(TitleTier::Kingdom.title(GovernmentType::TribalFederation, true), "Khanate");
        assert_eq!(TitleTier::Barony.title(GovernmentType::MerchantRepublic, true), "Free Town");
        assert_eq!(TitleTier::GrandDuchy.title(GovernmentType::FeudalKingdom, true), "Principality");
    }

    #[test]
    fn test_single_child_inherits_name() {
        let mut polities = arena(&[10, 4]);
        polities[0].counties.clear();
        set_suzerain(&mut polities, PolityId(1), Some(PolityId(0)));
        let mut counties: Vec<County> =
            (0..2).map(|i| County::new(CountyId::from(i), (i, 0))).collect();
        rename_single_children(&mut polities, &mut counties);
        assert_eq!(polities[1].name, "P0");
        // P1 now owns only county 1 and passes its new name on
        assert_eq!(counties[1].name, "P0");
    }
}
