//! Configuration for history generation.
//!
//! Every tunable constant of the political and sociological passes lives here, so a
//! JSON override can give a world a different "personality" without code changes.

use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

/// Configuration parameters for history generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub partition: PartitionConfig,
    pub politics: PoliticsConfig,
    pub sociology: SociologyConfig,
    pub court: CourtConfig,
    pub diplomacy: DiplomacyConfig,
    pub backfill: BackfillConfig,
}

// =============================================================================
// COUNTIES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartitionConfig {
    /// One county capital per this many cells (default: 100).
    pub cells_per_county: usize,
    /// Capital sampling attempts allowed per requested capital.
    pub capital_attempts_per_county: usize,
    /// Upper bound of the random jitter added to every step cost.
    pub step_jitter: f32,
    /// Cost of a step into a water cell.
    pub sea_step_cost: f32,
    /// Longest run of consecutive water steps a county may cross.
    pub max_sea_steps: u32,
    /// Development every county starts from.
    pub development_base: f32,
    /// Multiplier of the average land development modifier.
    pub development_biome_weight: f32,
    pub development_cores_min: usize,
    pub development_cores_max: usize,
    /// Core radius as a fraction of the longer grid side.
    pub development_core_radius: f32,
    /// Bonus at the center of a core, falling linearly to 0 at the radius.
    pub development_core_strength: f32,
    /// Symmetric jitter applied to development.
    pub development_jitter: f32,
    /// Number of naming regions (each with its own phonetic style).
    pub naming_regions: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            cells_per_county: 100,
            capital_attempts_per_county: 200,
            step_jitter: 0.5,
            sea_step_cost: 8.0,
            max_sea_steps: 3,
            development_base: 2.0,
            development_biome_weight: 2.0,
            development_cores_min: 3,
            development_cores_max: 5,
            development_core_radius: 0.25,
            development_core_strength: 6.0,
            development_jitter: 1.0,
            naming_regions: 4,
        }
    }
}

// =============================================================================
// POLITIES AND REALMS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoliticsConfig {
    /// One base polity per this many counties (default: 5).
    pub counties_per_polity: usize,
    /// Constant part of the county-to-county travel cost.
    pub polity_step_cost: f32,
    /// Maximum number of realm leaders promoted before vassalization.
    pub realm_leader_cap: usize,
    /// Raw power needed to be promoted as a preliminary empire.
    pub empire_promotion: u32,
    pub kingdom_promotion: u32,
    pub principality_promotion: u32,
    /// Claim range as a fraction of the longer grid side.
    pub claim_range: f32,
    /// Raw power at which a vassal is preliminarily a Duchy.
    pub duchy_power: u32,
    /// Share of its own power a Duchy may take in sub-vassals.
    pub subinfeudation_share: f32,
    /// Realm-power weight of the strongest direct vassal.
    pub primary_vassal_weight: f32,
    /// Realm-power weight of every other direct vassal.
    pub other_vassal_weight: f32,
    /// Realm-power thresholds for ranks 0..=4 (Empire .. County); below the last
    /// one a polity is a Barony.
    pub title_thresholds: [f32; 5],
    /// Relative weights of Feudal, Imperial, Tribal and Republic governments.
    pub government_weights: [f32; 4],
}

impl Default for PoliticsConfig {
    fn default() -> Self {
        Self {
            counties_per_polity: 5,
            polity_step_cost: 10.0,
            realm_leader_cap: 8,
            empire_promotion: 80,
            kingdom_promotion: 60,
            principality_promotion: 45,
            claim_range: 0.4,
            duchy_power: 35,
            subinfeudation_share: 0.10,
            primary_vassal_weight: 0.4,
            other_vassal_weight: 0.2,
            title_thresholds: [300.0, 150.0, 80.0, 45.0, 15.0],
            government_weights: [0.55, 0.15, 0.15, 0.15],
        }
    }
}

// =============================================================================
// CULTURES AND RELIGIONS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SociologyConfig {
    /// One culture group per this many counties.
    pub counties_per_culture: usize,
    pub min_cultures: usize,
    /// Minimum hearth distance is `width / hearth_spacing_factor`.
    pub hearth_spacing_factor: f32,
    /// One sub-culture per this many counties of the parent group.
    pub counties_per_subculture: usize,
    /// Constant part of the culture step cost.
    pub culture_step_cost: f32,
    /// Cost multiplier for culture spread inside one ancient empire.
    pub ancient_empire_discount: f32,

    pub cultural_religion_chance: f64,
    /// Development the top county of a culture needs to found a cultural religion.
    pub cultural_religion_development: u32,
    pub universalist_min: usize,
    pub universalist_max: usize,
    /// Development thresholds tried in order when placing universalist hearths.
    pub universalist_thresholds: Vec<u32>,
    /// Chance that a universalist religion is a fringe branch.
    pub fringe_chance: f64,
    pub resistance_base: f32,
    pub resistance_floor: f32,
    pub fringe_penalty: f32,
    pub mainstream_discount: f32,
    /// Accumulated resistance a cultural religion can spread through.
    pub cultural_reach: f32,
    pub universalist_reach: f32,
    pub fringe_reach: f32,
}

impl Default for SociologyConfig {
    fn default() -> Self {
        Self {
            counties_per_culture: 12,
            min_cultures: 2,
            hearth_spacing_factor: 6.0,
            counties_per_subculture: 5,
            culture_step_cost: 8.0,
            ancient_empire_discount: 0.5,
            cultural_religion_chance: 0.5,
            cultural_religion_development: 10,
            universalist_min: 2,
            universalist_max: 4,
            universalist_thresholds: vec![12, 9, 6],
            fringe_chance: 0.35,
            resistance_base: 30.0,
            resistance_floor: 5.0,
            fringe_penalty: 15.0,
            mainstream_discount: 8.0,
            cultural_reach: 80.0,
            universalist_reach: 160.0,
            fringe_reach: 90.0,
        }
    }
}

// =============================================================================
// COURT
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    pub same_culture_opinion: i32,
    pub different_culture_opinion: i32,
    pub same_religion_opinion: i32,
    pub different_religion_opinion: i32,
    /// Opinion rolls are jittered by up to this much either way.
    pub opinion_jitter: i32,
    /// Opinion per point of the target ruler's diplomacy above 5.
    pub diplomacy_opinion: i32,
    /// Opinion penalty toward a suzerain that took the realm by force.
    pub conquest_opinion: i32,
    /// Opinion penalty every vassal holds against its suzerain.
    pub vassal_grievance: i32,
    /// Resentment toward the suzerain at full dominance, scaled by the suzerain's share
    /// of the pair's combined realm power.
    pub dominance_resentment: i32,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            same_culture_opinion: 10,
            different_culture_opinion: -15,
            same_religion_opinion: 10,
            different_religion_opinion: -10,
            opinion_jitter: 25,
            diplomacy_opinion: 8,
            conquest_opinion: -30,
            vassal_grievance: -20,
            dominance_resentment: -50,
        }
    }
}

// =============================================================================
// DIPLOMACY AND FACTIONS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiplomacyConfig {
    pub great_power_count: usize,
    pub isolationism_chance: f64,
    /// A great power only vassalizes realms it outweighs by more than this.
    pub vassalize_power_ratio: f32,
    pub vassalize_chance: f64,
    pub vassalize_adjacent_bonus: f64,
    pub alliance_join_chance: f64,
    pub max_alliances: usize,
    pub great_war_chance: f64,
    pub border_war_chance: f64,

    /// Liberty desire above which a vassal may lead a faction.
    pub faction_liberty: u32,
    /// Liberty desire above which a foreign-culture leader seeks independence.
    pub independence_liberty: u32,
    /// Share of the suzerain's realm power a same-culture leader needs to press a claim.
    pub claimant_power_share: f32,
    pub max_factions: usize,
    /// Invitation thresholds per faction kind: (minimum liberty desire, maximum opinion).
    pub independence_invite: (u32, i32),
    pub claimant_invite: (u32, i32),
    pub crown_authority_invite: (u32, i32),
}

impl Default for DiplomacyConfig {
    fn default() -> Self {
        Self {
            great_power_count: 3,
            isolationism_chance: 0.25,
            vassalize_power_ratio: 3.0,
            vassalize_chance: 0.15,
            vassalize_adjacent_bonus: 0.35,
            alliance_join_chance: 0.5,
            max_alliances: 6,
            great_war_chance: 0.3,
            border_war_chance: 0.1,
            faction_liberty: 50,
            independence_liberty: 75,
            claimant_power_share: 0.5,
            max_factions: 5,
            independence_invite: (40, 0),
            claimant_invite: (30, -10),
            crown_authority_invite: (25, 10),
        }
    }
}

// =============================================================================
// BACKFILL
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// Run the ancient-empire pre-pass.
    pub enabled: bool,
    pub empire_count: usize,
    /// Base cost of an empire step between counties, on top of terrain cost.
    pub empire_step_cost: f32,
    /// Expansion budget of an ancient empire over the county graph.
    pub empire_reach: f32,
    /// Minimum core distance is `max(width, height) / core_spacing_factor`.
    pub core_spacing_factor: f32,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            empire_count: 3,
            empire_step_cost: 10.0,
            empire_reach: 60.0,
            core_spacing_factor: 4.0,
        }
    }
}

impl HistoryConfig {
    /// Reject values that would make a stage meaningless or non-terminating.
    pub fn validate(&self) -> Result<()> {
        let p = &self.partition;
        ensure(p.cells_per_county > 0, "partition.cells_per_county must be > 0")?;
        ensure(p.capital_attempts_per_county > 0, "partition.capital_attempts_per_county must be > 0")?;
        ensure(p.step_jitter >= 0.0, "partition.step_jitter must be >= 0")?;
        ensure(p.sea_step_cost > 0.0, "partition.sea_step_cost must be > 0")?;
        ensure(
            p.development_cores_min <= p.development_cores_max,
            "partition.development_cores_min must not exceed development_cores_max",
        )?;
        ensure(p.naming_regions > 0, "partition.naming_regions must be > 0")?;

        let pol = &self.politics;
        ensure(pol.counties_per_polity > 0, "politics.counties_per_polity must be > 0")?;
        ensure(pol.realm_leader_cap > 0, "politics.realm_leader_cap must be > 0")?;
        ensure(pol.claim_range > 0.0, "politics.claim_range must be > 0")?;
        ensure(
            (0.0..=1.0).contains(&pol.subinfeudation_share),
            "politics.subinfeudation_share must be in [0, 1]",
        )?;
        ensure(
            pol.primary_vassal_weight >= 0.0 && pol.other_vassal_weight >= 0.0,
            "politics vassal weights must be non-negative",
        )?;
        ensure(
            pol.title_thresholds.windows(2).all(|w| w[0] >= w[1]),
            "politics.title_thresholds must be descending",
        )?;
        ensure(
            pol.government_weights.iter().all(|&w| w >= 0.0)
                && pol.government_weights.iter().sum::<f32>() > 0.0,
            "politics.government_weights must be non-negative with a positive sum",
        )?;

        let s = &self.sociology;
        ensure(s.counties_per_culture > 0, "sociology.counties_per_culture must be > 0")?;
        ensure(s.counties_per_subculture > 0, "sociology.counties_per_subculture must be > 0")?;
        ensure(s.hearth_spacing_factor > 0.0, "sociology.hearth_spacing_factor must be > 0")?;
        ensure(s.universalist_min <= s.universalist_max, "sociology.universalist_min must not exceed universalist_max")?;
        ensure(s.resistance_floor > 0.0, "sociology.resistance_floor must be > 0")?;
        for chance in [s.cultural_religion_chance, s.fringe_chance] {
            ensure((0.0..=1.0).contains(&chance), "sociology chances must be in [0, 1]")?;
        }

        let d = &self.diplomacy;
        for chance in [
            d.isolationism_chance,
            d.vassalize_chance,
            d.alliance_join_chance,
            d.great_war_chance,
            d.border_war_chance,
        ] {
            ensure((0.0..=1.0).contains(&chance), "diplomacy chances must be in [0, 1]")?;
        }
        ensure(d.vassalize_power_ratio >= 1.0, "diplomacy.vassalize_power_ratio must be >= 1")?;

        let b = &self.backfill;
        ensure(b.core_spacing_factor > 0.0, "backfill.core_spacing_factor must be > 0")?;
        ensure(b.empire_step_cost > 0.0, "backfill.empire_step_cost must be > 0")?;
        Ok(())
    }
}

fn ensure(condition: bool, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(GenerationError::InvalidConfig(message.to_string()))
    }
}
