//! Religion definitions.

use serde::{Deserialize, Serialize};

use crate::history::config::SociologyConfig;
use crate::history::{CountyId, CultureId, ReligionId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReligionKind {
    /// Local ancestral worship; the default faith of every county.
    Folk,
    /// Tied to one culture and never spreading past its borders.
    Cultural,
    /// Proselytizing faith open to any culture.
    Universalist,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReligionBranch {
    #[default]
    Mainstream,
    Fringe,
}

/// A religion practiced by one or more counties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Religion {
    pub id: ReligionId,
    pub name: String,
    pub kind: ReligionKind,
    pub branch: ReligionBranch,
    /// Culture a cultural religion is confined to.
    pub origin_culture: Option<CultureId>,
    /// None for the folk religion, which has no single origin.
    pub hearth: Option<CountyId>,
    pub color: [u8; 3],
}

impl Religion {
    pub fn folk() -> Self {
        Self {
            id: ReligionId(0),
            name: "Folk Religion".to_string(),
            kind: ReligionKind::Folk,
            branch: ReligionBranch::Mainstream,
            origin_culture: None,
            hearth: None,
            color: [140, 130, 110],
        }
    }

    /// Total resistance budget the religion can spread through.
    pub fn reach(&self, config: &SociologyConfig) -> f32 {
        match (self.kind, self.branch) {
            (ReligionKind::Folk, _) => 0.0,
            (ReligionKind::Cultural, _) => config.cultural_reach,
            (ReligionKind::Universalist, ReligionBranch::Fringe) => config.fringe_reach,
            (ReligionKind::Universalist, ReligionBranch::Mainstream) => config.universalist_reach,
        }
    }

    /// Resistance adjustment for this religion on top of the county resistance.
    pub fn resistance_modifier(&self, config: &SociologyConfig) -> f32 {
        match (self.kind, self.branch) {
            (_, ReligionBranch::Fringe) => config.fringe_penalty,
            (ReligionKind::Universalist, ReligionBranch::Mainstream) => -config.mainstream_discount,
            _ => 0.0,
        }
    }

    /// Title-case label, e.g. "Universalist (Fringe)".
    pub fn describe(&self) -> String {
        match (self.kind, self.branch) {
            (kind, ReligionBranch::Fringe) => format!("{:?} (Fringe)", kind),
            (kind, ReligionBranch::Mainstream) => format!("{:?}", kind),
        }
    }
}
