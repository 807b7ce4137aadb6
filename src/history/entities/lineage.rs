//! Dynasties (noble houses).

use serde::{Deserialize, Serialize};

use crate::history::{CultureId, DynastyId, PolityId};

/// A noble house ruling one polity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dynasty {
    pub id: DynastyId,
    pub name: String,
    pub origin_culture: Option<CultureId>,
    /// Polity the house was founded in.
    pub seat: PolityId,
}

impl Dynasty {
    pub fn new(id: DynastyId, name: String, origin_culture: Option<CultureId>, seat: PolityId) -> Self {
        Self { id, name, origin_culture, seat }
    }
}
