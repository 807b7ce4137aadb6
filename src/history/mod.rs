//! History generation module
//!
//! Builds the human layer on top of generated terrain: counties, polities and their
//! vassal hierarchies, cultures, religions, dynasties, diplomacy and factions.
//! Every stage is a deterministic pass over the world in pipeline order.

pub mod backfill;
pub mod civilizations;
pub mod config;
pub mod counties;
pub mod entities;
pub mod finalize;
pub mod naming;
pub mod religion;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use config::HistoryConfig;

// =============================================================================
// ID TYPES
// =============================================================================

/// Macro to generate newtype ID wrappers with common derives and Display.
///
/// Ids double as arena indices: the entity with id `n` is stored at index `n` of its
/// collection while the world is being generated.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index as u32)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

// Territory
define_id!(CountyId);
define_id!(PolityId);
define_id!(AncientEmpireId);

// Sociology
define_id!(CultureId);
define_id!(SubCultureId);
define_id!(ReligionId);
define_id!(DynastyId);

// Diplomacy
define_id!(AllianceId);
define_id!(FactionId);

// =============================================================================
// ID GENERATOR
// =============================================================================

/// Monotonic ID generator for a specific ID type.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    next: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next_id<T: From<usize>>(&mut self) -> T {
        let id = self.next;
        self.next += 1;
        T::from(id as usize)
    }
}
