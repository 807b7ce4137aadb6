//! Civilization systems: polities and realms, titles, government, court, diplomacy
//! and factions.

pub mod court;
pub mod diplomacy;
pub mod faction;
pub mod government;
pub mod polity;
pub mod realms;
pub mod titles;

pub use diplomacy::Alliance;
pub use faction::{Faction, FactionKind};
pub use government::{CrownAuthority, GovernmentType, Laws, SuccessionLaw};
pub use polity::{Polity, Ruler};
pub use titles::TitleTier;
