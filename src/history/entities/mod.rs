//! Entity definitions: culture groups, sub-cultures and dynasties.

pub mod culture;
pub mod lineage;

pub use culture::{CultureGroup, SubCulture};
pub use lineage::Dynasty;
