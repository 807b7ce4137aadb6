//! Name generation for counties, polities, rulers, cultures and faiths.
//!
//! Each naming region has a `NamingArchetype` that defines phonetic preferences,
//! syllable patterns and affixes, so neighbouring places sound related.

pub mod generator;
pub mod styles;

pub use generator::NameGenerator;
pub use styles::{NamingArchetype, NamingStyle};
