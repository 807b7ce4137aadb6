//! Naming style definitions.
//!
//! A `NamingStyle` captures the phonetic and structural traits of a region's naming
//! conventions. Counties pick up the style of the naming region they lie in, and
//! cultures inherit the style of their hearth, so names stay phonetically coherent
//! across a culture's territory.

use serde::{Deserialize, Serialize};

/// Phonetic and structural traits for name generation.
#[derive(Clone, Copy, Debug)]
pub struct NamingStyle {
    /// Consonant clusters that appear at the start of syllables.
    pub onsets: &'static [&'static str],
    /// Consonant clusters that appear at the end of syllables.
    pub codas: &'static [&'static str],
    /// Vowel sounds (may include diphthongs like "ae", "ou").
    pub vowels: &'static [&'static str],
    /// Min and max syllable count for personal names.
    pub syllables: (u8, u8),
    /// Whether names can use apostrophes as breaks ("D'kari").
    pub apostrophes: bool,
    pub place_prefixes: &'static [&'static str],
    pub place_suffixes: &'static [&'static str],
    /// Endings that turn a place stem into a culture name ("Durn" → "Durnish").
    pub demonyms: &'static [&'static str],
}

/// Pre-built naming archetypes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NamingArchetype {
    /// Harsh, consonant-heavy: "Krath", "Durnok"
    Harsh,
    /// Flowing, vowel-rich: "Aelindra", "Thalion"
    Flowing,
    /// Compound, earthy: "Aldric", "Thornwall"
    #[default]
    Compound,
    /// Guttural: "Grukash", "Borzag"
    Guttural,
    /// Sibilant: "Ssithak", "Xalith"
    Sibilant,
    /// Ancient, ponderous: "Uthgard", "Kronmor"
    Ancient,
}

impl NamingArchetype {
    pub fn all() -> &'static [NamingArchetype] {
        &[
            NamingArchetype::Harsh,
            NamingArchetype::Flowing,
            NamingArchetype::Compound,
            NamingArchetype::Guttural,
            NamingArchetype::Sibilant,
            NamingArchetype::Ancient,
        ]
    }

    pub fn style(self) -> &'static NamingStyle {
        match self {
            NamingArchetype::Harsh => &HARSH,
            NamingArchetype::Flowing => &FLOWING,
            NamingArchetype::Compound => &COMPOUND,
            NamingArchetype::Guttural => &GUTTURAL,
            NamingArchetype::Sibilant => &SIBILANT,
            NamingArchetype::Ancient => &ANCIENT,
        }
    }
}

static HARSH: NamingStyle = NamingStyle {
    onsets: &["k", "kr", "d", "dr", "g", "gr", "th", "b", "br", "n", "m", "t", "tr", "v", "st", "sk"],
    codas: &["k", "rk", "th", "n", "m", "r", "rd", "ng", "lk", "ld", "x"],
    vowels: &["a", "o", "u", "i", "e", "ur", "or"],
    syllables: (1, 3),
    apostrophes: false,
    place_prefixes: &["Iron", "Black", "Bitter", "Stone", "Dark", "Deep"],
    place_suffixes: &["hold", "forge", "delve", "helm", "guard", "hall", "gate"],
    demonyms: &["ish", "ic", "ar"],
};

static FLOWING: NamingStyle = NamingStyle {
    onsets: &["l", "th", "s", "n", "r", "f", "v", "el", "al", "gl", "br", "m", "c", "t"],
    codas: &["n", "l", "r", "s", "th", "nd", "ll", "rn"],
    vowels: &["ae", "a", "e", "i", "o", "ei", "ia", "io", "ea"],
    syllables: (2, 4),
    apostrophes: false,
    place_prefixes: &["Sil", "Lor", "Thal", "Cel", "Ael", "Gal"],
    place_suffixes: &["wen", "oth", "dor", "ion", "iel", "ost", "anor"],
    demonyms: &["ian", "i", "ine"],
};

static COMPOUND: NamingStyle = NamingStyle {
    onsets: &["b", "d", "g", "h", "l", "m", "n", "r", "s", "t", "w", "j", "f", "p", "c"],
    codas: &["n", "d", "r", "l", "s", "t", "ld", "rd", "nd", "ck"],
    vowels: &["a", "e", "i", "o", "u", "ay", "ow"],
    syllables: (1, 3),
    apostrophes: false,
    place_prefixes: &["North", "South", "East", "West", "Red", "White", "Green", "High", "Low", "Old"],
    place_suffixes: &["ton", "burg", "dale", "ford", "wick", "field", "bridge", "stead", "haven", "mere"],
    demonyms: &["ish", "er", "ian"],
};

static GUTTURAL: NamingStyle = NamingStyle {
    onsets: &["gr", "kr", "g", "z", "b", "dr", "sk", "gh", "v", "r", "hr", "gn"],
    codas: &["k", "g", "gh", "rk", "sh", "rg", "kh", "x"],
    vowels: &["a", "u", "o", "aa", "uu"],
    syllables: (1, 3),
    apostrophes: false,
    place_prefixes: &["Blood", "Skull", "War", "Bone", "Rot", "Ash"],
    place_suffixes: &["maw", "pit", "gore", "fang", "crag", "break"],
    demonyms: &["ak", "ul", "i"],
};

static SIBILANT: NamingStyle = NamingStyle {
    onsets: &["ss", "s", "z", "x", "sh", "th", "ts", "sk", "sl", "zh", "ks"],
    codas: &["ss", "th", "x", "k", "sh", "z", "sk"],
    vowels: &["i", "a", "e", "o", "ai", "ei"],
    syllables: (2, 3),
    apostrophes: true,
    place_prefixes: &["Scale", "Fang", "Venom", "Sand", "Sun", "Salt"],
    place_suffixes: &["spire", "nest", "coil", "den", "rock", "marsh"],
    demonyms: &["ite", "ese", "i"],
};

static ANCIENT: NamingStyle = NamingStyle {
    onsets: &["kr", "b", "g", "th", "m", "d", "n", "r", "st", "br", "tr"],
    codas: &["rn", "rd", "th", "m", "n", "r", "ld", "nd", "lm"],
    vowels: &["o", "u", "a", "au", "ou", "oo"],
    syllables: (2, 3),
    apostrophes: false,
    place_prefixes: &["Grand", "Titan", "Elder", "Basalt", "Thunder", "Crown"],
    place_suffixes: &["mount", "spire", "throne", "cairn", "keep"],
    demonyms: &["ic", "an", "ene"],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_archetypes_have_sounds() {
        for archetype in NamingArchetype::all() {
            let style = archetype.style();
            assert!(!style.onsets.is_empty());
            assert!(!style.codas.is_empty());
            assert!(!style.vowels.is_empty());
            assert!(style.syllables.0 >= 1 && style.syllables.0 <= style.syllables.1);
            assert!(!style.place_prefixes.is_empty());
            assert!(!style.place_suffixes.is_empty());
            assert!(!style.demonyms.is_empty());
        }
    }
}
