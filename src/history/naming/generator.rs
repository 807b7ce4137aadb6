//! Name generation from naming styles.
//!
//! Personal names are built syllable by syllable from a style's onsets, vowels and
//! codas. Place names either join a prefix and suffix or append a suffix to a
//! syllable stem. Everything else (cultures, faiths, houses, leagues) is built on
//! top of those two.

use rand::Rng;

use super::styles::NamingStyle;

/// Name generator that produces names from a `NamingStyle`.
pub struct NameGenerator;

impl NameGenerator {
    /// Generate a personal name (e.g., "Krath", "Aelindra").
    pub fn personal_name(style: &NamingStyle, rng: &mut impl Rng) -> String {
        let (lo, hi) = style.syllables;
        let syllables = rng.gen_range(lo..=hi.max(lo));
        let mut name = String::new();

        for i in 0..syllables {
            if i > 0 && style.apostrophes && rng.gen_bool(0.15) {
                name.push('\'');
            }

            // Vowel-leading first syllables now and then
            if i > 0 || !rng.gen_bool(0.2) {
                name.push_str(pick(style.onsets, rng));
            }
            name.push_str(pick(style.vowels, rng));

            let coda_chance = if i + 1 == syllables { 0.7 } else { 0.4 };
            if rng.gen_bool(coda_chance) {
                name.push_str(pick(style.codas, rng));
            }
        }

        if name.len() < 2 {
            name.push('a');
        }
        capitalize(&name)
    }

    /// Generate a place name (e.g., "Ironhold", "Thalwen", "Durnokford").
    pub fn place_name(style: &NamingStyle, rng: &mut impl Rng) -> String {
        if rng.gen_bool(0.5) {
            format!("{}{}", pick(style.place_prefixes, rng), pick(style.place_suffixes, rng))
        } else if rng.gen_bool(0.5) {
            let stem = Self::personal_name(style, rng);
            format!("{}{}", stem, pick(style.place_suffixes, rng))
        } else {
            Self::personal_name(style, rng)
        }
    }

    /// Culture name from a syllable stem and a demonym ending ("Durnish").
    pub fn culture_name(style: &NamingStyle, rng: &mut impl Rng) -> String {
        let stem = Self::personal_name(style, rng);
        let stem = stem.trim_end_matches(|c: char| "aeiouy'".contains(c));
        let stem = if stem.len() < 2 { "Ar" } else { stem };
        format!("{}{}", stem, pick(style.demonyms, rng))
    }

    /// Faith name for a named religion ("Church of Aldric", "Thalionism").
    pub fn faith_name(style: &NamingStyle, rng: &mut impl Rng) -> String {
        let prophet = Self::personal_name(style, rng);
        match rng.gen_range(0..4) {
            0 => format!("Church of {}", prophet),
            1 => format!("{}ism", prophet.trim_end_matches(|c: char| "aeiouy".contains(c))),
            2 => format!("Path of {}", Self::place_name(style, rng)),
            _ => format!("Followers of {}", prophet),
        }
    }

    /// Dynasty name ("House Krath").
    pub fn house_name(style: &NamingStyle, rng: &mut impl Rng) -> String {
        format!("House {}", Self::personal_name(style, rng))
    }

    /// Alliance bloc name ("League of Redford").
    pub fn league_name(style: &NamingStyle, rng: &mut impl Rng) -> String {
        let place = Self::place_name(style, rng);
        match rng.gen_range(0..3) {
            0 => format!("League of {}", place),
            1 => format!("{} Pact", place),
            _ => format!("Concord of {}", place),
        }
    }
}

/// Uniform pick from a non-empty list; an empty list yields "".
pub fn pick<'a>(items: &[&'a str], rng: &mut impl Rng) -> &'a str {
    if items.is_empty() {
        return "";
    }
    items[rng.gen_range(0..items.len())]
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::naming::styles::NamingArchetype;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_personal_name_capitalized() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for archetype in NamingArchetype::all() {
            for _ in 0..20 {
                let name = NameGenerator::personal_name(archetype.style(), &mut rng);
                assert!(name.len() >= 2, "Name too short: '{}' for {:?}", name, archetype);
                assert!(name.chars().next().map_or(false, |c| c.is_uppercase()), "{}", name);
            }
        }
    }

    #[test]
    fn test_names_are_varied() {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let style = NamingArchetype::Harsh.style();
        let names: std::collections::HashSet<String> =
            (0..20).map(|_| NameGenerator::place_name(style, &mut rng)).collect();
        assert!(names.len() >= 10, "Too few unique names: {:?}", names);
    }

    #[test]
    fn test_flowing_longer_than_harsh() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let avg = |style: &NamingStyle, rng: &mut ChaCha8Rng| {
            (0..50).map(|_| NameGenerator::personal_name(style, rng).len() as f32).sum::<f32>() / 50.0
        };
        let harsh = avg(NamingArchetype::Harsh.style(), &mut rng);
        let flowing = avg(NamingArchetype::Flowing.style(), &mut rng);
        assert!(flowing > harsh, "flowing {:.1} vs harsh {:.1}", flowing, harsh);
    }

    #[test]
    fn test_compound_names() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let style = NamingArchetype::Compound.style();
        assert!(NameGenerator::house_name(style, &mut rng).starts_with("House "));
        assert!(!NameGenerator::culture_name(style, &mut rng).is_empty());
        assert!(!NameGenerator::faith_name(style, &mut rng).is_empty());
        assert!(!NameGenerator::league_name(style, &mut rng).is_empty());
    }
}
