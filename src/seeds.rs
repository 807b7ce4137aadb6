//! Seed management for world generation
//!
//! A world is generated from a single string seed. Every generation system draws from
//! its own stream, derived from the master seed by suffixing the system name
//! (`"alpha"` → `"alpha_warp"`, `"alpha_moisture"`, ...), so adding draws to one
//! system never shifts the output of another.

use rand::RngCore;

use crate::error::{GenerationError, Result};

/// Small-state deterministic generator seeded from a string.
///
/// The seed bytes are hash-mixed into a 32-bit state, which is then advanced with a
/// fixed 32-bit mixing step. Identical seeds yield identical infinite sequences on
/// every platform.
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u32,
}

impl SeededRng {
    /// Create a generator from a non-empty seed string.
    pub fn from_seed_str(seed: &str) -> Result<Self> {
        if seed.is_empty() {
            return Err(GenerationError::EmptySeed);
        }
        Ok(Self { state: hash_seed(seed.as_bytes()) })
    }

    /// Next float in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / 4_294_967_296.0
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    fn next_u64(&mut self) -> u64 {
        let hi = self.step() as u64;
        let lo = self.step() as u64;
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Mix seed bytes into a 32-bit state.
fn hash_seed(bytes: &[u8]) -> u32 {
    let mut h: u32 = 1_779_033_703 ^ bytes.len() as u32;
    for &b in bytes {
        h = (h ^ b as u32).wrapping_mul(3_432_918_353);
        h = h.rotate_left(13);
    }
    h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
    h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
    h ^ (h >> 16)
}

/// Named generation systems, each with an independent stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SeedSystem {
    Heightmap,
    Warp,
    Erosion,
    Rivers,
    Moisture,
    Counties,
    Backfill,
    Polities,
    Cultures,
    Religions,
    Court,
    Diplomacy,
    Colors,
}

impl SeedSystem {
    fn suffix(self) -> &'static str {
        match self {
            Self::Heightmap => "heightmap",
            Self::Warp => "warp",
            Self::Erosion => "erosion",
            Self::Rivers => "rivers",
            Self::Moisture => "moisture",
            Self::Counties => "counties",
            Self::Backfill => "backfill",
            Self::Polities => "polities",
            Self::Cultures => "cultures",
            Self::Religions => "religions",
            Self::Court => "court",
            Self::Diplomacy => "diplomacy",
            Self::Colors => "colors",
        }
    }
}

/// Seeds for all world generation systems, derived from one master string.
#[derive(Clone, Debug)]
pub struct WorldSeeds {
    master: String,
}

impl WorldSeeds {
    pub fn from_master(master: &str) -> Result<Self> {
        if master.is_empty() {
            return Err(GenerationError::EmptySeed);
        }
        Ok(Self { master: master.to_string() })
    }

    /// Derived seed string for a system, e.g. `"alpha_warp"`.
    pub fn derive(&self, system: SeedSystem) -> String {
        format!("{}_{}", self.master, system.suffix())
    }

    /// Fresh generator for a system.
    pub fn rng(&self, system: SeedSystem) -> SeededRng {
        SeededRng { state: hash_seed(self.derive(system).as_bytes()) }
    }
}
