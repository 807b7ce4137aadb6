//! Government types, laws and succession.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How a polity is ruled. Decides title vocabulary, promotion thresholds and laws.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GovernmentType {
    #[default]
    FeudalKingdom,
    ImperialConfederation,
    TribalFederation,
    MerchantRepublic,
}

impl GovernmentType {
    pub fn all() -> &'static [GovernmentType] {
        &[
            GovernmentType::FeudalKingdom,
            GovernmentType::ImperialConfederation,
            GovernmentType::TribalFederation,
            GovernmentType::MerchantRepublic,
        ]
    }

    /// Roll a government with the configured relative weights
    /// (feudal, imperial, tribal, republic).
    pub fn roll(weights: &[f32; 4], rng: &mut impl Rng) -> Self {
        let total: f32 = weights.iter().sum();
        let mut roll = rng.gen::<f32>() * total;
        for (gov, &w) in Self::all().iter().zip(weights) {
            if roll < w {
                return *gov;
            }
            roll -= w;
        }
        GovernmentType::FeudalKingdom
    }

    /// Multiplier on realm-power title thresholds.
    pub fn threshold_multiplier(self) -> f32 {
        match self {
            GovernmentType::FeudalKingdom => 1.0,
            GovernmentType::ImperialConfederation => 0.9,
            GovernmentType::TribalFederation => 1.25,
            GovernmentType::MerchantRepublic => 1.1,
        }
    }

    /// Republics elect their leaders and found no dynasties.
    pub fn has_dynasty(self) -> bool {
        self != GovernmentType::MerchantRepublic
    }
}

/// How much power the crown holds over its vassals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrownAuthority {
    Low,
    Medium,
    High,
}

impl CrownAuthority {
    /// Liberty desire bonus vassals feel under this authority.
    pub fn liberty_bonus(self) -> f32 {
        match self {
            CrownAuthority::Low => 0.0,
            CrownAuthority::Medium => 5.0,
            CrownAuthority::High => 10.0,
        }
    }

    pub fn roll(gov: GovernmentType, rng: &mut impl Rng) -> Self {
        let roll: f32 = rng.gen();
        match gov {
            GovernmentType::ImperialConfederation => {
                if roll < 0.5 { CrownAuthority::High } else { CrownAuthority::Medium }
            }
            GovernmentType::TribalFederation => {
                if roll < 0.6 { CrownAuthority::Low } else { CrownAuthority::Medium }
            }
            GovernmentType::MerchantRepublic => {
                if roll < 0.4 { CrownAuthority::Low } else { CrownAuthority::Medium }
            }
            GovernmentType::FeudalKingdom => {
                if roll < 0.3 {
                    CrownAuthority::Low
                } else if roll < 0.75 {
                    CrownAuthority::Medium
                } else {
                    CrownAuthority::High
                }
            }
        }
    }
}

/// Succession laws for leadership transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuccessionLaw {
    /// Eldest child inherits.
    Primogeniture,
    /// Realm is split among children.
    Partition,
    /// Nobles vote.
    Elective,
    /// Elected from the extended family.
    Tanistry,
    /// Oldest dynasty member.
    Seniority,
}

impl SuccessionLaw {
    /// Get a succession law for a government type.
    pub fn for_government(gov: GovernmentType, rng: &mut impl Rng) -> Self {
        match gov {
            GovernmentType::FeudalKingdom => {
                *pick(rng, &[SuccessionLaw::Primogeniture, SuccessionLaw::Partition, SuccessionLaw::Seniority])
            }
            GovernmentType::ImperialConfederation => SuccessionLaw::Elective,
            GovernmentType::TribalFederation => *pick(rng, &[SuccessionLaw::Tanistry, SuccessionLaw::Partition]),
            GovernmentType::MerchantRepublic => SuccessionLaw::Elective,
        }
    }

    /// Whether this succession law requires an heir from the dynasty.
    pub fn requires_dynasty(&self) -> bool {
        !matches!(self, SuccessionLaw::Elective)
    }
}

/// Laws of an independent ruler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Laws {
    pub crown_authority: CrownAuthority,
    pub succession: SuccessionLaw,
}

impl Laws {
    pub fn roll(gov: GovernmentType, rng: &mut impl Rng) -> Self {
        Self {
            crown_authority: CrownAuthority::roll(gov, rng),
            succession: SuccessionLaw::for_government(gov, rng),
        }
    }
}

fn pick<'a, T>(rng: &mut impl Rng, items: &'a [T]) -> &'a T {
    &items[rng.gen_range(0..items.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_succession_for_government() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let law = SuccessionLaw::for_government(GovernmentType::FeudalKingdom, &mut rng);
        assert!(law.requires_dynasty());

        let law = SuccessionLaw::for_government(GovernmentType::MerchantRepublic, &mut rng);
        assert_eq!(law, SuccessionLaw::Elective);
    }

    #[test]
    fn test_roll_respects_zero_weights() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..100 {
            let gov = GovernmentType::roll(&[0.0, 0.0, 1.0, 0.0], &mut rng);
            assert_eq!(gov, GovernmentType::TribalFederation);
        }
    }

    #[test]
    fn test_crown_bonus() {
        assert_eq!(CrownAuthority::Low.liberty_bonus(), 0.0);
        assert_eq!(CrownAuthority::High.liberty_bonus(), 10.0);
    }
}
