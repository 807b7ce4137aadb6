//! Coherent 2D gradient noise driven by a seeded stream.
//!
//! Each `GradientNoise` owns its own permutation table, so fields built from
//! different seed derivatives (`seed_warp`, `seed_moisture`) are independent.

use noise::NoiseFn;
use rand::Rng;

const TABLE_SIZE: usize = 256;

/// Unit gradients indexed by the low three hash bits.
const GRADIENTS: [(f64, f64); 8] = [
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2),
    (-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2),
    (std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2),
    (-std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2),
];

/// Gradient noise over a shuffled 256-slot permutation table.
#[derive(Clone, Debug)]
pub struct GradientNoise {
    perm: [u8; TABLE_SIZE * 2],
}

impl GradientNoise {
    /// Build a noise field; consumes 255 draws from `rng` to shuffle the table.
    pub fn new(rng: &mut impl Rng) -> Self {
        let mut table = [0u8; TABLE_SIZE];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        for i in (1..TABLE_SIZE).rev() {
            let j = rng.gen_range(0..=i);
            table.swap(i, j);
        }

        let mut perm = [0u8; TABLE_SIZE * 2];
        for i in 0..TABLE_SIZE * 2 {
            perm[i] = table[i % TABLE_SIZE];
        }
        Self { perm }
    }

    fn hash(&self, xi: usize, yi: usize) -> usize {
        self.perm[self.perm[xi] as usize + yi] as usize
    }

    fn corner(&self, xi: usize, yi: usize, dx: f64, dy: f64) -> f64 {
        let (gx, gy) = GRADIENTS[self.hash(xi, yi) & 7];
        gx * dx + gy * dy
    }

    /// Sample at `(x, y)`; result lies in `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let xi = (x0 as i64).rem_euclid(TABLE_SIZE as i64) as usize;
        let yi = (y0 as i64).rem_euclid(TABLE_SIZE as i64) as usize;

        let n00 = self.corner(xi, yi, fx, fy);
        let n10 = self.corner(xi + 1, yi, fx - 1.0, fy);
        let n01 = self.corner(xi, yi + 1, fx, fy - 1.0);
        let n11 = self.corner(xi + 1, yi + 1, fx - 1.0, fy - 1.0);

        let u = smoothstep(fx);
        let v = smoothstep(fy);
        let top = lerp(n00, n10, u);
        let bottom = lerp(n01, n11, u);
        // Corner dot products peak at ~0.707 in 2D
        (lerp(top, bottom, v) * std::f64::consts::SQRT_2).clamp(-1.0, 1.0)
    }
}

impl NoiseFn<f64, 2> for GradientNoise {
    fn get(&self, point: [f64; 2]) -> f64 {
        self.sample(point[0], point[1])
    }
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::SeededRng;
    use proptest::prelude::*;

    fn field(seed: &str) -> GradientNoise {
        let mut rng = SeededRng::from_seed_str(seed).unwrap();
        GradientNoise::new(&mut rng)
    }

    #[test]
    fn test_zero_at_lattice_points() {
        let noise = field("alpha");
        assert_eq!(noise.get([3.0, 7.0]), 0.0);
    }

    #[test]
    fn test_deterministic_per_seed() {
        let a = field("alpha_warp");
        let b = field("alpha_warp");
        assert_eq!(a.get([1.3, 4.7]), b.get([1.3, 4.7]));
    }

    #[test]
    fn test_derivatives_are_independent() {
        let warp = field("alpha_warp");
        let moisture = field("alpha_moisture");
        let differs = (0..20)
            .map(|i| i as f64 * 0.37 + 0.11)
            .any(|t| (warp.get([t, t * 1.7]) - moisture.get([t, t * 1.7])).abs() > 1e-9);
        assert!(differs);
    }

    #[test]
    fn test_continuity() {
        let noise = field("alpha");
        let a = noise.get([2.5, 2.5]);
        let b = noise.get([2.5001, 2.5]);
        assert!((a - b).abs() < 0.01);
    }

    proptest! {
        #[test]
        fn prop_sample_in_range(x in -500.0f64..500.0, y in -500.0f64..500.0) {
            let noise = field("range");
            let v = noise.get([x, y]);
            prop_assert!((-1.0..=1.0).contains(&v));
        }
    }
}
