//! Laplace noise for certificate payloads
//!
//! Each certificate payload gets one zero-mean Laplace sample appended to
//! it. This is simulated privacy: it perturbs the recorded data but is not a
//! differential-privacy guarantee over any query, since no query or
//! sensitivity is defined.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Zero-mean Laplace distribution with scale `b`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LaplaceNoise {
    scale: f64,
}

impl LaplaceNoise {
    /// Distribution with the given scale; `scale` must be positive and finite
    pub fn new(scale: f64) -> Self {
        debug_assert!(scale.is_finite() && scale > 0.0);
        Self { scale }
    }

    /// Scale parameter `b`
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Draw one sample by inverting the CDF
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // u = -0.5 maps to ln(0); redraw so every sample is finite
        let u: f64 = loop {
            let u = rng.gen_range(-0.5f64..0.5f64);
            if u > -0.5 {
                break u;
            }
        };
        if u == 0.0 {
            return 0.0;
        }
        -self.scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
    }
}

/// RNG from a fixed seed, or from OS entropy when none is given
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
