// Randomness strategy for the trace generator.
// The generator only asks for Gaussian draws and coin flips, so tests can swap
// in a noiseless source without depending on one PRNG's output stream.

use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::constants::DEFAULT_SEED_BASE;
use crate::types::WeekIndex;

pub trait GlucoseRng {
    /// One draw from N(mean, sd).
    fn gaussian(&mut self, mean: f64, sd: f64) -> f64;

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool;
}

/// Seed for a given week: `seed_base + week`.
pub fn week_seed(seed_base: u64, week: WeekIndex) -> u64 {
    seed_base.wrapping_add(u64::from(week.get()))
}

/// `StdRng`-backed source. Same seed, same draws.
pub struct SeededRng {
    inner: StdRng,
}

impl SeededRng {
    pub fn from_seed(seed: u64) -> Self {
        SeededRng {
            inner: StdRng::seed_from_u64(seed),
        }
    }

    pub fn for_week(week: WeekIndex) -> Self {
        Self::from_seed(week_seed(DEFAULT_SEED_BASE, week))
    }
}

impl GlucoseRng for SeededRng {
    fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        match Normal::new(mean, sd) {
            Ok(normal) => normal.sample(&mut self.inner),
            // sd of zero (or a degenerate parameter) collapses to the mean
            Err(_) => mean,
        }
    }

    fn chance(&mut self, p: f64) -> bool {
        self.inner.gen::<f64>() < p
    }
}

/// Noiseless source: every Gaussian draw returns its mean.
/// Coin flips come out as `coin`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroNoise {
    pub coin: bool,
}

impl GlucoseRng for ZeroNoise {
    fn gaussian(&mut self, mean: f64, _sd: f64) -> f64 {
        mean
    }

    fn chance(&mut self, _p: f64) -> bool {
        self.coin
    }
}

impl<R: GlucoseRng + ?Sized> GlucoseRng for &mut R {
    fn gaussian(&mut self, mean: f64, sd: f64) -> f64 {
        (**self).gaussian(mean, sd)
    }

    fn chance(&mut self, p: f64) -> bool {
        (**self).chance(p)
    }
}
