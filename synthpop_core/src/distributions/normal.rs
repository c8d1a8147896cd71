//! Gaussian sampling with bounded resampling.

use crate::error::{GenerationError, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Resample attempts made by [`NormalDistribution::sample_bounded`] before
/// it falls back to clamping.
pub const MAX_BOUNDED_ATTEMPTS: usize = 1000;

/// Normal distribution parameterized by mean and standard deviation.
#[derive(Debug, Clone, Copy)]
pub struct NormalDistribution {
    mean: f64,
    std_dev: f64,
    inner: Normal<f64>,
}

impl NormalDistribution {
    /// Creates a normal distribution; `std_dev` must be finite and >= 0.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self> {
        if !mean.is_finite() {
            return Err(GenerationError::invalid(format!("normal mean {} is not finite", mean)));
        }
        let inner = Normal::new(mean, std_dev).map_err(|_| {
            GenerationError::invalid(format!("normal std_dev {} must be finite and >= 0", std_dev))
        })?;
        Ok(Self { mean, std_dev, inner })
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Draws one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inner.sample(rng)
    }

    /// Draws one value rounded to the nearest integer.
    pub fn sample_int<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        self.sample(rng).round() as i64
    }

    /// Draws a value in `[min_val, max_val]`.
    ///
    /// Rejects out-of-range draws up to [`MAX_BOUNDED_ATTEMPTS`] times. If
    /// every attempt misses, one more value is drawn and clamped, so the
    /// result sits on whichever bound that final draw violated.
    pub fn sample_bounded<R: Rng + ?Sized>(&self, rng: &mut R, min_val: f64, max_val: f64) -> f64 {
        for _ in 0..MAX_BOUNDED_ATTEMPTS {
            let value = self.sample(rng);
            if (min_val..=max_val).contains(&value) {
                return value;
            }
        }
        tracing::warn!(
            mean = self.mean,
            std_dev = self.std_dev,
            min_val,
            max_val,
            "bounded normal sampling exhausted {} attempts, clamping",
            MAX_BOUNDED_ATTEMPTS
        );
        self.sample(rng).clamp(min_val, max_val)
    }
}
