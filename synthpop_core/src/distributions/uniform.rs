//! Inclusive uniform sampling.

use crate::error::{GenerationError, Result};
use rand::Rng;

/// Uniform distribution over `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct UniformDistribution {
    min: f64,
    max: f64,
}

impl UniformDistribution {
    /// Creates a uniform distribution; requires finite `min <= max` whose
    /// width `max - min` is also finite.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(GenerationError::invalid(format!(
                "uniform range [{}, {}] is empty or not finite",
                min, max
            )));
        }
        if !(max - min).is_finite() {
            return Err(GenerationError::invalid(format!(
                "uniform range [{}, {}] is too wide to sample",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Draws a float in `[min, max]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.gen_range(self.min..=self.max)
    }

    /// Draws an integer in `[trunc(min), trunc(max)]`.
    pub fn sample_int<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let low = self.min.trunc() as i64;
        let high = self.max.trunc() as i64;
        rng.gen_range(low..=high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_rejects_inverted_range() {
        assert!(UniformDistribution::new(5.0, 1.0).is_err());
        assert!(UniformDistribution::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_rejects_range_wider_than_f64() {
        let err = UniformDistribution::new(-1e308, 1e308).unwrap_err();
        assert!(err.is_configuration_error());
        assert!(UniformDistribution::new(-1e307, 1e307).is_ok());
    }

    #[test]
    fn test_sample_in_range() {
        let dist = UniformDistribution::new(2.5, 7.5).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..1_000 {
            let v = dist.sample(&mut rng);
            assert!((2.5..=7.5).contains(&v));
        }
    }

    #[test]
    fn test_sample_int_truncates_bounds_and_covers_them() {
        let dist = UniformDistribution::new(1.9, 3.9).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen = [false; 3];
        for _ in 0..1_000 {
            let v = dist.sample_int(&mut rng);
            assert!((1..=3).contains(&v));
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
