//! Log-normal sampling parameterized by the target (linear-space) moments.

use crate::error::{GenerationError, Result};
use rand::Rng;
use rand_distr::{Distribution, LogNormal};

/// Log-normal distribution whose samples have the given mean and standard
/// deviation, floored at `min_val`.
///
/// The linear-space moments are mapped to log space by the method of moments:
///
/// ```text
/// variance = std_dev²
/// mu       = ln(mean² / sqrt(variance + mean²))
/// sigma    = sqrt(ln(1 + variance / mean²))
/// ```
///
/// A non-positive mean has no log-space counterpart; such a distribution
/// always yields `min_val`.
#[derive(Debug, Clone, Copy)]
pub struct LogNormalDistribution {
    mean: f64,
    std_dev: f64,
    min_val: f64,
    inner: Option<LogNormal<f64>>,
}

impl LogNormalDistribution {
    pub fn new(mean: f64, std_dev: f64, min_val: f64) -> Result<Self> {
        if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 || !min_val.is_finite() {
            return Err(GenerationError::invalid(format!(
                "log-normal parameters mean={} std_dev={} min_val={} are invalid",
                mean, std_dev, min_val
            )));
        }

        let inner = if mean <= 0.0 {
            None
        } else {
            let (mu, sigma) = Self::log_space(mean, std_dev);
            let dist = LogNormal::new(mu, sigma)
                .map_err(|e| GenerationError::invalid(format!("log-normal: {}", e)))?;
            Some(dist)
        };

        Ok(Self { mean, std_dev, min_val, inner })
    }

    /// Maps linear-space mean/std_dev to log-space `(mu, sigma)`.
    pub fn log_space(mean: f64, std_dev: f64) -> (f64, f64) {
        let variance = std_dev * std_dev;
        let mean_sq = mean * mean;
        let mu = (mean_sq / (variance + mean_sq).sqrt()).ln();
        let sigma = (1.0 + variance / mean_sq).ln().sqrt();
        (mu, sigma)
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    pub fn min_val(&self) -> f64 {
        self.min_val
    }

    /// Draws one value, never below `min_val`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match &self.inner {
            Some(dist) => dist.sample(rng).max(self.min_val),
            None => self.min_val,
        }
    }

    /// Draws one value rounded to the nearest integer.
    pub fn sample_int<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        self.sample(rng).round() as i64
    }
}
