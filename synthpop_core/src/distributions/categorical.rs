//! Label -> probability distributions.

use super::weighted::{validate_probabilities, WeightedChoice};
use crate::error::Result;
use rand::Rng;
use std::collections::BTreeMap;

/// Categorical distribution over string labels.
///
/// Probabilities must sum to ~1.0 (see [`validate_probabilities`]).
#[derive(Debug, Clone)]
pub struct CategoricalDistribution {
    weights: BTreeMap<String, f64>,
    choice: WeightedChoice<String>,
}

impl CategoricalDistribution {
    pub fn new(weights: &BTreeMap<String, f64>) -> Result<Self> {
        Self::with_label("categorical", weights)
    }

    /// Like `new`, naming the field in validation errors.
    pub fn with_label(label: &str, weights: &BTreeMap<String, f64>) -> Result<Self> {
        validate_probabilities(label, weights.values())?;
        let pairs = weights.iter().map(|(k, w)| (k.clone(), *w)).collect();
        Ok(Self {
            weights: weights.clone(),
            choice: WeightedChoice::new(pairs)?,
        })
    }

    /// Declared probabilities by label.
    pub fn weights(&self) -> &BTreeMap<String, f64> {
        &self.weights
    }

    /// Draws one label.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.choice.select(rng).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let err = CategoricalDistribution::new(&weights(&[("M", 0.5), ("F", 0.4)])).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidWeights { .. }));
        assert!(err.is_configuration_error());

        assert!(CategoricalDistribution::new(&weights(&[("M", 0.5), ("F", 0.5)])).is_ok());
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let dist = CategoricalDistribution::new(&weights(&[("A", 0.8), ("B", 0.2)])).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 10_000;
        let a = (0..n).filter(|_| dist.sample(&mut rng) == "A").count();
        let share = a as f64 / n as f64;
        assert!((share - 0.8).abs() < 0.02, "share of A was {}", share);
    }
}
