//! Explicit weighted value lists.

use super::weighted::WeightedChoice;
use crate::error::Result;
use crate::value::SampleValue;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One `(value, weight)` entry of an explicit distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue {
    pub value: SampleValue,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

/// Samples from an explicit list of values with relative weights.
#[derive(Debug, Clone)]
pub struct ExplicitDistribution {
    choice: WeightedChoice<SampleValue>,
}

impl ExplicitDistribution {
    pub fn new(values: &[WeightedValue]) -> Result<Self> {
        let pairs = values.iter().map(|v| (v.value.clone(), v.weight)).collect();
        Ok(Self {
            choice: WeightedChoice::new(pairs)?,
        })
    }

    /// Draws one value.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> SampleValue {
        self.choice.select(rng).clone()
    }

    /// Draws `n` values; with `unique`, a drawn value leaves the pool.
    pub fn sample_multiple<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        unique: bool,
    ) -> Result<Vec<SampleValue>> {
        self.choice.select_multiple(rng, n, unique)
    }

    /// Number of declared values.
    pub fn len(&self) -> usize {
        self.choice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choice.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn values() -> Vec<WeightedValue> {
        vec![
            WeightedValue { value: "E11.9".into(), weight: 3.0 },
            WeightedValue { value: "I10".into(), weight: 1.0 },
            WeightedValue { value: SampleValue::Int(250), weight: 1.0 },
        ]
    }

    #[test]
    fn test_sample_returns_declared_value() {
        let dist = ExplicitDistribution::new(&values()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let declared: Vec<SampleValue> = values().into_iter().map(|v| v.value).collect();
        for _ in 0..100 {
            assert!(declared.contains(&dist.sample(&mut rng)));
        }
    }

    #[test]
    fn test_unique_mode_exhausts_all_values() {
        let dist = ExplicitDistribution::new(&values()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut drawn = dist.sample_multiple(&mut rng, 3, true).unwrap();
        drawn.sort_by_key(|v| v.to_string());
        assert_eq!(
            drawn,
            vec![SampleValue::Int(250), "E11.9".into(), "I10".into()]
        );
        assert!(matches!(
            dist.sample_multiple(&mut rng, 4, true),
            Err(GenerationError::TooManyUniqueDraws { .. })
        ));
    }

    #[test]
    fn test_weight_defaults_to_one() {
        let parsed: Vec<WeightedValue> =
            serde_json::from_str(r#"[{"value": "a"}, {"value": "b", "weight": 2}]"#).unwrap();
        assert_eq!(parsed[0].weight, 1.0);
        assert_eq!(parsed[1].weight, 2.0);
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(
            ExplicitDistribution::new(&[]),
            Err(GenerationError::EmptyOptions(_))
        ));
    }
}
