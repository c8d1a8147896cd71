//! Age bands: pick a band by weight, then an integer age inside it.

use super::weighted::{validate_probabilities, WeightedChoice};
use crate::error::{GenerationError, Result};
use rand::Rng;
use std::collections::BTreeMap;

/// Upper bound implied by an open-ended `"N+"` band.
pub const OPEN_BAND_MAX_AGE: i64 = 95;

/// An inclusive integer age range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBand {
    pub min: i64,
    pub max: i64,
}

impl AgeBand {
    /// Parses `"min-max"`, `"N+"` or a bare `"N"`.
    pub fn parse(label: &str) -> Result<Self> {
        let label = label.trim();
        let bad = || GenerationError::invalid(format!("invalid age band '{}'", label));
        let parse_age = |s: &str| s.trim().parse::<i64>().map_err(|_| bad());

        let band = if let Some(open) = label.strip_suffix('+') {
            let min = parse_age(open)?;
            Self { min, max: OPEN_BAND_MAX_AGE.max(min) }
        } else if let Some((lo, hi)) = label.split_once('-') {
            Self { min: parse_age(lo)?, max: parse_age(hi)? }
        } else {
            let age = parse_age(label)?;
            Self { min: age, max: age }
        };

        if band.min < 0 || band.min > band.max {
            return Err(bad());
        }
        Ok(band)
    }
}

/// Weighted mixture of uniform integer age bands.
#[derive(Debug, Clone)]
pub struct AgeBandDistribution {
    choice: WeightedChoice<AgeBand>,
}

impl AgeBandDistribution {
    pub fn new(bands: &BTreeMap<String, f64>) -> Result<Self> {
        validate_probabilities("age bands", bands.values())?;
        let pairs = bands
            .iter()
            .map(|(label, w)| AgeBand::parse(label).map(|band| (band, *w)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            choice: WeightedChoice::new(pairs)?,
        })
    }

    /// Parsed bands in label order.
    pub fn bands(&self) -> &[AgeBand] {
        self.choice.items()
    }

    /// Draws an integer age.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        let band = *self.choice.select(rng);
        rng.gen_range(band.min..=band.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bands(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(AgeBand::parse("0-17").unwrap(), AgeBand { min: 0, max: 17 });
        assert_eq!(AgeBand::parse("65+").unwrap(), AgeBand { min: 65, max: 95 });
        assert_eq!(AgeBand::parse("40").unwrap(), AgeBand { min: 40, max: 40 });
        assert_eq!(AgeBand::parse(" 18 - 64 ").unwrap(), AgeBand { min: 18, max: 64 });
        assert!(AgeBand::parse("adult").is_err());
        assert!(AgeBand::parse("30-20").is_err());
        assert!(AgeBand::parse("-5").is_err());
    }

    #[test]
    fn test_single_band_stays_inside() {
        let dist = AgeBandDistribution::new(&bands(&[("0-17", 1.0)])).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..1_000 {
            let age = dist.sample(&mut rng);
            assert!((0..=17).contains(&age));
        }
    }

    #[test]
    fn test_open_band_capped_at_95() {
        let dist = AgeBandDistribution::new(&bands(&[("65+", 1.0)])).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let ages: Vec<i64> = (0..2_000).map(|_| dist.sample(&mut rng)).collect();
        assert!(ages.iter().all(|a| (65..=95).contains(a)));
        assert!(ages.contains(&95));
    }

    #[test]
    fn test_band_weights_validated() {
        assert!(AgeBandDistribution::new(&bands(&[("0-17", 0.3), ("18-64", 0.3)])).is_err());
    }
}
