//! Distribution Library
//! ====================
//!
//! Sampling algorithms for every distribution family a profile can
//! declare. Every sampler takes an explicit RNG handle: there is no hidden
//! global or thread-local source anywhere in this module, so a sample is a
//! pure function of its [`DistributionSpec`] and the RNG state.
//!
//! | Family        | Parameters                     | Output  |
//! |---------------|--------------------------------|---------|
//! | `normal`      | mean, std_dev                  | float   |
//! | `uniform`     | min, max                       | float   |
//! | `log_normal`  | mean, std_dev, min_val         | float   |
//! | `explicit`    | [(value, weight)]              | any     |
//! | `categorical` | {label: probability}           | text    |
//! | `age_band`    | {"min-max" / "N+" / "N": w}    | integer |
//! | `conditional` | [(condition, spec)], default   | (inner) |
//!
//! [`create_distribution`] turns a [`DistributionSpec`] into a ready-to-use
//! [`Distribution`], validating parameters and weights once up front.

mod age_band;
mod categorical;
mod conditional;
mod explicit;
mod lognormal;
mod normal;
mod spec;
mod uniform;
mod weighted;

pub use age_band::{AgeBand, AgeBandDistribution, OPEN_BAND_MAX_AGE};
pub use categorical::CategoricalDistribution;
pub use conditional::{ConditionalDistribution, ConditionalRule};
pub use explicit::{ExplicitDistribution, WeightedValue};
pub use lognormal::LogNormalDistribution;
pub use normal::{NormalDistribution, MAX_BOUNDED_ATTEMPTS};
pub use spec::{ConditionalRuleSpec, DistributionSpec, KNOWN_TYPES};
pub(crate) use spec::check_types;
pub use uniform::UniformDistribution;
pub use weighted::{validate_probabilities, WeightedChoice, WEIGHT_SUM_MAX, WEIGHT_SUM_MIN};

use crate::error::{GenerationError, Result};
use crate::value::{SampleContext, SampleValue};
use rand::Rng;

/// The family-specific sampler behind a [`Distribution`].
#[derive(Debug, Clone)]
pub enum Sampler {
    Normal(NormalDistribution),
    Uniform(UniformDistribution),
    LogNormal(LogNormalDistribution),
    Explicit(ExplicitDistribution),
    Categorical(CategoricalDistribution),
    AgeBand(AgeBandDistribution),
    Conditional(ConditionalDistribution),
}

/// A validated distribution together with its declared clamp bounds.
#[derive(Debug, Clone)]
pub struct Distribution {
    sampler: Sampler,
    min: Option<f64>,
    max: Option<f64>,
}

/// Builds a distribution from its spec.
///
/// Fails with a configuration error on invalid parameters, malformed
/// weights, or empty option sets. Nothing is partially constructed.
pub fn create_distribution(spec: &DistributionSpec) -> Result<Distribution> {
    let sampler = match spec {
        DistributionSpec::Normal { mean, std_dev, .. } => {
            Sampler::Normal(NormalDistribution::new(*mean, *std_dev)?)
        }
        DistributionSpec::Uniform { min, max } => Sampler::Uniform(UniformDistribution::new(*min, *max)?),
        DistributionSpec::LogNormal { mean, std_dev, min_val, .. } => {
            Sampler::LogNormal(LogNormalDistribution::new(*mean, *std_dev, *min_val)?)
        }
        DistributionSpec::Explicit { values } => Sampler::Explicit(ExplicitDistribution::new(values)?),
        DistributionSpec::Categorical { weights } => {
            Sampler::Categorical(CategoricalDistribution::new(weights)?)
        }
        DistributionSpec::AgeBand { bands, .. } => Sampler::AgeBand(AgeBandDistribution::new(bands)?),
        DistributionSpec::Conditional { rules, default } => {
            Sampler::Conditional(ConditionalDistribution::new(rules, default.as_deref())?)
        }
    };

    let (min, max) = spec.bounds();
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(GenerationError::invalid(format!(
                "{} bounds [{}, {}] are inverted",
                spec.type_name(),
                lo,
                hi
            )));
        }
    }

    Ok(Distribution { sampler, min, max })
}

impl Distribution {
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Declared clamp bounds.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.min, self.max)
    }

    /// Draws one value. Conditional families see `context` (or an empty one).
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        context: Option<&SampleContext>,
    ) -> Result<SampleValue> {
        self.sample_value(rng, false, context)
    }

    /// Draws one value, rounding numeric results to an integer.
    pub fn sample_int<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        context: Option<&SampleContext>,
    ) -> Result<SampleValue> {
        self.sample_value(rng, true, context)
    }

    /// Samples, clamps into the declared bounds, then optionally rounds.
    ///
    /// Non-numeric values pass through untouched; callers that need a
    /// number decide how to treat them.
    pub fn sample_value<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        as_int: bool,
        context: Option<&SampleContext>,
    ) -> Result<SampleValue> {
        let raw = match &self.sampler {
            Sampler::Normal(d) => SampleValue::Float(d.sample(rng)),
            Sampler::Uniform(d) => SampleValue::Float(d.sample(rng)),
            Sampler::LogNormal(d) => SampleValue::Float(d.sample(rng)),
            Sampler::Explicit(d) => d.sample(rng),
            Sampler::Categorical(d) => SampleValue::Text(d.sample(rng)),
            Sampler::AgeBand(d) => SampleValue::Int(d.sample(rng)),
            Sampler::Conditional(d) => {
                let empty = SampleContext::new();
                d.sample(rng, context.unwrap_or(&empty), as_int)?
            }
        };

        let clamped = self.clamp(raw);
        if as_int {
            round(clamped)
        } else {
            Ok(clamped)
        }
    }

    fn clamp(&self, value: SampleValue) -> SampleValue {
        if self.min.is_none() && self.max.is_none() {
            return value;
        }
        let lo = self.min.unwrap_or(f64::NEG_INFINITY);
        let hi = self.max.unwrap_or(f64::INFINITY);
        match value {
            SampleValue::Float(v) => SampleValue::Float(v.clamp(lo, hi)),
            SampleValue::Int(v) => {
                let c = (v as f64).clamp(lo, hi);
                if c == v as f64 {
                    SampleValue::Int(v)
                } else {
                    SampleValue::Float(c)
                }
            }
            other => other,
        }
    }
}

/// 2^63, the first float past `i64::MAX`.
const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

fn round(value: SampleValue) -> Result<SampleValue> {
    match value {
        SampleValue::Float(v) => {
            let r = v.round();
            if !(-I64_LIMIT..I64_LIMIT).contains(&r) {
                return Err(GenerationError::invalid(format!(
                    "sample {} does not round to a 64-bit integer",
                    v
                )));
            }
            Ok(SampleValue::Int(r as i64))
        }
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn build(value: serde_json::Value) -> Result<Distribution> {
        create_distribution(&DistributionSpec::from_value(value)?)
    }

    #[test]
    fn test_factory_dispatches_every_family() {
        let cases = [
            json!({"type": "normal", "mean": 0.0, "std_dev": 1.0}),
            json!({"type": "uniform", "min": 0.0, "max": 1.0}),
            json!({"type": "log_normal", "mean": 10.0, "std_dev": 2.0}),
            json!({"type": "explicit", "values": [{"value": 1, "weight": 1.0}]}),
            json!({"type": "categorical", "weights": {"x": 1.0}}),
            json!({"type": "age_band", "bands": {"18-64": 1.0}}),
            json!({"type": "conditional", "rules": [], "default": {"type": "uniform", "min": 0, "max": 1}}),
        ];
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for case in cases {
            let dist = build(case.clone()).unwrap_or_else(|e| panic!("{}: {}", case, e));
            assert!(dist.sample(&mut rng, None).is_ok());
        }
    }

    #[test]
    fn test_unknown_type_is_configuration_error() {
        let err = build(json!({"type": "bogus"})).unwrap_err();
        assert!(matches!(err, GenerationError::UnknownDistributionType(_)));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_clamped_into_declared_bounds() {
        let dist = build(json!({"type": "normal", "mean": 7.0, "std_dev": 5.0, "min": 4.0, "max": 14.0})).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..2_000 {
            let v = dist.sample(&mut rng, None).unwrap().as_f64().unwrap();
            assert!((4.0..=14.0).contains(&v));
        }
    }

    #[test]
    fn test_sample_int_rounds_after_clamp() {
        let dist = build(json!({"type": "normal", "mean": 100.0, "std_dev": 0.0, "max": 10.4})).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(dist.sample_int(&mut rng, None).unwrap(), SampleValue::Int(10));
    }

    #[test]
    fn test_sample_int_rejects_unrepresentable_values() {
        let dist = build(json!({"type": "normal", "mean": -1e300, "std_dev": 0.0})).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            dist.sample_int(&mut rng, None),
            Err(GenerationError::InvalidParameter(_))
        ));
        assert_eq!(dist.sample(&mut rng, None).unwrap(), SampleValue::Float(-1e300));
    }

    #[test]
    fn test_text_passes_through_int_conversion() {
        let dist = build(json!({"type": "categorical", "weights": {"severe": 1.0}})).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(dist.sample_int(&mut rng, None).unwrap(), SampleValue::Text("severe".into()));
    }

    #[test]
    fn test_conditional_routes_on_context() {
        let dist = build(json!({
            "type": "conditional",
            "rules": [{"condition": "severity == 'severe'", "distribution": {"type": "uniform", "min": 9.0, "max": 9.0}}],
            "default": {"type": "uniform", "min": 5.0, "max": 5.0}
        }))
        .unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut ctx = SampleContext::new();
        ctx.insert("severity".into(), "severe".into());
        assert_eq!(dist.sample(&mut rng, Some(&ctx)).unwrap(), SampleValue::Float(9.0));

        // Without a context no rule can see `severity`
        assert_eq!(dist.sample(&mut rng, None).unwrap(), SampleValue::Float(5.0));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(build(json!({"type": "normal", "mean": 0.0, "std_dev": 1.0, "min": 5.0, "max": 1.0})).is_err());
    }

    #[test]
    fn test_same_seed_same_samples() {
        let dist = build(json!({"type": "log_normal", "mean": 100.0, "std_dev": 50.0})).unwrap();
        let mut a = ChaCha8Rng::seed_from_u64(77);
        let mut b = ChaCha8Rng::seed_from_u64(77);
        for _ in 0..100 {
            assert_eq!(dist.sample(&mut a, None).unwrap(), dist.sample(&mut b, None).unwrap());
        }
    }
}
