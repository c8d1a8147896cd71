//! Context-dependent selection among distributions.

use super::spec::{ConditionalRuleSpec, DistributionSpec};
use super::{create_distribution, Distribution};
use crate::condition::Condition;
use crate::error::{GenerationError, Result};
use crate::value::{SampleContext, SampleValue};
use rand::Rng;

/// A parsed rule: when `condition` holds, sample `distribution`.
#[derive(Debug, Clone)]
pub struct ConditionalRule {
    pub condition: Condition,
    pub distribution: Distribution,
}

/// Ordered rules with an optional fallback.
///
/// The first rule whose condition holds wins. Without a match the default
/// is used; without a default, sampling fails with
/// [`GenerationError::UnmatchedConditional`].
#[derive(Debug, Clone)]
pub struct ConditionalDistribution {
    rules: Vec<ConditionalRule>,
    default: Option<Box<Distribution>>,
}

impl ConditionalDistribution {
    pub fn new(rules: &[ConditionalRuleSpec], default: Option<&DistributionSpec>) -> Result<Self> {
        if rules.is_empty() && default.is_none() {
            return Err(GenerationError::empty("conditional distribution has no rules and no default"));
        }

        let rules = rules
            .iter()
            .map(|rule| {
                Ok(ConditionalRule {
                    condition: Condition::new(&rule.condition),
                    distribution: create_distribution(&rule.distribution)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let default = default
            .map(|spec| create_distribution(spec).map(Box::new))
            .transpose()?;

        Ok(Self { rules, default })
    }

    pub fn rules(&self) -> &[ConditionalRule] {
        &self.rules
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Picks the distribution that applies in `context`.
    pub fn select(&self, context: &SampleContext) -> Result<&Distribution> {
        if let Some(rule) = self.rules.iter().find(|r| r.condition.evaluate(context)) {
            tracing::trace!(condition = rule.condition.source(), "conditional rule matched");
            return Ok(&rule.distribution);
        }
        self.default
            .as_deref()
            .ok_or(GenerationError::UnmatchedConditional {
                rules: self.rules.len(),
            })
    }

    /// Selects by `context` and samples the chosen distribution.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        context: &SampleContext,
        as_int: bool,
    ) -> Result<SampleValue> {
        self.select(context)?.sample_value(rng, as_int, Some(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn spec(value: serde_json::Value) -> DistributionSpec {
        DistributionSpec::from_value(value).unwrap()
    }

    fn severity_spec(with_default: bool) -> DistributionSpec {
        let mut value = json!({
            "type": "conditional",
            "rules": [
                {"condition": "severity == 'severe'", "distribution": {"type": "normal", "mean": 9.5, "std_dev": 0.0}},
                {"condition": "severity in ['moderate', 'severe']", "distribution": {"type": "normal", "mean": 7.5, "std_dev": 0.0}},
            ]
        });
        if with_default {
            value["default"] = json!({"type": "normal", "mean": 5.5, "std_dev": 0.0});
        }
        spec(value)
    }

    fn ctx(severity: &str) -> SampleContext {
        let mut c = SampleContext::new();
        c.insert("severity".into(), severity.into());
        c
    }

    fn build(spec: &DistributionSpec) -> ConditionalDistribution {
        match spec {
            DistributionSpec::Conditional { rules, default } => {
                ConditionalDistribution::new(rules, default.as_deref()).unwrap()
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let dist = build(&severity_spec(true));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(dist.sample(&mut rng, &ctx("severe"), false).unwrap(), SampleValue::Float(9.5));
        assert_eq!(dist.sample(&mut rng, &ctx("moderate"), false).unwrap(), SampleValue::Float(7.5));
        assert_eq!(dist.sample(&mut rng, &ctx("mild"), false).unwrap(), SampleValue::Float(5.5));
    }

    #[test]
    fn test_unmatched_without_default_fails() {
        let dist = build(&severity_spec(false));
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = dist.sample(&mut rng, &ctx("mild"), false).unwrap_err();
        assert_eq!(err, GenerationError::UnmatchedConditional { rules: 2 });
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_malformed_rule_falls_through_to_default() {
        let spec = spec(json!({
            "type": "conditional",
            "rules": [{"condition": "severity === 'severe'", "distribution": {"type": "normal", "mean": 1.0, "std_dev": 0.0}}],
            "default": {"type": "normal", "mean": 2.0, "std_dev": 0.0}
        }));
        let dist = build(&spec);
        assert!(dist.rules()[0].condition.is_malformed());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(dist.sample(&mut rng, &ctx("severe"), false).unwrap(), SampleValue::Float(2.0));
    }

    #[test]
    fn test_nested_errors_surface_at_construction() {
        let spec = spec(json!({
            "type": "conditional",
            "rules": [{"condition": "true", "distribution": {"type": "categorical", "weights": {"a": 0.2}}}]
        }));
        let DistributionSpec::Conditional { rules, default } = &spec else { unreachable!() };
        assert!(matches!(
            ConditionalDistribution::new(rules, default.as_deref()),
            Err(GenerationError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_empty_conditional_rejected() {
        assert!(matches!(
            ConditionalDistribution::new(&[], None),
            Err(GenerationError::EmptyOptions(_))
        ));
    }
}
