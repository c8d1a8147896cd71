//! Declarative distribution specifications (the `type`-tagged JSON shape).

use super::explicit::WeightedValue;
use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every accepted spelling of the `type` discriminator.
pub const KNOWN_TYPES: &[&str] = &[
    "normal",
    "uniform",
    "log_normal",
    "lognormal",
    "explicit",
    "categorical",
    "age_band",
    "ageband",
    "conditional",
];

/// A sampling rule as declared in a profile.
///
/// `min`/`max` on the numeric variants are clamp bounds applied after
/// sampling. For `Uniform` they are the range itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionSpec {
    Normal {
        mean: f64,
        #[serde(alias = "std")]
        std_dev: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Uniform {
        min: f64,
        max: f64,
    },
    #[serde(alias = "lognormal")]
    LogNormal {
        mean: f64,
        #[serde(alias = "std")]
        std_dev: f64,
        #[serde(default)]
        min_val: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Explicit {
        values: Vec<WeightedValue>,
    },
    Categorical {
        weights: BTreeMap<String, f64>,
    },
    #[serde(alias = "ageband")]
    AgeBand {
        bands: BTreeMap<String, f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Conditional {
        rules: Vec<ConditionalRuleSpec>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<Box<DistributionSpec>>,
    },
}

/// One `{condition, distribution}` rule of a conditional spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRuleSpec {
    pub condition: String,
    pub distribution: DistributionSpec,
}

impl DistributionSpec {
    /// Decodes a spec from JSON, reporting an unrecognized `type` as
    /// [`GenerationError::UnknownDistributionType`].
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_types(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Canonical name of the variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            DistributionSpec::Normal { .. } => "normal",
            DistributionSpec::Uniform { .. } => "uniform",
            DistributionSpec::LogNormal { .. } => "log_normal",
            DistributionSpec::Explicit { .. } => "explicit",
            DistributionSpec::Categorical { .. } => "categorical",
            DistributionSpec::AgeBand { .. } => "age_band",
            DistributionSpec::Conditional { .. } => "conditional",
        }
    }

    /// Declared clamp bounds.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            DistributionSpec::Normal { min, max, .. }
            | DistributionSpec::LogNormal { min, max, .. }
            | DistributionSpec::AgeBand { min, max, .. } => (*min, *max),
            DistributionSpec::Uniform { min, max } => (Some(*min), Some(*max)),
            DistributionSpec::Explicit { .. }
            | DistributionSpec::Categorical { .. }
            | DistributionSpec::Conditional { .. } => (None, None),
        }
    }

    /// Convenience constructor for a normal spec without bounds.
    pub fn normal(mean: f64, std_dev: f64) -> Self {
        DistributionSpec::Normal { mean, std_dev, min: None, max: None }
    }

    /// Convenience constructor for a categorical spec.
    pub fn categorical<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        DistributionSpec::Categorical {
            weights: weights.into_iter().map(|(k, w)| (k.into(), w)).collect(),
        }
    }
}

/// Checks the `type` tag of a raw spec and of every nested rule and default.
pub(crate) fn check_types(value: &serde_json::Value) -> Result<()> {
    match value.get("type").and_then(|t| t.as_str()) {
        Some(t) if KNOWN_TYPES.contains(&t) => {}
        Some(t) => return Err(GenerationError::UnknownDistributionType(t.to_string())),
        None => {
            return Err(GenerationError::InvalidSpec(
                "distribution is missing its 'type' field".to_string(),
            ))
        }
    }

    if let Some(rules) = value.get("rules").and_then(|r| r.as_array()) {
        for rule in rules {
            if let Some(inner) = rule.get("distribution") {
                check_types(inner)?;
            }
        }
    }
    match value.get("default") {
        Some(serde_json::Value::Null) | None => Ok(()),
        Some(inner) => check_types(inner),
    }
}
