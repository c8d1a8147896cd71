//! Profile specifications: the declarative description of a target population.
//!
//! A profile arrives as JSON from an upstream spec-building step and is
//! treated as immutable input. [`ProfileSpecification::compile`] turns every
//! declared [`DistributionSpec`] into a [`Distribution`] in one pass so that
//! configuration errors surface before a single entity is generated.

use crate::distributions::{create_distribution, CategoricalDistribution, Distribution, DistributionSpec};
use crate::error::{GenerationError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default population size when a profile omits `generation.count`.
pub const DEFAULT_COUNT: usize = 100;

fn default_count() -> usize {
    DEFAULT_COUNT
}

/// Declarative target population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSpecification {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub generation: GenerationSpec,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<DemographicsSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical: Option<ClinicalSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageSpec>,
}

/// Target size and seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSpec {
    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GenerationSpec {
    fn default() -> Self {
        Self {
            count: DEFAULT_COUNT,
            seed: None,
        }
    }
}

/// Demographic fields. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DemographicsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<DistributionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<DistributionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<DistributionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<DistributionSpec>,

    /// Geography resolved upstream; copied verbatim onto every entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geography: Option<Geography>,

    /// Reference-data block; fills whatever `geography` leaves unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Geography>,
}

impl DemographicsSpec {
    /// Geography to stamp on entities: `geography` first, `reference` fills gaps.
    pub fn resolved_geography(&self) -> Option<Geography> {
        match (&self.geography, &self.reference) {
            (None, None) => None,
            (Some(g), None) => Some(g.clone()),
            (None, Some(r)) => Some(r.clone()),
            (Some(g), Some(r)) => Some(Geography {
                state: g.state.clone().or_else(|| r.state.clone()),
                fips: g.fips.clone().or_else(|| r.fips.clone()),
                code: g.code.clone().or_else(|| r.code.clone()),
            }),
        }
    }
}

/// Opaque geography fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fips: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Clinical fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_condition: Option<ConditionSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<DistributionSpec>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comorbidities: Vec<ConditionSpec>,

    /// Sampled in name order, with `severity` in the context.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub lab_values: BTreeMap<String, DistributionSpec>,
}

/// A condition code with its target prevalence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSpec {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub prevalence: f64,
}

impl ConditionSpec {
    pub fn new(code: impl Into<String>, prevalence: f64) -> Self {
        Self {
            code: code.into(),
            description: None,
            prevalence,
        }
    }
}

/// Coverage fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageSpec {
    #[serde(rename = "type", alias = "coverage_type", default, skip_serializing_if = "Option::is_none")]
    pub coverage_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_type: Option<DistributionSpec>,

    /// Plan label -> probability. Takes precedence over `plan_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_distribution: Option<BTreeMap<String, f64>>,
}

impl ProfileSpecification {
    /// Creates an empty profile with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            generation: GenerationSpec::default(),
            demographics: None,
            clinical: None,
            coverage: None,
        }
    }

    /// Parses a profile from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decodes a profile from a JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        check_distribution_types(&value)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Validates and builds every declared distribution.
    pub fn compile(&self) -> Result<CompiledProfile> {
        let demographics = self
            .demographics
            .as_ref()
            .map(|d| -> Result<CompiledDemographics> {
                Ok(CompiledDemographics {
                    age: compile_opt(d.age.as_ref())?,
                    gender: compile_opt(d.gender.as_ref())?,
                    race: compile_opt(d.race.as_ref())?,
                    ethnicity: compile_opt(d.ethnicity.as_ref())?,
                    geography: d.resolved_geography(),
                })
            })
            .transpose()?;

        let clinical = self
            .clinical
            .as_ref()
            .map(|c| -> Result<CompiledClinical> {
                if let Some(primary) = &c.primary_condition {
                    check_prevalence(primary)?;
                }
                for comorbidity in &c.comorbidities {
                    check_prevalence(comorbidity)?;
                }
                let lab_values = c
                    .lab_values
                    .iter()
                    .map(|(name, spec)| Ok((name.clone(), create_distribution(spec)?)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledClinical {
                    primary_condition: c.primary_condition.clone(),
                    severity: compile_opt(c.severity.as_ref())?,
                    comorbidities: c.comorbidities.clone(),
                    lab_values,
                })
            })
            .transpose()?;

        let coverage = self
            .coverage
            .as_ref()
            .map(|c| -> Result<CompiledCoverage> {
                let plan = match (&c.plan_distribution, &c.plan_type) {
                    (Some(weights), _) => Some(PlanSource::Weighted(
                        CategoricalDistribution::with_label("plan_distribution", weights)?,
                    )),
                    (None, Some(spec)) => Some(PlanSource::Spec(create_distribution(spec)?)),
                    (None, None) => None,
                };
                Ok(CompiledCoverage {
                    coverage_type: c.coverage_type.clone(),
                    plan,
                })
            })
            .transpose()?;

        Ok(CompiledProfile {
            demographics,
            clinical,
            coverage,
        })
    }
}

fn compile_opt(spec: Option<&DistributionSpec>) -> Result<Option<Distribution>> {
    spec.map(create_distribution).transpose()
}

fn check_prevalence(condition: &ConditionSpec) -> Result<()> {
    if !(0.0..=1.0).contains(&condition.prevalence) {
        return Err(GenerationError::invalid(format!(
            "prevalence {} for {} is outside [0, 1]",
            condition.prevalence, condition.code
        )));
    }
    Ok(())
}

/// Checks the `type` tag of every distribution position in a raw profile.
fn check_distribution_types(value: &serde_json::Value) -> Result<()> {
    use crate::distributions::check_types;

    fn at<'a>(value: &'a serde_json::Value, section: &str, field: &str) -> Option<&'a serde_json::Value> {
        value.get(section).and_then(|s| s.get(field)).filter(|v| !v.is_null())
    }

    for field in ["age", "gender", "race", "ethnicity"] {
        if let Some(spec) = at(value, "demographics", field) {
            check_types(spec)?;
        }
    }
    if let Some(spec) = at(value, "clinical", "severity") {
        check_types(spec)?;
    }
    if let Some(labs) = at(value, "clinical", "lab_values").and_then(|l| l.as_object()) {
        for spec in labs.values() {
            check_types(spec)?;
        }
    }
    if let Some(spec) = at(value, "coverage", "plan_type") {
        check_types(spec)?;
    }
    Ok(())
}

// =============================================================================
// COMPILED PROFILE
// =============================================================================

/// A profile with every distribution built and validated.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub demographics: Option<CompiledDemographics>,
    pub clinical: Option<CompiledClinical>,
    pub coverage: Option<CompiledCoverage>,
}

#[derive(Debug, Clone)]
pub struct CompiledDemographics {
    pub age: Option<Distribution>,
    pub gender: Option<Distribution>,
    pub race: Option<Distribution>,
    pub ethnicity: Option<Distribution>,
    pub geography: Option<Geography>,
}

#[derive(Debug, Clone)]
pub struct CompiledClinical {
    pub primary_condition: Option<ConditionSpec>,
    pub severity: Option<Distribution>,
    pub comorbidities: Vec<ConditionSpec>,
    /// In name order.
    pub lab_values: Vec<(String, Distribution)>,
}

#[derive(Debug, Clone)]
pub struct CompiledCoverage {
    pub coverage_type: Option<String>,
    pub plan: Option<PlanSource>,
}

/// Where a plan type comes from.
#[derive(Debug, Clone)]
pub enum PlanSource {
    Weighted(CategoricalDistribution),
    Spec(Distribution),
}
