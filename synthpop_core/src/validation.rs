//! Validation Module - Realized Statistics vs Declared Targets
//! ===========================================================
//!
//! Compares aggregate statistics of a generated population against the
//! targets its profile declared.
//!
//! | Section                      | Metric                  | Default tolerance |
//! |------------------------------|-------------------------|-------------------|
//! | `demographics.age` (normal)  | `Age (mean)`            | 5%                |
//! | `demographics.gender`        | `Gender <label>`        | 5%                |
//! | `clinical.primary_condition` | `Primary condition <c>` | 5%                |
//! | `clinical.comorbidities`     | `Comorbidity <c>`       | 10%               |
//! | `coverage.plan_distribution` | `Plan <label>`          | 5%                |
//!
//! Statistical misses are never errors: they show up as failed metrics in a
//! report that still belongs to a successful run.
//!
//! Usage:
//! ```ignore
//! use synthpop_core::validation::{ProfileValidator, ValidationConfig};
//!
//! let validator = ProfileValidator::new(&profile, ValidationConfig::default());
//! let report = validator.validate(&entities, expected_count);
//! println!("{}", report);
//! ```

use crate::distributions::DistributionSpec;
use crate::entity::GeneratedEntity;
use crate::profile::{ConditionSpec, ProfileSpecification};
use crate::stats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

// =============================================================================
// VALIDATION METRIC
// =============================================================================

/// One target-vs-actual comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationMetric {
    pub name: String,
    pub target: f64,
    pub actual: f64,
    /// Maximum relative deviation still counted as passing
    pub tolerance: f64,
    passed: bool,
}

impl ValidationMetric {
    /// Creates a metric; `passed` is fixed here.
    ///
    /// A zero target passes only on a zero actual. Otherwise the relative
    /// error must not exceed `tolerance`.
    pub fn new(name: impl Into<String>, target: f64, actual: f64, tolerance: f64) -> Self {
        let passed = if target == 0.0 {
            actual == 0.0
        } else {
            stats::relative_error(actual, target) <= tolerance
        };
        Self {
            name: name.into(),
            target,
            actual,
            tolerance,
            passed,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn relative_error(&self) -> f64 {
        stats::relative_error(self.actual, self.target)
    }
}

// =============================================================================
// VALIDATION REPORT
// =============================================================================

/// Aggregate QA result for one population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    metrics: Vec<ValidationMetric>,
    warnings: Vec<String>,
    errors: Vec<String>,
    passed: bool,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationReport {
    /// An empty report passes.
    pub fn new() -> Self {
        Self {
            metrics: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            passed: true,
        }
    }

    pub fn add_metric(&mut self, metric: ValidationMetric) {
        self.passed &= metric.passed;
        self.metrics.push(metric);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.passed = false;
    }

    pub fn metrics(&self) -> &[ValidationMetric] {
        &self.metrics
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// No errors and every metric passed.
    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn failed_metrics(&self) -> impl Iterator<Item = &ValidationMetric> {
        self.metrics.iter().filter(|m| !m.passed)
    }

    pub fn metric(&self, name: &str) -> Option<&ValidationMetric> {
        self.metrics.iter().find(|m| m.name == name)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let passed = self.metrics.iter().filter(|m| m.passed).count();
        writeln!(
            f,
            "Validation {}: {}/{} metrics passed, {} warnings, {} errors",
            if self.passed { "PASSED" } else { "FAILED" },
            passed,
            self.metrics.len(),
            self.warnings.len(),
            self.errors.len()
        )?;
        for m in &self.metrics {
            writeln!(
                f,
                "  [{}] {:<28} target {:>10.4}  actual {:>10.4}  tol {:>5.1}%",
                if m.passed { "ok" } else { "!!" },
                m.name,
                m.target,
                m.actual,
                m.tolerance * 100.0
            )?;
        }
        for w in &self.warnings {
            writeln!(f, "  warning: {}", w)?;
        }
        for e in &self.errors {
            writeln!(f, "  error: {}", e)?;
        }
        Ok(())
    }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Per-section tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub age_tolerance: f64,
    pub gender_tolerance: f64,
    pub primary_condition_tolerance: f64,
    pub comorbidity_tolerance: f64,
    pub plan_tolerance: f64,
    /// Below this many entities the report carries a sample-size warning
    pub min_reliable_sample: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            age_tolerance: 0.05,
            gender_tolerance: 0.05,
            primary_condition_tolerance: 0.05,
            comorbidity_tolerance: 0.10,
            plan_tolerance: 0.05,
            min_reliable_sample: 30,
        }
    }
}

impl ValidationConfig {
    pub fn with_age_tolerance(mut self, tolerance: f64) -> Self {
        self.age_tolerance = tolerance;
        self
    }

    pub fn with_gender_tolerance(mut self, tolerance: f64) -> Self {
        self.gender_tolerance = tolerance;
        self
    }

    pub fn with_primary_condition_tolerance(mut self, tolerance: f64) -> Self {
        self.primary_condition_tolerance = tolerance;
        self
    }

    pub fn with_comorbidity_tolerance(mut self, tolerance: f64) -> Self {
        self.comorbidity_tolerance = tolerance;
        self
    }

    pub fn with_plan_tolerance(mut self, tolerance: f64) -> Self {
        self.plan_tolerance = tolerance;
        self
    }

    pub fn with_min_reliable_sample(mut self, n: usize) -> Self {
        self.min_reliable_sample = n;
        self
    }
}

// =============================================================================
// PROFILE VALIDATOR
// =============================================================================

/// Targets extracted from a profile, checked against generated entities.
#[derive(Debug, Clone)]
pub struct ProfileValidator {
    config: ValidationConfig,
    age_mean: Option<f64>,
    gender: Option<BTreeMap<String, f64>>,
    primary_condition: Option<ConditionSpec>,
    comorbidities: Vec<ConditionSpec>,
    plans: Option<BTreeMap<String, f64>>,
}

impl ProfileValidator {
    pub fn new(profile: &ProfileSpecification, config: ValidationConfig) -> Self {
        let demographics = profile.demographics.as_ref();
        let age_mean = match demographics.and_then(|d| d.age.as_ref()) {
            Some(DistributionSpec::Normal { mean, .. }) => Some(*mean),
            _ => None,
        };
        let gender = match demographics.and_then(|d| d.gender.as_ref()) {
            Some(DistributionSpec::Categorical { weights }) => Some(weights.clone()),
            _ => None,
        };

        let clinical = profile.clinical.as_ref();
        let plans = profile.coverage.as_ref().and_then(|c| {
            c.plan_distribution.clone().or_else(|| match &c.plan_type {
                Some(DistributionSpec::Categorical { weights }) => Some(weights.clone()),
                _ => None,
            })
        });

        Self {
            config,
            age_mean,
            gender,
            primary_condition: clinical.and_then(|c| c.primary_condition.clone()),
            comorbidities: clinical.map(|c| c.comorbidities.clone()).unwrap_or_default(),
            plans,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Builds the report for `entities`, expecting `expected_count` of them.
    pub fn validate(&self, entities: &[GeneratedEntity], expected_count: usize) -> ValidationReport {
        let mut report = ValidationReport::new();
        let n = entities.len();

        if n == 0 {
            report.add_warning("No entities generated; nothing to validate");
            return report;
        }
        if n < self.config.min_reliable_sample {
            report.add_warning(format!(
                "Sample of {} entities is below {}; metrics are unreliable",
                n, self.config.min_reliable_sample
            ));
        }
        if n != expected_count {
            report.add_error(format!(
                "Expected {} entities, generated {}",
                expected_count, n
            ));
        }

        if let Some(target) = self.age_mean {
            match stats::mean(entities.iter().filter_map(|e| e.age).map(|a| a as f64)) {
                Some(actual) => report.add_metric(ValidationMetric::new(
                    "Age (mean)",
                    target,
                    actual,
                    self.config.age_tolerance,
                )),
                None => report.add_warning("Age is declared but no entity has an age"),
            }
        }

        if let Some(weights) = &self.gender {
            for (label, target) in weights {
                let hits = entities
                    .iter()
                    .filter(|e| e.gender.as_ref().and_then(|g| g.as_str()) == Some(label.as_str()))
                    .count();
                report.add_metric(ValidationMetric::new(
                    format!("Gender {}", label),
                    *target,
                    stats::proportion(hits, n),
                    self.config.gender_tolerance,
                ));
            }
        }

        if let Some(primary) = &self.primary_condition {
            report.add_metric(prevalence_metric(
                "Primary condition",
                primary,
                entities,
                self.config.primary_condition_tolerance,
            ));
        }
        for comorbidity in &self.comorbidities {
            report.add_metric(prevalence_metric(
                "Comorbidity",
                comorbidity,
                entities,
                self.config.comorbidity_tolerance,
            ));
        }

        if let Some(weights) = &self.plans {
            for (label, target) in weights {
                let hits = entities
                    .iter()
                    .filter(|e| e.plan_type.as_ref().and_then(|p| p.as_str()) == Some(label.as_str()))
                    .count();
                report.add_metric(ValidationMetric::new(
                    format!("Plan {}", label),
                    *target,
                    stats::proportion(hits, n),
                    self.config.plan_tolerance,
                ));
            }
        }

        for m in report.failed_metrics() {
            warn!(
                "Validation metric '{}' missed: target {:.4}, actual {:.4} (tolerance {:.0}%)",
                m.name,
                m.target,
                m.actual,
                m.tolerance * 100.0
            );
        }

        report
    }
}

fn prevalence_metric(
    prefix: &str,
    condition: &ConditionSpec,
    entities: &[GeneratedEntity],
    tolerance: f64,
) -> ValidationMetric {
    let hits = entities.iter().filter(|e| e.has_condition(&condition.code)).count();
    ValidationMetric::new(
        format!("{} {}", prefix, condition.code),
        condition.prevalence,
        stats::proportion(hits, entities.len()),
        tolerance,
    )
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SampleValue;
    use serde_json::json;

    fn profile() -> ProfileSpecification {
        ProfileSpecification::from_value(json!({
            "id": "v",
            "demographics": {
                "age": {"type": "normal", "mean": 40.0, "std_dev": 5.0},
                "gender": {"type": "categorical", "weights": {"M": 0.5, "F": 0.5}}
            },
            "clinical": {
                "primary_condition": {"code": "E11", "prevalence": 0.5},
                "comorbidities": [{"code": "I10", "prevalence": 0.0}]
            },
            "coverage": {"plan_distribution": {"HMO": 1.0}}
        }))
        .unwrap()
    }

    fn entities(n: usize) -> Vec<GeneratedEntity> {
        (0..n)
            .map(|i| {
                let mut e = GeneratedEntity::new(i, i as u64);
                e.age = Some(if i % 2 == 0 { 38 } else { 42 });
                e.gender = Some(SampleValue::from(if i % 2 == 0 { "M" } else { "F" }));
                if i % 2 == 0 {
                    e.conditions.insert("E11".into());
                }
                e.plan_type = Some(SampleValue::from("HMO"));
                e
            })
            .collect()
    }

    #[test]
    fn test_metric_pass_rule() {
        assert!(ValidationMetric::new("m", 45.0, 47.0, 0.05).passed());
        assert!(!ValidationMetric::new("m", 45.0, 48.0, 0.05).passed());
        assert!(ValidationMetric::new("m", 0.0, 0.0, 0.05).passed());
        assert!(!ValidationMetric::new("m", 0.0, 0.001, 0.05).passed());
    }

    #[test]
    fn test_default_report_matches_new() {
        let mut report = ValidationReport::default();
        assert_eq!(report, ValidationReport::new());
        assert!(report.passed());

        report.add_warning("small sample");
        assert!(report.passed());
        report.add_metric(ValidationMetric::new("m", 1.0, 1.0, 0.05));
        assert!(report.passed());
        report.add_error("count mismatch");
        assert!(!report.passed());
    }

    #[test]
    fn test_perfect_population_passes() {
        let validator = ProfileValidator::new(&profile(), ValidationConfig::default());
        let report = validator.validate(&entities(40), 40);

        assert!(report.passed(), "{}", report);
        let names: Vec<&str> = report.metrics().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Age (mean)", "Gender F", "Gender M", "Primary condition E11", "Comorbidity I10", "Plan HMO"]
        );
        assert!(report.warnings().is_empty());
        assert_eq!(report.failed_metrics().count(), 0);
    }

    #[test]
    fn test_zero_entities_single_warning() {
        let validator = ProfileValidator::new(&profile(), ValidationConfig::default());
        let report = validator.validate(&[], 10);
        assert_eq!(report.warnings().len(), 1);
        assert!(report.errors().is_empty());
        assert!(report.metrics().is_empty());
    }

    #[test]
    fn test_small_sample_warns() {
        let validator = ProfileValidator::new(&profile(), ValidationConfig::default());
        let report = validator.validate(&entities(10), 10);
        assert_eq!(report.warnings().len(), 1);
        assert!(report.passed());
    }

    #[test]
    fn test_count_mismatch_is_error() {
        let validator = ProfileValidator::new(&profile(), ValidationConfig::default());
        let report = validator.validate(&entities(40), 50);
        assert_eq!(report.errors().len(), 1);
        assert!(!report.passed());
    }

    #[test]
    fn test_statistical_miss_is_failed_metric() {
        let mut population = entities(40);
        for e in &mut population {
            e.age = Some(60);
        }
        let config = ValidationConfig::default().with_age_tolerance(0.10);
        let report = ProfileValidator::new(&profile(), config).validate(&population, 40);

        assert!(!report.passed());
        assert!(report.errors().is_empty());
        let failed: Vec<_> = report.failed_metrics().map(|m| m.name.clone()).collect();
        assert_eq!(failed, vec!["Age (mean)".to_string()]);
        assert!(report.to_string().contains("FAILED"));
    }
}
