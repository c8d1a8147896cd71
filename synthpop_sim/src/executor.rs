//! Profile executor - turns a profile specification into a batch of entities.

use crate::config::ExecutorConfig;
use crate::result::ExecutionResult;
use crate::seeds::HierarchicalSeedManager;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::Instant;
use synthpop_core::profile::{
    CompiledClinical, CompiledCoverage, CompiledDemographics, CompiledProfile, PlanSource,
};
use synthpop_core::{
    Distribution, GeneratedEntity, GenerationError, ProfileSpecification, ProfileValidator, Result,
    SampleContext, SampleValue,
};
use synthpop_env::{GenerationContext, SystemContext};
use tracing::{debug, info, trace};

/// Runs a profile against a master seed.
///
/// Every distribution is compiled when the executor is built, so a broken
/// profile is rejected before any entity exists. Entity `i` depends only on
/// the profile and its own derived seed: neither the batch size nor other
/// entities influence it.
pub struct ProfileExecutor<C: GenerationContext = SystemContext> {
    profile: ProfileSpecification,
    compiled: CompiledProfile,
    seed: u64,
    seeds: HierarchicalSeedManager,
    context: C,
    config: ExecutorConfig,
    validator: ProfileValidator,
}

impl ProfileExecutor<SystemContext> {
    /// Creates an executor backed by the system clock.
    ///
    /// The effective seed is `seed`, else `profile.generation.seed`, else a
    /// fresh non-reproducible one.
    pub fn new(profile: ProfileSpecification, seed: Option<u64>) -> Result<Self> {
        Self::with_context(profile, seed, SystemContext::new())
    }
}

impl<C: GenerationContext> ProfileExecutor<C> {
    /// Creates an executor with an explicit environment context.
    pub fn with_context(profile: ProfileSpecification, seed: Option<u64>, context: C) -> Result<Self> {
        let compiled = profile.compile()?;

        let seed = match seed.or(profile.generation.seed) {
            Some(seed) => seed,
            None => {
                let fresh = context.fresh_seed();
                info!(
                    "Profile '{}' has no seed; using fresh seed {} (not reproducible unless recorded)",
                    profile.id, fresh
                );
                fresh
            }
        };

        let config = ExecutorConfig::default();
        let validator = ProfileValidator::new(&profile, config.validation.clone());

        Ok(Self {
            profile,
            compiled,
            seed,
            seeds: HierarchicalSeedManager::new(seed),
            context,
            config,
            validator,
        })
    }

    /// Replaces the executor configuration.
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.validator = ProfileValidator::new(&self.profile, config.validation.clone());
        self.config = config;
        self
    }

    /// Effective master seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn profile(&self) -> &ProfileSpecification {
        &self.profile
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Number of entities a call would produce.
    ///
    /// A zero override falls back to the profile count. Dry runs are capped.
    pub fn resolve_count(&self, count_override: Option<usize>, dry_run: bool) -> usize {
        let count = count_override
            .filter(|&c| c > 0)
            .unwrap_or(self.profile.generation.count);
        if dry_run {
            count.min(self.config.dry_run_cap)
        } else {
            count
        }
    }

    /// Generates entities `0..count` one after another.
    ///
    /// Any error aborts the whole call; no partial result is returned.
    pub fn execute(&mut self, count_override: Option<usize>, dry_run: bool) -> Result<ExecutionResult> {
        let count = self.resolve_count(count_override, dry_run);
        let started = Instant::now();
        info!(
            "Executing profile '{}' (seed={}, count={}, dry_run={})",
            self.profile.id, self.seed, count, dry_run
        );

        let builder = EntityBuilder::new(&self.compiled, self.context.today());
        let mut entities = Vec::with_capacity(count);
        for index in 0..count {
            let seed = self.seeds.get_entity_seed(index);
            entities.push(builder.build(index, seed)?);
        }

        Ok(self.finish(entities, count, dry_run, started))
    }

    /// Same output as [`execute`](Self::execute), sampling entities on the
    /// rayon pool.
    ///
    /// Seeds are materialized sequentially first; each entity then owns an
    /// independent RNG stream.
    pub fn execute_parallel(
        &mut self,
        count_override: Option<usize>,
        dry_run: bool,
    ) -> Result<ExecutionResult> {
        let count = self.resolve_count(count_override, dry_run);
        let started = Instant::now();
        info!(
            "Executing profile '{}' in parallel (seed={}, count={}, dry_run={})",
            self.profile.id, self.seed, count, dry_run
        );

        let seeds = self.seeds.materialize(count);
        let builder = EntityBuilder::new(&self.compiled, self.context.today());
        let entities = seeds
            .par_iter()
            .enumerate()
            .map(|(index, &seed)| builder.build(index, seed))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.finish(entities, count, dry_run, started))
    }

    fn finish(
        &self,
        entities: Vec<GeneratedEntity>,
        expected: usize,
        dry_run: bool,
        started: Instant,
    ) -> ExecutionResult {
        let validation = self.validator.validate(&entities, expected);
        let duration_seconds = started.elapsed().as_secs_f64();

        info!(
            "Profile '{}' complete: {} entities in {:.3}s, validation {}",
            self.profile.id,
            entities.len(),
            duration_seconds,
            if validation.passed() { "passed" } else { "failed" }
        );

        ExecutionResult {
            profile_id: self.profile.id.clone(),
            seed: self.seed,
            run_id: self.context.run_id(self.seed),
            count: entities.len(),
            dry_run,
            entities,
            validation,
            duration_seconds,
            created_at: self.context.now(),
        }
    }
}

// =============================================================================
// ENTITY BUILDER
// =============================================================================

/// Samples one entity from a compiled profile.
///
/// Draws happen in a fixed order: age, gender, race, ethnicity, birth month,
/// birth day, primary condition, severity, comorbidities, lab values (by
/// name), plan type. Changing that order changes every generated population.
struct EntityBuilder<'a> {
    profile: &'a CompiledProfile,
    today: NaiveDate,
}

impl<'a> EntityBuilder<'a> {
    fn new(profile: &'a CompiledProfile, today: NaiveDate) -> Self {
        Self { profile, today }
    }

    fn build(&self, index: usize, seed: u64) -> Result<GeneratedEntity> {
        let mut rng = HierarchicalSeedManager::rng_for_seed(seed);
        let mut entity = GeneratedEntity::new(index, seed);

        if let Some(demographics) = &self.profile.demographics {
            self.sample_demographics(demographics, &mut rng, &mut entity)?;
        }
        if let Some(clinical) = &self.profile.clinical {
            sample_clinical(clinical, &mut rng, &mut entity)?;
        }
        if let Some(coverage) = &self.profile.coverage {
            sample_coverage(coverage, &mut rng, &mut entity)?;
        }

        trace!(
            "Entity {} (seed={}): age={:?} conditions={}",
            index,
            seed,
            entity.age,
            entity.conditions.len()
        );
        Ok(entity)
    }

    fn sample_demographics(
        &self,
        demographics: &CompiledDemographics,
        rng: &mut ChaCha8Rng,
        entity: &mut GeneratedEntity,
    ) -> Result<()> {
        if let Some(dist) = &demographics.age {
            let value = dist.sample_int(rng, None)?;
            let age = value
                .as_f64()
                .ok_or_else(|| GenerationError::non_numeric("age", &value))? as i64;
            entity.age = Some(age);
        }

        entity.gender = sample_opt(demographics.gender.as_ref(), rng)?;
        entity.race = sample_opt(demographics.race.as_ref(), rng)?;
        entity.ethnicity = sample_opt(demographics.ethnicity.as_ref(), rng)?;

        if let Some(age) = entity.age {
            entity.birth_date = Some(self.birth_date(age, rng)?);
        }

        if let Some(geography) = &demographics.geography {
            entity.geography = Some(geography.clone());
        }
        Ok(())
    }

    /// Birth year is `today.year - age`; month and day are uniform, with the
    /// day capped at 28 so every month is valid.
    fn birth_date(&self, age: i64, rng: &mut ChaCha8Rng) -> Result<NaiveDate> {
        let month: u32 = rng.gen_range(1..=12);
        let day: u32 = rng.gen_range(1..=28);
        let invalid = || {
            GenerationError::InvalidDate(format!(
                "{} minus age {} ({:02}-{:02})",
                self.today.year(),
                age,
                month,
                day
            ))
        };

        let year = i64::from(self.today.year()).checked_sub(age).ok_or_else(invalid)?;
        i32::try_from(year)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month, day))
            .ok_or_else(invalid)
    }
}

fn sample_opt(dist: Option<&Distribution>, rng: &mut ChaCha8Rng) -> Result<Option<SampleValue>> {
    dist.map(|d| d.sample(rng, None)).transpose()
}

fn sample_clinical(
    clinical: &CompiledClinical,
    rng: &mut ChaCha8Rng,
    entity: &mut GeneratedEntity,
) -> Result<()> {
    if let Some(primary) = &clinical.primary_condition {
        if rng.gen::<f64>() < primary.prevalence {
            entity.conditions.insert(primary.code.clone());
        }
    }

    if let Some(dist) = &clinical.severity {
        let severity = dist.sample(rng, None)?;
        entity.attributes.insert("severity".to_string(), severity.clone());
        entity.severity = Some(severity);
    }

    for comorbidity in &clinical.comorbidities {
        if rng.gen::<f64>() < comorbidity.prevalence {
            entity.conditions.insert(comorbidity.code.clone());
        }
    }

    if !clinical.lab_values.is_empty() {
        let mut context = SampleContext::new();
        if let Some(severity) = &entity.severity {
            context.insert("severity".to_string(), severity.clone());
        }
        for (name, dist) in &clinical.lab_values {
            let value = dist.sample(rng, Some(&context))?;
            let numeric = value
                .as_f64()
                .ok_or_else(|| GenerationError::non_numeric(name.as_str(), &value))?;
            entity.lab_values.insert(name.clone(), numeric);
        }
    }
    Ok(())
}

fn sample_coverage(
    coverage: &CompiledCoverage,
    rng: &mut ChaCha8Rng,
    entity: &mut GeneratedEntity,
) -> Result<()> {
    entity.coverage_type = coverage.coverage_type.clone();
    entity.plan_type = match &coverage.plan {
        Some(PlanSource::Weighted(dist)) => {
            debug!("Plan type drawn from plan_distribution");
            Some(SampleValue::Text(dist.sample(rng)))
        }
        Some(PlanSource::Spec(dist)) => Some(dist.sample(rng, None)?),
        None => None,
    };
    Ok(())
}
