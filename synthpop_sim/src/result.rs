//! Execution results and their hand-off form for the persistence layer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use synthpop_core::{GeneratedEntity, GenerationError, Result, ValidationReport};
use synthpop_env::RunId;

/// Full output of one `execute()` call.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    /// Profile the entities were generated from
    pub profile_id: String,

    /// Master seed used
    pub seed: u64,

    pub run_id: RunId,

    /// Number of entities generated
    pub count: usize,

    pub dry_run: bool,

    pub entities: Vec<GeneratedEntity>,

    pub validation: ValidationReport,

    /// Wall time spent generating and validating, in seconds
    pub duration_seconds: f64,

    pub created_at: DateTime<Utc>,
}

/// Provenance record for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityProvenance {
    pub profile_id: String,
    pub run_id: RunId,
    pub master_seed: u64,
    pub index: usize,
    pub seed: u64,
}

impl ExecutionResult {
    /// Provenance for every entity, in index order.
    pub fn provenance(&self) -> impl Iterator<Item = EntityProvenance> + '_ {
        self.entities.iter().map(move |e| EntityProvenance {
            profile_id: self.profile_id.clone(),
            run_id: self.run_id,
            master_seed: self.seed,
            index: e.index,
            seed: e.seed,
        })
    }

    /// Whether the validation report passed.
    pub fn passed(&self) -> bool {
        self.validation.passed()
    }

    /// Compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GenerationError::Serialization(e.to_string()))
    }

    /// Indented JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| GenerationError::Serialization(e.to_string()))
    }
}
