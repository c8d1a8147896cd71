//! Executor configuration.

use serde::{Deserialize, Serialize};
use synthpop_core::ValidationConfig;

/// Default cap on entities generated by a dry run.
pub const DEFAULT_DRY_RUN_CAP: usize = 5;

/// Configuration for [`crate::ProfileExecutor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound on entity count when `dry_run` is set
    pub dry_run_cap: usize,

    /// Tolerances for the post-generation report
    pub validation: ValidationConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dry_run_cap: DEFAULT_DRY_RUN_CAP,
            validation: ValidationConfig::default(),
        }
    }
}

impl ExecutorConfig {
    /// Sets the dry-run cap.
    pub fn with_dry_run_cap(mut self, cap: usize) -> Self {
        self.dry_run_cap = cap;
        self
    }

    /// Sets the validation tolerances.
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }
}
