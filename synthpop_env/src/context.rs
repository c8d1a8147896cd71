//! Core environment context trait for SynthPop executors.

use crate::RunId;
use chrono::{DateTime, NaiveDate, Utc};

/// The central interface for environment interaction.
///
/// This trait abstracts the "real world" so that the executor can run
/// against the system clock in production and a pinned clock in tests.
///
/// # Implementations
///
/// - **Production**: `SystemContext` - wraps `chrono::Utc::now()`, OS entropy
/// - **Testing**: `FixedContext` (in `synthpop_sim`) - fixed date, seeded entropy
///
/// # Determinism
///
/// Entity content never depends on this trait except through `today()`,
/// which anchors birth dates. Everything else only decorates the result.
pub trait GenerationContext: Send + Sync {
    /// Returns the reference date for age-to-birth-date derivation.
    fn today(&self) -> NaiveDate;

    /// Returns the wall-clock timestamp for result metadata.
    fn now(&self) -> DateTime<Utc>;

    /// Chooses a seed for a run that was given none.
    ///
    /// In production this is OS entropy, which makes such runs
    /// intentionally non-reproducible. Callers that need replay must
    /// always pass a seed.
    fn fresh_seed(&self) -> u64;

    /// Returns an identifier for one execution with the given master seed.
    fn run_id(&self, seed: u64) -> RunId;
}
