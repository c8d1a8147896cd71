//! SynthPop Core - Deterministic Synthetic Population Building Blocks
//!
//! Pure, I/O-free pieces of the generation pipeline:
//! 1. **Distributions**: seeded sampling for every family a profile can declare
//! 2. **Conditions**: a small boolean language for condition-dependent sampling
//! 3. **Profiles**: the declarative population model, compiled up front
//! 4. **Validation**: realized aggregate statistics against declared targets
//!
//! Every sampling entry point takes an explicit `rand::Rng`. Nothing in this
//! crate reaches for a global or thread-local random source.

pub mod condition;
pub mod distributions;
pub mod entity;
pub mod error;
pub mod profile;
pub mod stats;
pub mod validation;
pub mod value;

// Re-export key types for convenience
pub use condition::Condition;
pub use distributions::{create_distribution, Distribution, DistributionSpec};
pub use entity::GeneratedEntity;
pub use error::{GenerationError, Result};
pub use profile::{CompiledProfile, ProfileSpecification};
pub use validation::{ProfileValidator, ValidationConfig, ValidationMetric, ValidationReport};
pub use value::{SampleContext, SampleValue};
