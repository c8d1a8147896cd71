//! SynthPop Deterministic Execution
//!
//! Turns a [`ProfileSpecification`](synthpop_core::ProfileSpecification)
//! into a batch of entities that replays bit-for-bit from one master seed.
//!
//! # Core Principle: Hierarchical Seeding
//!
//! All randomness is derived from a single 64-bit seed:
//! - **Master stream**: a ChaCha8 stream seeded with the master seed
//! - **Entity seeds**: the `i`-th draw of the master stream belongs to entity `i`
//! - **Entity streams**: each entity samples from its own ChaCha8 stream
//!
//! ```text
//!   master seed ──► ChaCha8 ──► s0, s1, s2, ...
//!                               │   │   │
//!                               ▼   ▼   ▼
//!                           entity streams (independent)
//! ```
//!
//! Because entity `i` only ever sees its own stream, asking for more
//! entities never changes earlier ones, and sampling can be fanned out
//! across threads once the seeds are drawn.
//!
//! # Usage
//!
//! ```ignore
//! use synthpop_core::ProfileSpecification;
//! use synthpop_sim::ProfileExecutor;
//!
//! let profile = ProfileSpecification::from_json(json)?;
//! let mut executor = ProfileExecutor::new(profile, Some(42))?;
//! let result = executor.execute(None, false)?;
//! println!("{}", result.validation);
//! ```

mod config;
mod context;
mod executor;
mod result;
mod seeds;

pub use config::{ExecutorConfig, DEFAULT_DRY_RUN_CAP};
pub use context::FixedContext;
pub use executor::ProfileExecutor;
pub use result::{EntityProvenance, ExecutionResult};
pub use seeds::HierarchicalSeedManager;
