//! SynthPop Environment Abstraction Layer
//!
//! Generation itself is a pure function of a profile and a seed. The few
//! remaining touch points with the outside world are funnelled through
//! [`GenerationContext`]:
//! - Reference date (`today()`), used to turn a sampled age into a birth date
//! - Wall clock (`now()`), stamped on execution results
//! - Entropy (`fresh_seed()`), only used when the caller supplied no seed
//!
//! Production code uses [`SystemContext`]. Tests pin all three through a
//! fixed context so that a whole execution, timestamps included, replays
//! exactly.
//!
//! # Example
//!
//! ```ignore
//! use synthpop_env::{GenerationContext, SystemContext};
//!
//! let ctx = SystemContext::new();
//! let seed = ctx.fresh_seed();
//! let run = ctx.run_id(seed);
//! ```

mod context;
mod system_impl;
mod types;

pub use context::GenerationContext;
pub use system_impl::SystemContext;
pub use types::RunId;
