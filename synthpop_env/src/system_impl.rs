//! Production implementation of GenerationContext using the system clock.

use crate::{GenerationContext, RunId};
use chrono::{DateTime, NaiveDate, Utc};

/// Production context backed by the system clock and OS entropy.
///
/// Dates come from `Utc::now()`, fresh seeds from the thread-local
/// OS-seeded generator, run ids from UUIDv4.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemContext;

impl SystemContext {
    /// Creates a new SystemContext.
    pub fn new() -> Self {
        Self
    }
}

impl GenerationContext for SystemContext {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn fresh_seed(&self) -> u64 {
        rand::random()
    }

    fn run_id(&self, _seed: u64) -> RunId {
        // Production runs are unique even when the seed repeats
        RunId::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_context_today_matches_now() {
        let ctx = SystemContext::new();
        let today = ctx.today();
        let now = ctx.now().date_naive();

        // Allow a midnight rollover between the two calls
        assert!(now == today || now.pred_opt() == Some(today));
    }

    #[test]
    fn test_system_context_fresh_seeds_differ() {
        let ctx = SystemContext::new();
        let seeds: Vec<u64> = (0..4).map(|_| ctx.fresh_seed()).collect();

        // Four identical 64-bit draws would mean the entropy source is broken
        assert!(seeds.windows(2).any(|w| w[0] != w[1]));
    }

    #[test]
    fn test_system_context_run_ids_unique() {
        let ctx = SystemContext::new();
        assert_ne!(ctx.run_id(42), ctx.run_id(42));
    }
}
