//! Weighted selection shared by the discrete distribution families.

use crate::error::{GenerationError, Result};
use rand::distributions::{Distribution as _, WeightedIndex};
use rand::Rng;

/// Accepted range for probability weights that must describe a full distribution.
pub const WEIGHT_SUM_MIN: f64 = 0.99;
pub const WEIGHT_SUM_MAX: f64 = 1.01;

/// Checks that `weights` form a probability distribution.
///
/// Rejects empty sets, negative or non-finite weights, and sums outside
/// [`WEIGHT_SUM_MIN`, `WEIGHT_SUM_MAX`].
pub fn validate_probabilities<'a, I>(label: &str, weights: I) -> Result<()>
where
    I: IntoIterator<Item = &'a f64>,
{
    let mut sum = 0.0;
    let mut count = 0usize;
    for &w in weights {
        if !w.is_finite() || w < 0.0 {
            return Err(GenerationError::invalid(format!(
                "{} has an invalid weight {}",
                label, w
            )));
        }
        sum += w;
        count += 1;
    }

    if count == 0 {
        return Err(GenerationError::empty(label));
    }
    if !(WEIGHT_SUM_MIN..=WEIGHT_SUM_MAX).contains(&sum) {
        return Err(GenerationError::InvalidWeights {
            label: label.to_string(),
            sum,
        });
    }
    Ok(())
}

/// A list of items with relative weights.
///
/// Weights need not sum to one; they are normalized by their total.
#[derive(Debug, Clone)]
pub struct WeightedChoice<T> {
    items: Vec<T>,
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}

impl<T: Clone> WeightedChoice<T> {
    /// Creates a weighted choice over `(item, weight)` pairs.
    pub fn new(pairs: Vec<(T, f64)>) -> Result<Self> {
        if pairs.is_empty() {
            return Err(GenerationError::empty("weighted choice"));
        }
        let (items, weights): (Vec<T>, Vec<f64>) = pairs.into_iter().unzip();
        let index = build_index(&weights)?;
        Ok(Self { items, weights, index })
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if there are no items (never the case after `new`).
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in declaration order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Draws one item.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> &T {
        &self.items[self.index.sample(rng)]
    }

    /// Draws `n` items.
    ///
    /// With `unique`, each drawn item (and its weight) is removed from the
    /// pool before the next draw, so no item repeats.
    pub fn select_multiple<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        n: usize,
        unique: bool,
    ) -> Result<Vec<T>> {
        if !unique {
            return Ok((0..n).map(|_| self.select(rng).clone()).collect());
        }

        if n > self.items.len() {
            return Err(GenerationError::TooManyUniqueDraws {
                requested: n,
                available: self.items.len(),
            });
        }

        let mut items = self.items.clone();
        let mut weights = self.weights.clone();
        let mut chosen = Vec::with_capacity(n);
        for _ in 0..n {
            let idx = build_index(&weights)?.sample(rng);
            chosen.push(items.remove(idx));
            weights.remove(idx);
        }
        Ok(chosen)
    }
}

fn build_index(weights: &[f64]) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(weights).map_err(|e| match e {
        rand::distributions::WeightedError::NoItem
        | rand::distributions::WeightedError::AllWeightsZero => {
            GenerationError::empty("no option has a positive weight")
        }
        other => GenerationError::invalid(format!("invalid weights: {}", other)),
    })
}
