use rand::Rng;

use crate::catalog::Catalog;
use crate::{AllocError, Result};

/// Upper bound on rejection-sampling draws for a single chunk. Hitting it
/// means no utterance of the chosen category clears the length bound (or
/// the length distribution is extremely skewed), so we fail instead of
/// spinning forever.
const SAMPLE_RETRY_CAP: usize = 100_000;

/// Draws utterance indices with probability proportional to utterance
/// length, balanced across categories.
pub struct LengthWeightedSampler<'a> {
    catalog: &'a Catalog,
}

impl<'a> LengthWeightedSampler<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Sample one utterance index longer than `min_length`.
    ///
    /// Picks a category uniformly from the distinct category set, then
    /// rejection-samples uniform utterance indices: a draw is kept when its
    /// category matches, its length exceeds `min_length`, and an
    /// independent acceptance test passes with probability
    /// `length / max_length`. The acceptance test is what biases the draw
    /// toward longer utterances within the category.
    pub fn sample(&self, min_length: u64, rng: &mut impl Rng) -> Result<usize> {
        let categories = self.catalog.distinct_categories();
        let category = categories[rng.gen_range(0..categories.len())];
        let num_utts = self.catalog.num_utterances();
        let max_length = self.catalog.max_length() as f64;

        for _ in 0..SAMPLE_RETRY_CAP {
            let i = rng.gen_range(0..num_utts);
            // Short-circuit keeps the acceptance draw unconsumed when the
            // cheap tests already reject the index.
            if self.catalog.category(i) == category
                && self.catalog.length(i) > min_length
                && rng.gen::<f64>() < self.catalog.length(i) as f64 / max_length
            {
                return Ok(i);
            }
        }

        Err(AllocError::SamplingExhausted(format!(
            "no utterance of category {} longer than {} frames found in {} draws",
            category, min_length, SAMPLE_RETRY_CAP
        )))
    }
}
