use rand::Rng;

use crate::types::{AllocConfig, ChunkLengthPolicy};

/// Decides each archive's chunk length, either uniformly at random or
/// along a geometric sequence from the minimum to the maximum.
pub struct ChunkLengthScheduler {
    min: u64,
    max: u64,
    num_archives: usize,
    policy: ChunkLengthPolicy,
}

impl ChunkLengthScheduler {
    pub fn new(config: &AllocConfig) -> Self {
        Self {
            min: config.min_frames_per_chunk,
            max: config.max_frames_per_chunk,
            num_archives: config.num_archives,
            policy: config.chunk_length_policy,
        }
    }

    pub fn chunk_length(&self, archive_index: usize, rng: &mut impl Rng) -> u64 {
        match self.policy {
            ChunkLengthPolicy::Randomized => rng.gen_range(self.min..=self.max),
            ChunkLengthPolicy::Geometric => self.geometric_length(archive_index),
        }
    }

    /// Archive `k` of `n` gets `min * (max/min)^(k/(n-1))`, rounded to the
    /// nearest integer, so lengths climb from `min` at the first archive to
    /// `max` at the last. E.g. min=50, max=200, n=3 gives 50, 100, 200.
    fn geometric_length(&self, archive_index: usize) -> u64 {
        if self.max == self.min || self.num_archives == 1 {
            return self.max;
        }
        let ratio = self.max as f64 / self.min as f64;
        let exponent = archive_index as f64 / (self.num_archives - 1) as f64;
        (ratio.powf(exponent) * self.min as f64 + 0.5) as u64
    }
}
