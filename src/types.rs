//! Core types for the examplan allocation pipeline

use serde::Deserialize;

use crate::{AllocError, Result};

/// How each archive's chunk length is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkLengthPolicy {
    /// Uniformly random per archive within `[min, max]`.
    Randomized,
    /// Geometric interpolation from `min` at archive 0 to `max` at the last.
    Geometric,
}

/// Validated parameters for one allocation run.
#[derive(Debug, Clone)]
pub struct AllocConfig {
    /// Minimum frames per chunk used for any archive.
    pub min_frames_per_chunk: u64,
    /// Maximum frames per chunk used for any archive.
    pub max_frames_per_chunk: u64,
    pub chunk_length_policy: ChunkLengthPolicy,
    /// Target number of frames per archive.
    pub frames_per_iter: u64,
    pub num_archives: usize,
    /// Number of parallel jobs consuming the archives; must not exceed
    /// `num_archives`.
    pub num_jobs: usize,
    pub seed: u64,
    /// Override for the category-histogram width; derived from the catalog
    /// when absent.
    pub num_categories: Option<u32>,
    /// Prefix applied to every output file name (e.g. to separate train
    /// from diagnostic manifests). Empty means no prefix.
    pub prefix: String,
}

impl AllocConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_frames_per_chunk < 2 {
            return Err(AllocError::Config(format!(
                "min-frames-per-chunk must be at least 2, got {}",
                self.min_frames_per_chunk
            )));
        }
        if self.max_frames_per_chunk < self.min_frames_per_chunk {
            return Err(AllocError::Config(format!(
                "max-frames-per-chunk ({}) must be >= min-frames-per-chunk ({})",
                self.max_frames_per_chunk, self.min_frames_per_chunk
            )));
        }
        if self.frames_per_iter < 1000 {
            return Err(AllocError::Config(format!(
                "frames-per-iter must be at least 1000, got {}",
                self.frames_per_iter
            )));
        }
        if self.num_archives < 1 {
            return Err(AllocError::Config("num-archives must be at least 1".into()));
        }
        if self.num_jobs < 1 {
            return Err(AllocError::Config("num-jobs must be at least 1".into()));
        }
        if self.num_jobs > self.num_archives {
            return Err(AllocError::Config(format!(
                "num-jobs ({}) must not exceed num-archives ({})",
                self.num_jobs, self.num_archives
            )));
        }
        Ok(())
    }

    /// File-name prefix with its separating underscore, or empty.
    pub fn file_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}_", self.prefix)
        }
    }
}

/// One sampled chunk: which utterance it comes from and where it starts.
/// The chunk length is fixed per archive and lives on [`Archive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkEntry {
    pub utterance: usize,
    pub offset: u64,
}

/// An output shard: a fixed chunk length plus the sampled entries that
/// together total roughly `frames_per_iter` frames.
#[derive(Debug, Clone)]
pub struct Archive {
    pub chunk_length: u64,
    pub entries: Vec<ChunkEntry>,
}

/// Runtime-configurable allocation plan parsed from JSON input.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimePlan {
    #[serde(default = "default_min_frames", alias = "minFramesPerChunk")]
    pub min_frames_per_chunk: u64,
    #[serde(default = "default_max_frames", alias = "maxFramesPerChunk")]
    pub max_frames_per_chunk: u64,
    #[serde(default = "default_randomize", alias = "randomizeChunkLength")]
    pub randomize_chunk_length: bool,
    #[serde(default = "default_frames_per_iter", alias = "framesPerIter")]
    pub frames_per_iter: u64,
    #[serde(alias = "numArchives", alias = "archives")]
    pub num_archives: usize,
    #[serde(alias = "numJobs", alias = "jobs")]
    pub num_jobs: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default, alias = "numCategories")]
    pub num_categories: Option<u32>,
    #[serde(default)]
    pub prefix: String,
}

fn default_min_frames() -> u64 {
    50
}

fn default_max_frames() -> u64 {
    300
}

fn default_randomize() -> bool {
    true
}

fn default_frames_per_iter() -> u64 {
    1_000_000
}

fn default_seed() -> u64 {
    1
}

impl RuntimePlan {
    pub fn to_config(&self) -> Result<AllocConfig> {
        let config = AllocConfig {
            min_frames_per_chunk: self.min_frames_per_chunk,
            max_frames_per_chunk: self.max_frames_per_chunk,
            chunk_length_policy: if self.randomize_chunk_length {
                ChunkLengthPolicy::Randomized
            } else {
                ChunkLengthPolicy::Geometric
            },
            frames_per_iter: self.frames_per_iter,
            num_archives: self.num_archives,
            num_jobs: self.num_jobs,
            seed: self.seed,
            num_categories: self.num_categories,
            prefix: self.prefix.clone(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AllocConfig {
        AllocConfig {
            min_frames_per_chunk: 50,
            max_frames_per_chunk: 300,
            chunk_length_policy: ChunkLengthPolicy::Randomized,
            frames_per_iter: 1_000_000,
            num_archives: 4,
            num_jobs: 2,
            seed: 1,
            num_categories: None,
            prefix: String::new(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn rejects_tiny_min_chunk() {
        let mut config = base_config();
        config.min_frames_per_chunk = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_chunk_bounds() {
        let mut config = base_config();
        config.max_frames_per_chunk = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_small_frames_per_iter() {
        let mut config = base_config();
        config.frames_per_iter = 999;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_more_jobs_than_archives() {
        let mut config = base_config();
        config.num_jobs = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn prefix_gains_separator_when_set() {
        let mut config = base_config();
        assert_eq!(config.file_prefix(), "");
        config.prefix = "diagnostic".to_string();
        assert_eq!(config.file_prefix(), "diagnostic_");
    }

    #[test]
    fn plan_json_fills_defaults() {
        let plan: RuntimePlan =
            serde_json::from_str(r#"{"num_archives": 6, "num_jobs": 3}"#).unwrap();
        let config = plan.to_config().unwrap();
        assert_eq!(config.min_frames_per_chunk, 50);
        assert_eq!(config.max_frames_per_chunk, 300);
        assert_eq!(config.frames_per_iter, 1_000_000);
        assert_eq!(config.seed, 1);
        assert_eq!(config.chunk_length_policy, ChunkLengthPolicy::Randomized);
    }

    #[test]
    fn plan_json_accepts_aliases() {
        let plan: RuntimePlan = serde_json::from_str(
            r#"{"archives": 2, "jobs": 2, "randomizeChunkLength": false, "minFramesPerChunk": 60}"#,
        )
        .unwrap();
        let config = plan.to_config().unwrap();
        assert_eq!(config.chunk_length_policy, ChunkLengthPolicy::Geometric);
        assert_eq!(config.min_frames_per_chunk, 60);
    }

    #[test]
    fn plan_validation_propagates() {
        let plan: RuntimePlan =
            serde_json::from_str(r#"{"num_archives": 1, "num_jobs": 3}"#).unwrap();
        assert!(plan.to_config().is_err());
    }
}
