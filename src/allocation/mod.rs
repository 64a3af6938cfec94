//! Archive construction: per-archive chunk-length scheduling plus
//! length-weighted, category-balanced sampling of chunk entries.

pub mod offset;
pub mod sampler;
pub mod scheduler;


use rand::Rng;
use tracing::info;

use crate::catalog::Catalog;
use crate::types::{AllocConfig, Archive, ChunkEntry};
use crate::Result;

use offset::pick_offset;
use sampler::LengthWeightedSampler;
use scheduler::ChunkLengthScheduler;

/// Build every archive for the run, drawing from one shared generator in
/// archive order so a seed fully determines the plan.
pub fn build_archives(
    catalog: &Catalog,
    config: &AllocConfig,
    rng: &mut impl Rng,
) -> Result<Vec<Archive>> {
    let scheduler = ChunkLengthScheduler::new(config);
    let sampler = LengthWeightedSampler::new(catalog);
    let mut archives = Vec::with_capacity(config.num_archives);

    for archive_index in 0..config.num_archives {
        let chunk_length = scheduler.chunk_length(archive_index, rng);
        // Integer floor division; the +1 keeps every archive above the
        // frames-per-iter target.
        let target_entries = (config.frames_per_iter / chunk_length) as usize + 1;
        info!(
            archive = archive_index + 1,
            chunk_length, target_entries, "building archive"
        );

        let mut entries = Vec::with_capacity(target_entries);
        for _ in 0..target_entries {
            let utterance = sampler.sample(chunk_length, rng)?;
            let offset = pick_offset(catalog.length(utterance), chunk_length, rng)?;
            entries.push(ChunkEntry { utterance, offset });
        }
        archives.push(Archive {
            chunk_length,
            entries,
        });
    }

    Ok(archives)
}
