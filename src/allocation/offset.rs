use rand::Rng;

use crate::{AllocError, Result};

/// Pick a uniformly random starting offset for a chunk of `chunk_length`
/// frames inside an utterance of `utt_length` frames.
///
/// The sampler only hands back utterances at least `chunk_length` long, so
/// a violation here is a caller bug, not user error.
pub fn pick_offset(utt_length: u64, chunk_length: u64, rng: &mut impl Rng) -> Result<u64> {
    if chunk_length > utt_length {
        return Err(AllocError::Invariant(format!(
            "chunk length {} exceeds utterance length {}",
            chunk_length, utt_length
        )));
    }
    let free_length = utt_length - chunk_length;
    Ok(rng.gen_range(0..=free_length))
}
