//! Train/validation splitting of indexed pairs.

use crate::types::PairEntry;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle entries with a seeded rng and hold out `val_ratio` of them for
/// validation. At least one sample is always held out, matching the split
/// used at training time.
pub fn split_pairs(
    mut entries: Vec<PairEntry>,
    val_ratio: f32,
    seed: u64,
) -> (Vec<PairEntry>, Vec<PairEntry>) {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    entries.shuffle(&mut rng);

    let val_len = ((entries.len() as f32 * val_ratio) as usize).max(1);
    let val_len = val_len.min(entries.len());
    let train = entries.split_off(val_len);
    (train, entries)
}
