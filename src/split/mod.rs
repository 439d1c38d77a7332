//! Dataset splitter: partition image ids into two disjoint subsets.
//!
//! The split is computed once per run from a single shuffled permutation
//! and reused for every downstream write, so an image lands in the same
//! subset for its labels and for its relocated file.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};

use crate::error::ConvertError;
use crate::index::ImageId;

/// A disjoint, exhaustive two-way partition of a set of image ids.
///
/// The holdout subset (validation or test) holds the first `floor(N * ratio)`
/// ids of the permutation; the train subset holds the remainder. Subset
/// vectors keep the permutation order.
#[derive(Clone, Debug)]
pub struct SplitAssignment {
    holdout: Vec<ImageId>,
    train: Vec<ImageId>,
    holdout_set: HashSet<ImageId>,
}

impl SplitAssignment {
    /// Ids assigned to the holdout (validation/test) subset.
    pub fn holdout(&self) -> &[ImageId] {
        &self.holdout
    }

    /// Ids assigned to the train subset.
    pub fn train(&self) -> &[ImageId] {
        &self.train
    }

    pub fn is_holdout(&self, id: ImageId) -> bool {
        self.holdout_set.contains(&id)
    }
}

/// Check that a split ratio lies in the open interval (0, 1).
pub fn validate_ratio(ratio: f64) -> Result<(), ConvertError> {
    if !(0.0 < ratio && ratio < 1.0) {
        return Err(ConvertError::InvalidSplitRatio { ratio });
    }
    Ok(())
}

/// Partition `ids` into holdout and train subsets.
///
/// A uniformly random permutation of all ids is drawn, the first
/// `floor(N * ratio)` become the holdout subset, and the rest train. The
/// floor truncation is part of the contract: the holdout size is never
/// rounded up. With a seed the permutation is reproducible.
pub fn split_image_ids(
    ids: &[ImageId],
    ratio: f64,
    seed: Option<u64>,
) -> Result<SplitAssignment, ConvertError> {
    validate_ratio(ratio)?;

    let mut shuffled = ids.to_vec();
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        shuffled.shuffle(&mut rng);
    }

    let holdout_len = (shuffled.len() as f64 * ratio).floor() as usize;
    let train = shuffled.split_off(holdout_len);
    let holdout = shuffled;
    let holdout_set = holdout.iter().copied().collect();

    Ok(SplitAssignment {
        holdout,
        train,
        holdout_set,
    })
}
