//! Stratified train/evaluation split
//!
//! Each class keeps at least one row on both sides of the split, so the
//! training partition always contains both classes.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices for each partition, in ascending order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub eval: Vec<usize>,
}

/// Splits rows by 0/1 target, holding out roughly `eval_fraction` of each
/// class. Returns `None` when a class has fewer than two rows.
///
/// The shuffle is seeded, so the same labels and seed give the same split.
pub fn stratified_split(targets: &[f64], eval_fraction: f64, seed: u64) -> Option<Split> {
    let mut positives: Vec<usize> = Vec::new();
    let mut negatives: Vec<usize> = Vec::new();
    for (idx, target) in targets.iter().enumerate() {
        if *target >= 0.5 {
            positives.push(idx);
        } else {
            negatives.push(idx);
        }
    }
    if positives.len() < 2 || negatives.len() < 2 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(targets.len()),
        eval: Vec::new(),
    };

    for class in [&mut positives, &mut negatives] {
        class.shuffle(&mut rng);
        let held_out = ((class.len() as f64 * eval_fraction).round() as usize).clamp(1, class.len() - 1);
        split.eval.extend_from_slice(&class[..held_out]);
        split.train.extend_from_slice(&class[held_out..]);
    }

    split.train.sort_unstable();
    split.eval.sort_unstable();
    Some(split)
}
