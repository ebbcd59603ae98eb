//! Weighted random selection over scored candidates.
//!
//! Classic roulette wheel with one twist: scores are shifted so the lowest
//! weight is exactly [`MIN_SELECTION_WEIGHT`], which keeps every candidate
//! selectable no matter how badly it scored. Disliked songs get rare, not
//! extinct.

use rand::Rng;

/// Weight floor after the positivity shift.
pub const MIN_SELECTION_WEIGHT: f64 = 0.01;

/// Pick one entry from `scored` (pairs of caller-side index and raw score)
/// and return its index. O(n) per draw; candidate pools are bounded by the
/// catalog, so a prefix-sum structure would be overkill.
///
/// Returns `None` only for an empty slice.
#[must_use]
pub fn select_weighted<R: Rng + ?Sized>(scored: &[(usize, f64)], rng: &mut R) -> Option<usize> {
    if scored.is_empty() {
        return None;
    }

    let min = scored
        .iter()
        .map(|&(_, score)| score)
        .fold(f64::INFINITY, f64::min);
    let shift = MIN_SELECTION_WEIGHT - min;
    let total: f64 = scored.iter().map(|&(_, score)| score + shift).sum();

    let mut remainder = rng.gen_range(0.0..total);
    for &(index, score) in scored {
        remainder -= score + shift;
        if remainder <= 0.0 {
            return Some(index);
        }
    }

    // Floating-point slack can leave a hair of remainder after the walk.
    scored.last().map(|&(index, _)| index)
}
