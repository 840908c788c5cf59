// Copyright © 2024 blitzbeaver contributors

//! Edit distance kernels over grapheme fingerprints.
//!
//! All kernels keep two DP rows instead of the full matrix; `b` indexes the
//! columns, so callers pass the shorter sequence as `b` when they care about
//! memory.

use std::mem::swap;

use crate::engine::config::EditWeights;

/// Plain Levenshtein distance, every operation costs one.
pub fn edits(a: &[u64], b: &[u64]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ga) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, gb) in b.iter().enumerate() {
            cur[j + 1] = if ga == gb {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(cur[j])
            };
        }
        swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Levenshtein distance when it is at most `bound`, `None` otherwise.
///
/// Stops as soon as every cell of a row exceeds the bound, since row minima
/// never decrease.
pub fn bounded_edits(a: &[u64], b: &[u64], bound: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > bound {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        return Some(a.len().max(b.len()));
    }
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    for (i, ga) in a.iter().enumerate() {
        cur[0] = i + 1;
        let mut row_min = cur[0];
        for (j, gb) in b.iter().enumerate() {
            cur[j + 1] = if ga == gb {
                prev[j]
            } else {
                1 + prev[j].min(prev[j + 1]).min(cur[j])
            };
            row_min = row_min.min(cur[j + 1]);
        }
        if row_min > bound {
            return None;
        }
        swap(&mut prev, &mut cur);
    }
    let result = prev[b.len()];
    (result <= bound).then_some(result)
}

/// Cheapest edit script turning `a` into `b` under the given operation costs.
///
/// Deleting consumes a grapheme of `a`, inserting produces a grapheme of `b`.
pub fn weighted_edits(a: &[u64], b: &[u64], weights: EditWeights) -> f32 {
    let mut prev: Vec<f32> = (0..=b.len())
        .map(|j| cast_len(j) * weights.insertion)
        .collect();
    let mut cur = vec![0.0; b.len() + 1];
    for (i, ga) in a.iter().enumerate() {
        cur[0] = cast_len(i + 1) * weights.deletion;
        for (j, gb) in b.iter().enumerate() {
            cur[j + 1] = if ga == gb {
                prev[j]
            } else {
                (prev[j] + weights.substitution)
                    .min(prev[j + 1] + weights.deletion)
                    .min(cur[j] + weights.insertion)
            };
        }
        swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// Upper bound of [`weighted_edits`]: the cheaper of rewriting everything or
/// substituting the overlap and fixing up the length difference.
pub fn weighted_edits_upper_bound(len_a: usize, len_b: usize, weights: EditWeights) -> f32 {
    let rewrite = cast_len(len_a) * weights.deletion + cast_len(len_b) * weights.insertion;
    let overlap = len_a.min(len_b);
    let substitute = cast_len(overlap) * weights.substitution
        + cast_len(len_a - overlap) * weights.deletion
        + cast_len(len_b - overlap) * weights.insertion;
    rewrite.min(substitute)
}

/// Levenshtein distance together with the length of the longest common
/// substring of the two sequences.
pub fn edits_and_longest_common_substring(a: &[u64], b: &[u64]) -> (usize, usize) {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0; b.len() + 1];
    let mut prev_run = vec![0; b.len() + 1];
    let mut cur_run = vec![0; b.len() + 1];
    let mut longest = 0;
    for (i, ga) in a.iter().enumerate() {
        cur[0] = i + 1;
        cur_run[0] = 0;
        for (j, gb) in b.iter().enumerate() {
            if ga == gb {
                cur[j + 1] = prev[j];
                cur_run[j + 1] = prev_run[j] + 1;
                longest = longest.max(cur_run[j + 1]);
            } else {
                cur[j + 1] = 1 + prev[j].min(prev[j + 1]).min(cur[j]);
                cur_run[j + 1] = 0;
            }
        }
        swap(&mut prev, &mut cur);
        swap(&mut prev_run, &mut cur_run);
    }
    (prev[b.len()], longest)
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn cast_len(len: usize) -> f32 {
    len as f32
}
