// Copyright © 2024 blitzbeaver contributors

use crate::engine::assignment::min_cost_assignment;
use crate::engine::value::Word;

use super::levenshtein::cast_len;

/// Distance between two token lists.
///
/// Tokens are paired by a minimum cost assignment on `token_distance`, every
/// token left without a partner costs the maximal distance of one, and the
/// total is divided by the length of the longer list. The lists are put in a
/// canonical order first so that the floating point sum does not depend on
/// the argument order.
pub fn token_alignment_distance(
    a: &[Word],
    b: &[Word],
    token_distance: impl Fn(&Word, &Word) -> f32,
) -> f32 {
    let (a, b) = if b < a { (b, a) } else { (a, b) };
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    if a.is_empty() || b.is_empty() {
        return 1.0;
    }

    let costs: Vec<Vec<f64>> = a
        .iter()
        .map(|wa| {
            b.iter()
                .map(|wb| f64::from(token_distance(wa, wb)))
                .collect()
        })
        .collect();

    let mut total = 0.0_f64;
    let mut matched = 0;
    for (row, col) in min_cost_assignment(&costs).into_iter().enumerate() {
        if let Some(col) = col {
            total += costs[row][col];
            matched += 1;
        }
    }
    #[allow(clippy::cast_possible_truncation)]
    let total = total as f32;
    (total + cast_len(longest - matched)) / cast_len(longest)
}
