// Copyright © 2024 blitzbeaver contributors

use super::assignment::min_cost_assignment;
use super::config::ResolvingStrategy;

/// Picks the accepted (tracker, record) pairs of one frame from the score
/// matrix.
///
/// Rows are trackers in ascending id order, columns are records. A pair is
/// eligible when its score is at most the interest threshold. Every tracker
/// and every record ends up in at most one pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolver {
    strategy: ResolvingStrategy,
    interest_threshold: f32,
}

impl Resolver {
    pub fn new(strategy: ResolvingStrategy, interest_threshold: f32) -> Self {
        Self {
            strategy,
            interest_threshold,
        }
    }

    pub fn strategy(&self) -> ResolvingStrategy {
        self.strategy
    }

    pub fn is_eligible(&self, score: f32) -> bool {
        score <= self.interest_threshold
    }

    /// Record accepted for every tracker row.
    pub fn resolve(&self, scores: &[Vec<f32>], num_records: usize) -> Vec<Option<usize>> {
        if num_records == 0 {
            return vec![None; scores.len()];
        }
        match self.strategy {
            ResolvingStrategy::Simple => self.resolve_simple(scores, num_records),
            ResolvingStrategy::BestMatch => self.resolve_best_match(scores),
        }
    }

    /// First fit in tracker order, each tracker taking its best remaining
    /// record; the lowest record index wins ties.
    fn resolve_simple(&self, scores: &[Vec<f32>], num_records: usize) -> Vec<Option<usize>> {
        let mut taken = vec![false; num_records];
        scores
            .iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .filter(|(record_idx, score)| !taken[*record_idx] && self.is_eligible(**score))
                    .min_by(|(ia, sa), (ib, sb)| sa.total_cmp(sb).then_with(|| ia.cmp(ib)))
                    .map(|(record_idx, _)| record_idx);
                if let Some(record_idx) = best {
                    taken[record_idx] = true;
                }
                best
            })
            .collect()
    }

    /// Globally optimal assignment over the eligible pairs. Eligible pairs
    /// cost their score minus one, the others nothing, so the assignment
    /// prefers many good matches and ineligible pairs it picks are dropped.
    fn resolve_best_match(&self, scores: &[Vec<f32>]) -> Vec<Option<usize>> {
        let costs: Vec<Vec<f64>> = scores
            .iter()
            .map(|row| {
                row.iter()
                    .map(|&score| {
                        if self.is_eligible(score) {
                            f64::from(score) - 1.0
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();
        min_cost_assignment(&costs)
            .into_iter()
            .zip(scores)
            .map(|(record_idx, row)| record_idx.filter(|&idx| self.is_eligible(row[idx])))
            .collect()
    }
}
