// Copyright © 2024 blitzbeaver contributors

use super::config::{RecordScorerConfig, RecordScorerKind};

/// Score of a record that can't be compared at all.
pub const MAX_SCORE: f32 = 1.0;

/// Aggregates per field distances into a record score in `[0, 1]`.
///
/// Fields without a distance are left out, and the weights of the remaining
/// fields are renormalized. When the present fields carry less than
/// `min_weight_ratio` of the total weight the record scores [`MAX_SCORE`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordScorer {
    kind: RecordScorerKind,
    weights: Vec<f32>,
    min_weight_ratio: f32,
}

impl RecordScorer {
    pub fn new(config: &RecordScorerConfig, num_fields: usize) -> Self {
        let weights = match (config.record_scorer, &config.weights) {
            (RecordScorerKind::Average, _) | (_, None) => vec![1.0; num_fields],
            (_, Some(weights)) => weights.clone(),
        };
        Self {
            kind: config.record_scorer,
            weights,
            min_weight_ratio: config.min_weight_ratio,
        }
    }

    pub fn kind(&self) -> RecordScorerKind {
        self.kind
    }

    pub fn score(&self, distances: &[Option<f32>]) -> f32 {
        debug_assert_eq!(distances.len(), self.weights.len());
        let present = || {
            distances
                .iter()
                .zip(&self.weights)
                .filter_map(|(dist, weight)| dist.map(|dist| (dist, *weight)))
        };

        let total_weight: f32 = self.weights.iter().sum();
        let present_weight: f32 = present().map(|(_, weight)| weight).sum();
        if present_weight <= 0.0 || present_weight < self.min_weight_ratio * total_weight {
            return MAX_SCORE;
        }

        let score = match self.kind {
            RecordScorerKind::Average | RecordScorerKind::WeightedAverage => {
                present().map(|(dist, weight)| dist * weight).sum::<f32>() / present_weight
            }
            RecordScorerKind::WeightedQuadratic => {
                let squares: f32 = present().map(|(dist, weight)| (dist * weight).powi(2)).sum();
                let norm: f32 = present().map(|(_, weight)| weight.powi(2)).sum();
                (squares / norm).sqrt()
            }
        };
        score.clamp(0.0, MAX_SCORE)
    }
}
