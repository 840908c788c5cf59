// Copyright © 2024 blitzbeaver contributors

use super::helpers::assert_close;

use blitzbeaver_engine::engine::scorer::{RecordScorer, MAX_SCORE};
use blitzbeaver_engine::engine::{RecordScorerConfig, RecordScorerKind};

#[test]
fn test_average() {
    let scorer = RecordScorer::new(&RecordScorerConfig::default(), 2);
    assert_close(scorer.score(&[Some(0.2), Some(0.4)]), 0.3);
    assert_close(scorer.score(&[Some(0.2), None]), 0.2);
    assert_close(scorer.score(&[Some(0.0), Some(0.0)]), 0.0);
}

#[test]
fn test_all_fields_absent() {
    let scorer = RecordScorer::new(&RecordScorerConfig::default(), 3);
    assert_eq!(scorer.score(&[None, None, None]), MAX_SCORE);
}

#[test]
fn test_weighted_average() {
    let config = RecordScorerConfig::weighted(RecordScorerKind::WeightedAverage, vec![3.0, 1.0]);
    let scorer = RecordScorer::new(&config, 2);
    assert_close(scorer.score(&[Some(0.2), Some(0.6)]), 0.3);
    assert_close(scorer.score(&[None, Some(0.6)]), 0.6);
}

#[test]
fn test_weighted_quadratic_penalizes_outliers() {
    let config = RecordScorerConfig::weighted(RecordScorerKind::WeightedQuadratic, vec![1.0, 1.0]);
    let quadratic = RecordScorer::new(&config, 2);
    let average = RecordScorer::new(&RecordScorerConfig::default(), 2);

    assert_close(quadratic.score(&[Some(1.0), Some(0.0)]), 0.5_f32.sqrt());
    assert!(quadratic.score(&[Some(1.0), Some(0.0)]) > average.score(&[Some(1.0), Some(0.0)]));
    assert_close(quadratic.score(&[Some(0.4), Some(0.4)]), 0.4);
}

#[test]
fn test_min_weight_ratio() {
    let mut config = RecordScorerConfig::weighted(RecordScorerKind::WeightedAverage, vec![1.0, 1.0]);
    config.min_weight_ratio = 0.6;
    let scorer = RecordScorer::new(&config, 2);
    assert_eq!(scorer.score(&[Some(0.1), None]), MAX_SCORE);
    assert_close(scorer.score(&[Some(0.1), Some(0.3)]), 0.2);
}

#[test]
fn test_zero_weight_fields_do_not_count() {
    let config = RecordScorerConfig::weighted(RecordScorerKind::WeightedAverage, vec![1.0, 0.0]);
    let scorer = RecordScorer::new(&config, 2);
    assert_close(scorer.score(&[Some(0.2), Some(0.9)]), 0.2);
    assert_eq!(scorer.score(&[None, Some(0.9)]), MAX_SCORE);
}
