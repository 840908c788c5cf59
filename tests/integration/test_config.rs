// Copyright © 2024 blitzbeaver contributors

use super::helpers::{names_config, names_schema, person_schema};

use assert_matches::assert_matches;

use blitzbeaver_engine::engine::{
    execute_tracking_process, AbsentPolicy, ConfigurationError, DistanceMetricConfig,
    DistanceMetricKind, Element, ElementKind, Error, Frame, MemoryStrategy, NormalizationConfig,
    NormalizationScope, RecordSchema, RecordScorerConfig, RecordScorerKind, ResolvingStrategy,
    TrackingConfig, TrackingEngine,
};

const PERSON_CONFIG: &str = r#"{
    "num_threads": 2,
    "tracker": {
        "interest_threshold": 0.4,
        "memory_strategy": "mw-median",
        "memory_window": 3,
        "record_scorer": {
            "record_scorer": "weighted-quadratic",
            "weights": [0.7, 0.3]
        }
    },
    "distance_metrics": [
        {"metric": "lv_edit", "lv_edit_weights": {"insertion": 1.0, "deletion": 1.0, "substitution": 0.5}},
        {"metric": "lv_multiword"}
    ],
    "absent_policy": {"fixed": 0.5},
    "resolver": {"resolving_strategy": "best-match"},
    "normalization": {"threshold_cluster_match": 0.2, "scope": "global"}
}"#;

#[test]
fn test_parse_json_config() -> eyre::Result<()> {
    let config = TrackingConfig::from_json(PERSON_CONFIG)?;
    config.validate(&person_schema())?;

    assert_eq!(config.num_threads, Some(2));
    assert_eq!(config.tracker.memory_strategy, MemoryStrategy::MwMedian);
    assert_eq!(config.tracker.memory_window, 3);
    assert_eq!(
        config.tracker.record_scorer.record_scorer,
        RecordScorerKind::WeightedQuadratic
    );
    assert_eq!(config.distance_metrics[0].metric, DistanceMetricKind::LvEdit);
    assert_eq!(config.distance_metrics[0].lv_edit_weights().substitution, 0.5);
    assert_eq!(config.distance_metrics[1].caching_threshold, 4);
    assert_eq!(config.absent_policy, AbsentPolicy::Fixed(0.5));
    assert_eq!(
        config.resolver.resolving_strategy,
        ResolvingStrategy::BestMatch
    );
    let normalization = config.normalization.expect("normalization is configured");
    assert_eq!(normalization.scope, NormalizationScope::Global);
    assert_eq!(normalization.min_cluster_size, 2);
    assert!(config.record_diagnostics);
    Ok(())
}

#[test]
fn test_defaults() -> eyre::Result<()> {
    let config = TrackingConfig::from_json(
        r#"{
            "tracker": {"interest_threshold": 0.3, "memory_strategy": "bruteforce"},
            "distance_metrics": [{"metric": "lv"}]
        }"#,
    )?;
    assert_eq!(config, names_config(0.3, MemoryStrategy::BruteForce));

    let mut config = config;
    config.num_threads = Some(3);
    assert_eq!(config.resolve_num_threads()?, Some(3));
    Ok(())
}

#[test]
fn test_unknown_names() {
    assert_matches!(
        "nope".parse::<DistanceMetricKind>(),
        Err(ConfigurationError::UnknownDistanceMetric(name)) if name == "nope"
    );
    assert_matches!(
        "ls_median".parse::<MemoryStrategy>(),
        Err(ConfigurationError::UnknownMemoryStrategy(_))
    );
    assert_matches!(
        "greedy".parse::<ResolvingStrategy>(),
        Err(ConfigurationError::UnknownResolvingStrategy(_))
    );
    assert_matches!(
        TrackingConfig::from_json(
            r#"{
                "tracker": {"interest_threshold": 0.3, "memory_strategy": "bruteforce"},
                "distance_metrics": [{"metric": "jaro"}]
            }"#
        ),
        Err(ConfigurationError::Json(_))
    );
}

#[test]
fn test_names_round_trip() -> eyre::Result<()> {
    for strategy in MemoryStrategy::ALL {
        assert_eq!(strategy.to_string().parse::<MemoryStrategy>()?, *strategy);
    }
    for metric in DistanceMetricKind::ALL {
        assert_eq!(metric.name().parse::<DistanceMetricKind>()?, *metric);
    }
    Ok(())
}

#[test]
fn test_interest_threshold_out_of_range() {
    let schema = names_schema();
    for threshold in [-0.1, 1.5, f32::NAN] {
        assert_matches!(
            names_config(threshold, MemoryStrategy::Median).validate(&schema),
            Err(ConfigurationError::InterestThresholdOutOfRange(_))
        );
    }
    assert!(names_config(0.0, MemoryStrategy::Median)
        .validate(&schema)
        .is_ok());
    assert!(names_config(1.0, MemoryStrategy::Median)
        .validate(&schema)
        .is_ok());
}

#[test]
fn test_metric_count_must_match_schema() {
    let config = names_config(0.3, MemoryStrategy::Median);
    assert_matches!(
        config.validate(&person_schema()),
        Err(ConfigurationError::FieldCountMismatch { expected: 2, actual: 1, .. })
    );
}

#[test]
fn test_metric_must_support_field_kind() {
    let mut config = names_config(0.3, MemoryStrategy::Median);
    config.distance_metrics = vec![DistanceMetricConfig::new(DistanceMetricKind::LvMultiword)];
    assert_matches!(
        config.validate(&names_schema()),
        Err(ConfigurationError::MetricFieldKindMismatch { .. })
    );
}

#[test]
fn test_weighted_scorers_need_weights() {
    let schema = person_schema();
    let mut config = TrackingConfig::from_json(PERSON_CONFIG).expect("valid configuration");

    config.tracker.record_scorer = RecordScorerConfig {
        record_scorer: RecordScorerKind::WeightedAverage,
        weights: None,
        min_weight_ratio: 0.0,
    };
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::MissingWeights(RecordScorerKind::WeightedAverage))
    );

    config.tracker.record_scorer =
        RecordScorerConfig::weighted(RecordScorerKind::WeightedAverage, vec![1.0]);
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::FieldCountMismatch { expected: 2, actual: 1, .. })
    );

    config.tracker.record_scorer =
        RecordScorerConfig::weighted(RecordScorerKind::WeightedAverage, vec![0.0, 0.0]);
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::ZeroTotalWeight)
    );

    config.tracker.record_scorer =
        RecordScorerConfig::weighted(RecordScorerKind::WeightedAverage, vec![1.0, -1.0]);
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::InvalidWeight { field_idx: 1, .. })
    );
}

#[test]
fn test_invalid_sizes() {
    let schema = names_schema();

    let mut config = names_config(0.3, MemoryStrategy::LsMedian);
    config.tracker.memory_window = 0;
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::ZeroMemoryWindow)
    );

    let mut config = names_config(0.3, MemoryStrategy::Median);
    config.num_threads = Some(0);
    assert_matches!(config.validate(&schema), Err(ConfigurationError::ZeroThreads));

    let mut normalization = NormalizationConfig::new(0.2);
    normalization.min_cluster_size = 0;
    let config = names_config(0.3, MemoryStrategy::Median).with_normalization(normalization);
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::ZeroMinClusterSize)
    );

    let mut config = names_config(0.3, MemoryStrategy::Median);
    config.absent_policy = AbsentPolicy::Fixed(2.0);
    assert_matches!(
        config.validate(&schema),
        Err(ConfigurationError::OutOfRange { .. })
    );
}

#[test]
fn test_engine_rejects_invalid_configuration() {
    assert_matches!(
        TrackingEngine::new(names_config(1.5, MemoryStrategy::Median), names_schema()).err(),
        Some(Error::Configuration(
            ConfigurationError::InterestThresholdOutOfRange(_)
        ))
    );
}

#[test]
fn test_schema_and_frame_checks() {
    assert_matches!(RecordSchema::new(vec![]), Err(Error::EmptySchema));

    let schema = person_schema();
    assert_matches!(
        Frame::from_records(0, &schema, vec![vec![Element::from("martin")]]),
        Err(Error::RecordWidthMismatch {
            record_idx: 0,
            expected: 2,
            actual: 1,
            ..
        })
    );
    assert_matches!(
        Frame::from_records(
            0,
            &schema,
            vec![
                vec![Element::from("martin"), Element::from(vec!["jean"])],
                vec![Element::from("paul"), Element::from("jean")],
            ]
        ),
        Err(Error::ElementKindMismatch {
            record_idx: 1,
            expected: ElementKind::MultiStrings,
            actual: ElementKind::String,
            ..
        })
    );

    let frame = Frame::from_records(
        0,
        &schema,
        vec![vec![Element::None, Element::from(vec!["jean", "paul"])]],
    )
    .expect("absent values conform to any field");
    assert_eq!(frame.num_records(), 1);
}

#[test]
fn test_engine_rejects_empty_schema() -> eyre::Result<()> {
    let schema: RecordSchema = serde_json::from_str(r#"{"fields": []}"#)?;
    let mut config = names_config(1.0, MemoryStrategy::BruteForce);
    config.distance_metrics.clear();

    assert_matches!(
        TrackingEngine::new(config.clone(), schema.clone()).err(),
        Some(Error::EmptySchema)
    );
    assert_matches!(
        execute_tracking_process(config, schema, &[]),
        Err(Error::EmptySchema)
    );
    Ok(())
}
