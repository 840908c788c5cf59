// Copyright © 2024 blitzbeaver contributors

#![allow(clippy::module_name_repetitions)]

use std::env;
use std::fmt;
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};

use super::value::{ElementKind, RecordSchema};

pub const NUM_THREADS_ENV_VAR: &str = "BLITZBEAVER_NUM_THREADS";

const DEFAULT_CACHING_THRESHOLD: u32 = 4;
const DEFAULT_LV_OPTI_CUTOFF: f32 = 0.5;
const DEFAULT_LV_SUBSTRING_WEIGHT: f32 = 0.5;
const DEFAULT_MEMORY_WINDOW: usize = 5;
const DEFAULT_MULTIWORD_SLOT_THRESHOLD: f32 = 0.5;
const DEFAULT_MIN_CLUSTER_SIZE: usize = 2;

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("interest threshold must be in [0, 1], got {0}")]
    InterestThresholdOutOfRange(f32),

    #[error("{name} must be in [0, 1], got {value}")]
    OutOfRange { name: &'static str, value: f32 },

    #[error("unknown distance metric: {0:?}")]
    UnknownDistanceMetric(String),

    #[error("unknown memory strategy: {0:?}")]
    UnknownMemoryStrategy(String),

    #[error("unknown resolving strategy: {0:?}")]
    UnknownResolvingStrategy(String),

    #[error("unknown record scorer: {0:?}")]
    UnknownRecordScorer(String),

    #[error("unknown normalization scope: {0:?}")]
    UnknownNormalizationScope(String),

    #[error("distance metric {metric} cannot compare field {field:?} of kind {kind:?}")]
    MetricFieldKindMismatch {
        field: String,
        metric: DistanceMetricKind,
        kind: ElementKind,
    },

    #[error("expected {expected} {what}, one per schema field, got {actual}")]
    FieldCountMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("record scorer {0} requires field weights")]
    MissingWeights(RecordScorerKind),

    #[error("weight of field {field_idx} must be finite and non-negative, got {weight}")]
    InvalidWeight { field_idx: usize, weight: f32 },

    #[error("field weights must not all be zero")]
    ZeroTotalWeight,

    #[error("{name} must be finite and positive, got {value}")]
    NonPositive { name: &'static str, value: f32 },

    #[error("memory window must hold at least one value")]
    ZeroMemoryWindow,

    #[error("minimal cluster size must be at least one")]
    ZeroMinClusterSize,

    #[error("number of threads must be at least one")]
    ZeroThreads,

    #[error("couldn't parse the value of {name:?} environment variable: {message}")]
    Environment { name: String, message: String },

    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
}

macro_rules! named_strategy {
    (
        $(#[$meta:meta])*
        $name:ident, $unknown:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($(#[$variant_meta])* $variant,)+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConfigurationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ConfigurationError::$unknown(other.to_string())),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = ConfigurationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.name().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_strategy! {
    /// Field level distance metric.
    DistanceMetricKind, UnknownDistanceMetric {
        /// Grapheme Levenshtein distance.
        Lv => "lv",
        /// Levenshtein distance abandoned once it exceeds a cutoff.
        LvOpti => "lv_opti",
        /// Levenshtein distance with a cost per edit operation.
        LvEdit => "lv_edit",
        /// Levenshtein distance discounted by the longest common substring.
        LvSubstring => "lv_substring",
        /// Token alignment of two word lists.
        LvMultiword => "lv_multiword",
    }
}

impl DistanceMetricKind {
    pub fn supports(self, kind: ElementKind) -> bool {
        match kind {
            ElementKind::String => self != Self::LvMultiword,
            ElementKind::MultiStrings => self == Self::LvMultiword,
        }
    }

    /// Metric used when none is configured for a field of the given kind.
    pub fn default_for(kind: ElementKind) -> Self {
        match kind {
            ElementKind::String => Self::Lv,
            ElementKind::MultiStrings => Self::LvMultiword,
        }
    }
}

named_strategy! {
    /// How a tracker summarizes the values it has matched so far.
    MemoryStrategy, UnknownMemoryStrategy {
        BruteForce => "bruteforce",
        MostFrequent => "mostfrequent",
        Median => "median",
        LsBruteForce => "ls-bruteforce",
        LsMostFrequent => "ls-mostfrequent",
        LsMedian => "ls-median",
        MwBruteForce => "mw-bruteforce",
        MwMostFrequent => "mw-mostfrequent",
        MwMedian => "mw-median",
    }
}

/// Summary kept over the retained values, independent of windowing or token splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryKind {
    BruteForce,
    MostFrequent,
    Median,
}

impl MemoryStrategy {
    pub fn kind(self) -> MemoryKind {
        match self {
            Self::BruteForce | Self::LsBruteForce | Self::MwBruteForce => MemoryKind::BruteForce,
            Self::MostFrequent | Self::LsMostFrequent | Self::MwMostFrequent => {
                MemoryKind::MostFrequent
            }
            Self::Median | Self::LsMedian | Self::MwMedian => MemoryKind::Median,
        }
    }

    pub fn is_windowed(self) -> bool {
        matches!(
            self,
            Self::LsBruteForce | Self::LsMostFrequent | Self::LsMedian
        )
    }

    pub fn is_per_token(self) -> bool {
        matches!(
            self,
            Self::MwBruteForce | Self::MwMostFrequent | Self::MwMedian
        )
    }
}

named_strategy! {
    /// Decides the accepted (tracker, record) pairs of a frame.
    ResolvingStrategy, UnknownResolvingStrategy {
        Simple => "simple",
        BestMatch => "best-match",
    }
}

named_strategy! {
    /// Aggregation of per-field distances into a record score.
    RecordScorerKind, UnknownRecordScorer {
        Average => "average",
        WeightedAverage => "weighted-average",
        WeightedQuadratic => "weighted-quadratic",
    }
}

named_strategy! {
    /// Set of tokens clustered together by the normalization pre-pass.
    NormalizationScope, UnknownNormalizationScope {
        /// Tokens of one frame.
        Frame => "frame",
        /// Tokens of all frames of the run.
        Global => "global",
    }
}

/// Costs of the three edit operations of `lv_edit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditWeights {
    pub insertion: f32,
    pub deletion: f32,
    pub substitution: f32,
}

impl Default for EditWeights {
    fn default() -> Self {
        Self {
            insertion: 1.0,
            deletion: 1.0,
            substitution: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMetricConfig {
    pub metric: DistanceMetricKind,
    #[serde(default = "default_caching_threshold")]
    pub caching_threshold: u32,
    #[serde(default)]
    pub lv_opti_cutoff: Option<f32>,
    #[serde(default)]
    pub lv_edit_weights: Option<EditWeights>,
    #[serde(default)]
    pub lv_substring_weight: Option<f32>,
}

fn default_caching_threshold() -> u32 {
    DEFAULT_CACHING_THRESHOLD
}

impl DistanceMetricConfig {
    pub fn new(metric: DistanceMetricKind) -> Self {
        Self {
            metric,
            caching_threshold: DEFAULT_CACHING_THRESHOLD,
            lv_opti_cutoff: None,
            lv_edit_weights: None,
            lv_substring_weight: None,
        }
    }

    pub fn lv_opti_cutoff(&self) -> f32 {
        self.lv_opti_cutoff.unwrap_or(DEFAULT_LV_OPTI_CUTOFF)
    }

    pub fn lv_edit_weights(&self) -> EditWeights {
        self.lv_edit_weights.unwrap_or_default()
    }

    pub fn lv_substring_weight(&self) -> f32 {
        self.lv_substring_weight
            .unwrap_or(DEFAULT_LV_SUBSTRING_WEIGHT)
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if let Some(cutoff) = self.lv_opti_cutoff {
            check_unit_interval("lv_opti_cutoff", cutoff)?;
        }
        if let Some(weight) = self.lv_substring_weight {
            check_unit_interval("lv_substring_weight", weight)?;
        }
        if let Some(weights) = self.lv_edit_weights {
            for (name, value) in [
                ("insertion weight", weights.insertion),
                ("deletion weight", weights.deletion),
                ("substitution weight", weights.substitution),
            ] {
                if !value.is_finite() || value <= 0.0 {
                    return Err(ConfigurationError::NonPositive { name, value });
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordScorerConfig {
    pub record_scorer: RecordScorerKind,
    #[serde(default)]
    pub weights: Option<Vec<f32>>,
    #[serde(default)]
    pub min_weight_ratio: f32,
}

impl Default for RecordScorerConfig {
    fn default() -> Self {
        Self {
            record_scorer: RecordScorerKind::Average,
            weights: None,
            min_weight_ratio: 0.0,
        }
    }
}

impl RecordScorerConfig {
    pub fn weighted(record_scorer: RecordScorerKind, weights: Vec<f32>) -> Self {
        Self {
            record_scorer,
            weights: Some(weights),
            min_weight_ratio: 0.0,
        }
    }

    fn validate(&self, num_fields: usize) -> Result<(), ConfigurationError> {
        check_unit_interval("min_weight_ratio", self.min_weight_ratio)?;
        let weights = match (self.record_scorer, &self.weights) {
            (RecordScorerKind::Average, _) => return Ok(()),
            (kind, None) => return Err(ConfigurationError::MissingWeights(kind)),
            (_, Some(weights)) => weights,
        };
        if weights.len() != num_fields {
            return Err(ConfigurationError::FieldCountMismatch {
                what: "weights",
                expected: num_fields,
                actual: weights.len(),
            });
        }
        for (field_idx, &weight) in weights.iter().enumerate() {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigurationError::InvalidWeight { field_idx, weight });
            }
        }
        if weights.iter().all(|w| *w == 0.0) {
            return Err(ConfigurationError::ZeroTotalWeight);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub interest_threshold: f32,
    pub memory_strategy: MemoryStrategy,
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,
    #[serde(default = "default_multiword_slot_threshold")]
    pub multiword_slot_threshold: f32,
    #[serde(default)]
    pub record_scorer: RecordScorerConfig,
}

fn default_memory_window() -> usize {
    DEFAULT_MEMORY_WINDOW
}

fn default_multiword_slot_threshold() -> f32 {
    DEFAULT_MULTIWORD_SLOT_THRESHOLD
}

impl TrackerConfig {
    pub fn new(interest_threshold: f32, memory_strategy: MemoryStrategy) -> Self {
        Self {
            interest_threshold,
            memory_strategy,
            memory_window: DEFAULT_MEMORY_WINDOW,
            multiword_slot_threshold: DEFAULT_MULTIWORD_SLOT_THRESHOLD,
            record_scorer: RecordScorerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub resolving_strategy: ResolvingStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            resolving_strategy: ResolvingStrategy::Simple,
        }
    }
}

/// Distance assigned when a value is absent on either side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbsentPolicy {
    /// The field is left out of the record score.
    #[default]
    Exclude,
    /// The field counts with this distance; two absent values are identical.
    Fixed(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationConfig {
    pub threshold_cluster_match: f32,
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,
    #[serde(default = "default_normalization_scope")]
    pub scope: NormalizationScope,
}

fn default_min_cluster_size() -> usize {
    DEFAULT_MIN_CLUSTER_SIZE
}

fn default_normalization_scope() -> NormalizationScope {
    NormalizationScope::Frame
}

impl NormalizationConfig {
    pub fn new(threshold_cluster_match: f32) -> Self {
        Self {
            threshold_cluster_match,
            min_cluster_size: DEFAULT_MIN_CLUSTER_SIZE,
            scope: NormalizationScope::Frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    #[serde(default)]
    pub num_threads: Option<usize>,
    pub tracker: TrackerConfig,
    pub distance_metrics: Vec<DistanceMetricConfig>,
    #[serde(default)]
    pub absent_policy: AbsentPolicy,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub normalization: Option<NormalizationConfig>,
    #[serde(default = "default_record_diagnostics")]
    pub record_diagnostics: bool,
}

fn default_record_diagnostics() -> bool {
    true
}

impl TrackingConfig {
    pub fn new(tracker: TrackerConfig, distance_metrics: Vec<DistanceMetricConfig>) -> Self {
        Self {
            num_threads: None,
            tracker,
            distance_metrics,
            absent_policy: AbsentPolicy::default(),
            resolver: ResolverConfig::default(),
            normalization: None,
            record_diagnostics: true,
        }
    }

    /// Configuration using the default metric of each field kind.
    pub fn for_schema(schema: &RecordSchema, tracker: TrackerConfig) -> Self {
        let distance_metrics = schema
            .fields
            .iter()
            .map(|field| DistanceMetricConfig::new(DistanceMetricKind::default_for(field.kind)))
            .collect();
        Self::new(tracker, distance_metrics)
    }

    #[must_use]
    pub fn with_resolver(mut self, resolving_strategy: ResolvingStrategy) -> Self {
        self.resolver = ResolverConfig { resolving_strategy };
        self
    }

    #[must_use]
    pub fn with_normalization(mut self, normalization: NormalizationConfig) -> Self {
        self.normalization = Some(normalization);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks ranges and the pairing of metrics with the schema.
    pub fn validate(&self, schema: &RecordSchema) -> Result<(), ConfigurationError> {
        let threshold = self.tracker.interest_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigurationError::InterestThresholdOutOfRange(threshold));
        }
        if self.tracker.memory_window == 0 {
            return Err(ConfigurationError::ZeroMemoryWindow);
        }
        check_unit_interval(
            "multiword_slot_threshold",
            self.tracker.multiword_slot_threshold,
        )?;
        self.tracker.record_scorer.validate(schema.num_fields())?;

        if self.distance_metrics.len() != schema.num_fields() {
            return Err(ConfigurationError::FieldCountMismatch {
                what: "distance metrics",
                expected: schema.num_fields(),
                actual: self.distance_metrics.len(),
            });
        }
        for (field, metric) in schema.fields.iter().zip(&self.distance_metrics) {
            if !metric.metric.supports(field.kind) {
                return Err(ConfigurationError::MetricFieldKindMismatch {
                    field: field.name.clone(),
                    metric: metric.metric,
                    kind: field.kind,
                });
            }
            metric.validate()?;
        }

        if let AbsentPolicy::Fixed(value) = self.absent_policy {
            check_unit_interval("absent distance", value)?;
        }
        if let Some(normalization) = &self.normalization {
            check_unit_interval(
                "threshold_cluster_match",
                normalization.threshold_cluster_match,
            )?;
            if normalization.min_cluster_size == 0 {
                return Err(ConfigurationError::ZeroMinClusterSize);
            }
        }
        if self.num_threads == Some(0) {
            return Err(ConfigurationError::ZeroThreads);
        }
        Ok(())
    }

    /// Number of scoring threads, from the configuration or the environment.
    pub fn resolve_num_threads(&self) -> Result<Option<usize>, ConfigurationError> {
        let num_threads = match self.num_threads {
            Some(num_threads) => Some(num_threads),
            None => parse_env_var::<usize>(NUM_THREADS_ENV_VAR)?,
        };
        if num_threads == Some(0) {
            return Err(ConfigurationError::ZeroThreads);
        }
        if let Some(num_threads) = num_threads {
            info!("Scoring with {num_threads} threads");
        }
        Ok(num_threads)
    }
}

fn check_unit_interval(name: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigurationError::OutOfRange { name, value })
    }
}

fn parse_env_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigurationError>
where
    T::Err: fmt::Display,
{
    let Some(value) = env::var_os(name) else {
        return Ok(None);
    };
    let value = value
        .into_string()
        .map_err(|_| ConfigurationError::Environment {
            name: name.to_string(),
            message: "not a UTF-8 string".to_string(),
        })?;
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|err: T::Err| ConfigurationError::Environment {
            name: name.to_string(),
            message: err.to_string(),
        })
}
