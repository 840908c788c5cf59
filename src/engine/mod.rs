pub mod error;
pub use self::error::{DynError, DynResult, Error, Result};

pub mod value;
pub use self::value::{Element, ElementKind, FieldSchema, Frame, Record, RecordSchema, Word};

pub mod config;
pub use self::config::{
    AbsentPolicy, ConfigurationError, DistanceMetricConfig, DistanceMetricKind, EditWeights,
    MemoryStrategy, NormalizationConfig, NormalizationScope, RecordScorerConfig,
    RecordScorerKind, ResolverConfig, ResolvingStrategy, TrackerConfig, TrackingConfig,
};

pub mod assignment;
pub mod distance;
pub use self::distance::{DistanceCalculator, DistanceMetric};

pub mod median;
pub use self::median::compute_median_word;

pub mod clustering;
pub use self::clustering::{compute_words_clusters, WordCluster};

pub mod normalization;
pub mod scorer;
pub mod memory;
pub use self::memory::FieldMemory;

pub mod resolver;
pub mod tracker;
pub use self::tracker::{TrackerId, TrackerState};

pub mod diagnostics;
pub use self::diagnostics::{
    CandidateDiagnostics, Diagnostics, FrameDiagnostics, TrackerDiagnostics,
};

pub mod graph;
pub use self::graph::{ChainNode, GraphNode, TrackingChain, TrackingGraph};

pub mod evaluation;

pub mod tracking;
pub use self::tracking::{execute_tracking_process, FrameSummary, TrackingEngine};
