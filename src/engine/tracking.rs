// Copyright © 2024 blitzbeaver contributors

//! Frame by frame construction of the tracking graph.

use id_arena::{Arena, ArenaBehavior};
use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::config::{NormalizationScope, TrackingConfig};
use super::diagnostics::{CandidateDiagnostics, Diagnostics, FrameDiagnostics};
use super::distance::{DistanceCalculator, DistanceMetric};
use super::error::{Error, Result};
use super::graph::{ChainNode, TrackingGraph};
use super::normalization::Normalizer;
use super::resolver::Resolver;
use super::scorer::RecordScorer;
use super::tracker::{RecordScore, Tracker, TrackerId};
use super::value::{Frame, RecordSchema};

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct TrackerHandle {
    arena_id: u32,
    index: usize,
}

impl ArenaBehavior for TrackerHandle {
    type Id = Self;

    fn new_id(arena_id: u32, index: usize) -> Self {
        Self { arena_id, index }
    }

    fn arena_id(handle: Self) -> u32 {
        handle.arena_id
    }

    fn index(handle: Self) -> usize {
        handle.index
    }
}

/// Outcome of one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    pub frame_idx: usize,
    pub num_records: usize,
    pub num_live_trackers: usize,
    pub num_matched: usize,
    pub num_spawned: usize,
}

/// Builds a [`TrackingGraph`] out of frames fed in order.
///
/// Every frame goes through normalization, scoring of all (tracker, record)
/// pairs on the thread pool, resolution, then a single threaded commit:
/// accepted pairs extend their chains and memories, other trackers get a
/// no match entry and leftover records spawn new trackers. Trackers never
/// terminate.
pub struct TrackingEngine {
    schema: RecordSchema,
    config: TrackingConfig,
    calculators: Vec<DistanceCalculator>,
    scorer: RecordScorer,
    resolver: Resolver,
    normalizer: Option<Normalizer>,
    trackers: Arena<Tracker, TrackerHandle>,
    graph: TrackingGraph,
    diagnostics: Option<Diagnostics>,
    pool: ThreadPool,
    next_frame_idx: usize,
}

impl TrackingEngine {
    pub fn new(config: TrackingConfig, schema: RecordSchema) -> Result<Self> {
        if schema.num_fields() == 0 {
            return Err(Error::EmptySchema);
        }
        config.validate(&schema)?;

        let mut pool_builder =
            ThreadPoolBuilder::new().thread_name(|idx| format!("blitzbeaver-scoring-{idx}"));
        if let Some(num_threads) = config.resolve_num_threads()? {
            pool_builder = pool_builder.num_threads(num_threads);
        }
        let pool = pool_builder.build()?;

        let calculators = config
            .distance_metrics
            .iter()
            .map(|metric| DistanceCalculator::new(metric, config.absent_policy))
            .collect();
        let scorer = RecordScorer::new(&config.tracker.record_scorer, schema.num_fields());
        let resolver = Resolver::new(
            config.resolver.resolving_strategy,
            config.tracker.interest_threshold,
        );
        let normalizer = config.normalization.clone().map(|normalization| {
            let metrics = config
                .distance_metrics
                .iter()
                .map(DistanceMetric::from_config)
                .collect();
            Normalizer::new(normalization, metrics)
        });
        let diagnostics = config.record_diagnostics.then(Diagnostics::new);

        Ok(Self {
            schema,
            config,
            calculators,
            scorer,
            resolver,
            normalizer,
            trackers: Arena::new(),
            graph: TrackingGraph::new(),
            diagnostics,
            pool,
            next_frame_idx: 0,
        })
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn num_trackers(&self) -> usize {
        self.trackers.len()
    }

    pub fn trackers(&self) -> impl Iterator<Item = &Tracker> {
        self.trackers.iter().map(|(_, tracker)| tracker)
    }

    pub fn graph(&self) -> &TrackingGraph {
        &self.graph
    }

    /// Clusters tokens over the whole input, for the global normalization
    /// scope. Has no effect with other scopes.
    pub fn prime_normalization<'a>(
        &mut self,
        frames: impl IntoIterator<Item = &'a Frame> + Clone,
    ) {
        if let Some(normalizer) = &mut self.normalizer {
            if normalizer.scope() == NormalizationScope::Global {
                normalizer.prime(frames);
            }
        }
    }

    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameSummary> {
        self.check_frame(frame)?;
        let frame_idx = frame.idx();

        let normalized;
        let frame = match &self.normalizer {
            Some(normalizer) => {
                if normalizer.scope() == NormalizationScope::Global && !normalizer.is_primed() {
                    warn!(
                        "Global normalization was not primed, clustering frame {frame_idx} alone"
                    );
                }
                normalized = normalizer.normalize(frame);
                &normalized
            }
            None => frame,
        };
        if frame.is_empty() {
            warn!("Frame {frame_idx} has no records");
        }
        let num_absent = frame
            .records()
            .filter(|record| record.elements().all(|element| element.is_none()))
            .count();
        if num_absent > 0 {
            warn!("Frame {frame_idx} has {num_absent} records without any value");
        }

        let handles: Vec<TrackerHandle> =
            self.trackers.iter().map(|(handle, _)| handle).collect();
        let scores = self.score_frame(&handles, frame);
        let score_rows: Vec<Vec<f32>> = scores
            .iter()
            .map(|row| row.iter().map(|score| score.score).collect())
            .collect();
        let assignment = self.resolver.resolve(&score_rows, frame.num_records());

        self.graph.push_frame(frame.num_records());
        let mut taken = vec![false; frame.num_records()];
        let mut num_matched = 0;
        for ((handle, row), record_idx) in handles.iter().zip(&scores).zip(&assignment) {
            let tracker = &mut self.trackers[*handle];
            let memory = if self.diagnostics.is_some() {
                tracker.memory_snapshot()
            } else {
                Vec::new()
            };
            if let Some(record_idx) = *record_idx {
                let node = ChainNode::new(frame_idx, record_idx);
                self.graph.extend_chain(tracker.id(), tracker.last_node(), node);
                tracker.extend(frame.record(record_idx), node);
                taken[record_idx] = true;
                num_matched += 1;
            }
            if let Some(diagnostics) = &mut self.diagnostics {
                let accepted = record_idx.map(|record_idx| &row[record_idx]);
                let candidates = row
                    .iter()
                    .enumerate()
                    .filter(|(_, score)| self.resolver.is_eligible(score.score))
                    .map(|(record_idx, score)| CandidateDiagnostics {
                        record_idx,
                        score: score.score,
                        distances: score.distances.clone(),
                    })
                    .collect();
                diagnostics.push(
                    tracker.id(),
                    FrameDiagnostics {
                        frame_idx,
                        matched: record_idx.is_some(),
                        record_idx: *record_idx,
                        score: accepted.map(|score| score.score),
                        distances: accepted
                            .map(|score| score.distances.clone())
                            .unwrap_or_default(),
                        candidates,
                        memory,
                    },
                );
            }
        }

        let mut num_spawned = 0;
        for record_idx in (0..frame.num_records()).filter(|idx| !taken[*idx]) {
            let id = TrackerId::new(frame_idx, num_spawned);
            let node = ChainNode::new(frame_idx, record_idx);
            let tracker = Tracker::spawn(
                id,
                &self.schema,
                &self.config.tracker,
                frame.record(record_idx),
                node,
            );
            self.trackers.alloc(tracker);
            self.graph.start_chain(id, node);
            if let Some(diagnostics) = &mut self.diagnostics {
                diagnostics.push(
                    id,
                    FrameDiagnostics {
                        frame_idx,
                        matched: true,
                        record_idx: Some(record_idx),
                        score: None,
                        distances: Vec::new(),
                        candidates: Vec::new(),
                        memory: Vec::new(),
                    },
                );
            }
            num_spawned += 1;
        }

        self.next_frame_idx += 1;
        let summary = FrameSummary {
            frame_idx,
            num_records: frame.num_records(),
            num_live_trackers: handles.len(),
            num_matched,
            num_spawned,
        };
        debug!(
            "Frame {frame_idx}: {} records, {} live trackers, {num_matched} matched, {num_spawned} spawned",
            summary.num_records, summary.num_live_trackers
        );
        Ok(summary)
    }

    /// Hands out the graph, with diagnostics if they were recorded.
    pub fn finish(mut self) -> TrackingGraph {
        self.graph.diagnostics = self.diagnostics.take();
        info!(
            "Tracking finished: {} frames, {} trackers",
            self.graph.num_frames(),
            self.trackers.len()
        );
        self.graph
    }

    fn check_frame(&self, frame: &Frame) -> Result<()> {
        let frame_idx = frame.idx();
        if frame_idx != self.next_frame_idx {
            return Err(Error::FrameOutOfOrder {
                frame_idx,
                expected: self.next_frame_idx,
            });
        }
        if frame.num_fields() != self.schema.num_fields() {
            return Err(Error::RecordWidthMismatch {
                frame_idx,
                record_idx: 0,
                expected: self.schema.num_fields(),
                actual: frame.num_fields(),
            });
        }
        for (field_idx, field) in self.schema.fields.iter().enumerate() {
            for (record_idx, element) in frame.column(field_idx).iter().enumerate() {
                match element.kind() {
                    Some(kind) if kind != field.kind => {
                        return Err(Error::ElementKindMismatch {
                            frame_idx,
                            record_idx,
                            field: field.name.clone(),
                            expected: field.kind,
                            actual: kind,
                        });
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// Scores every live tracker against every record, one row per tracker.
    fn score_frame(&mut self, handles: &[TrackerHandle], frame: &Frame) -> Vec<Vec<RecordScore>> {
        let calculators = &mut self.calculators;
        let trackers = &self.trackers;
        let scorer = &self.scorer;
        self.pool.install(|| {
            for (field_idx, calculator) in calculators.iter_mut().enumerate() {
                let memory_values = trackers
                    .iter()
                    .flat_map(|(_, tracker)| tracker.memories()[field_idx].comparison_set());
                calculator.prepare(memory_values, frame.column(field_idx));
            }
            let calculators = &*calculators;
            handles
                .par_iter()
                .map(|handle| {
                    let tracker = &trackers[*handle];
                    frame
                        .records()
                        .map(|record| tracker.score(record, calculators, scorer))
                        .collect::<Vec<_>>()
                })
                .collect()
        })
    }
}

/// Runs a whole tracking process over `frames` and returns its graph.
pub fn execute_tracking_process(
    config: TrackingConfig,
    schema: RecordSchema,
    frames: &[Frame],
) -> Result<TrackingGraph> {
    info!(
        "Tracking {} frames with {} fields, resolving strategy {}, memory strategy {}",
        frames.len(),
        schema.num_fields(),
        config.resolver.resolving_strategy,
        config.tracker.memory_strategy
    );
    let mut engine = TrackingEngine::new(config, schema)?;
    engine.prime_normalization(frames);
    for frame in frames {
        engine.process_frame(frame)?;
    }
    Ok(engine.finish())
}
