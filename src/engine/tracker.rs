// Copyright © 2024 blitzbeaver contributors

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::config::TrackerConfig;
use super::distance::DistanceCalculator;
use super::graph::ChainNode;
use super::memory::FieldMemory;
use super::scorer::RecordScorer;
use super::value::{Record, RecordSchema};

/// Identity of a tracker: the frame it was spawned in and its ordinal among
/// the trackers spawned in that frame. Ordering follows creation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TrackerId {
    pub frame_idx: usize,
    pub slot: usize,
}

impl TrackerId {
    pub fn new(frame_idx: usize, slot: usize) -> Self {
        Self { frame_idx, slot }
    }
}

impl Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.frame_idx, self.slot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackerState {
    /// Spawned from an unmatched record, never matched since.
    Pending,
    /// Matched at least once after being spawned.
    Active,
}

/// Score of a record against a tracker together with the field distances it
/// was aggregated from.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordScore {
    pub score: f32,
    pub distances: Vec<Option<f32>>,
}

/// A hypothesized entity followed across frames.
#[derive(Debug, Clone)]
pub struct Tracker {
    id: TrackerId,
    state: TrackerState,
    memories: Vec<FieldMemory>,
    last_node: ChainNode,
}

impl Tracker {
    /// Spawns a tracker from a record no existing tracker claimed.
    pub fn spawn(
        id: TrackerId,
        schema: &RecordSchema,
        config: &TrackerConfig,
        record: Record<'_>,
        node: ChainNode,
    ) -> Self {
        let memories = schema
            .fields
            .iter()
            .map(|field| {
                FieldMemory::new(
                    config.memory_strategy,
                    field.kind,
                    config.memory_window,
                    config.multiword_slot_threshold,
                )
            })
            .collect();
        let mut tracker = Self {
            id,
            state: TrackerState::Pending,
            memories,
            last_node: node,
        };
        tracker.remember(record);
        tracker
    }

    pub fn id(&self) -> TrackerId {
        self.id
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn memories(&self) -> &[FieldMemory] {
        &self.memories
    }

    /// Node the next match of this tracker links from.
    pub fn last_node(&self) -> ChainNode {
        self.last_node
    }

    pub fn score(
        &self,
        record: Record<'_>,
        calculators: &[DistanceCalculator],
        scorer: &RecordScorer,
    ) -> RecordScore {
        let distances: Vec<Option<f32>> = self
            .memories
            .iter()
            .zip(calculators)
            .zip(record.elements())
            .map(|((memory, calculator), element)| {
                calculator.distance_to_set(memory.comparison_set(), element)
            })
            .collect();
        RecordScore {
            score: scorer.score(&distances),
            distances,
        }
    }

    /// Commits an accepted match.
    pub fn extend(&mut self, record: Record<'_>, node: ChainNode) {
        self.state = TrackerState::Active;
        self.last_node = node;
        self.remember(record);
    }

    /// Comparison values of every field, rendered for diagnostics.
    pub fn memory_snapshot(&self) -> Vec<Vec<String>> {
        self.memories
            .iter()
            .map(|memory| {
                memory
                    .comparison_set()
                    .iter()
                    .map(|element| format!("{element:?}"))
                    .collect()
            })
            .collect()
    }

    fn remember(&mut self, record: Record<'_>) {
        for (memory, element) in self.memories.iter_mut().zip(record.elements()) {
            memory.update(element);
        }
    }
}
