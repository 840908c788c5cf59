// Copyright © 2024 blitzbeaver contributors

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::tracker::TrackerId;

/// Eligible record considered by a tracker in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDiagnostics {
    pub record_idx: usize,
    pub score: f32,
    pub distances: Vec<Option<f32>>,
}

/// What happened to a tracker in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameDiagnostics {
    pub frame_idx: usize,
    pub matched: bool,
    pub record_idx: Option<usize>,
    /// Score of the accepted record; `None` on the frame the tracker was
    /// spawned in and on frames without a match.
    pub score: Option<f32>,
    /// Field distances to the accepted record.
    pub distances: Vec<Option<f32>>,
    pub candidates: Vec<CandidateDiagnostics>,
    /// Comparison values of every field when the frame was scored.
    pub memory: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerDiagnostics {
    pub id: TrackerId,
    pub frames: Vec<FrameDiagnostics>,
}

impl TrackerDiagnostics {
    pub fn matched_frames(&self) -> impl Iterator<Item = &FrameDiagnostics> {
        self.frames.iter().filter(|frame| frame.matched)
    }

    pub fn frame(&self, frame_idx: usize) -> Option<&FrameDiagnostics> {
        self.frames
            .binary_search_by_key(&frame_idx, |frame| frame.frame_idx)
            .ok()
            .map(|pos| &self.frames[pos])
    }
}

/// Per tracker history of a run, in tracker creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    trackers: IndexMap<TrackerId, TrackerDiagnostics>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn tracker(&self, id: TrackerId) -> Option<&TrackerDiagnostics> {
        self.trackers.get(&id)
    }

    pub fn trackers(&self) -> impl Iterator<Item = &TrackerDiagnostics> {
        self.trackers.values()
    }

    pub(crate) fn push(&mut self, id: TrackerId, frame: FrameDiagnostics) {
        self.trackers
            .entry(id)
            .or_insert_with(|| TrackerDiagnostics {
                id,
                frames: Vec::new(),
            })
            .frames
            .push(frame);
    }
}
