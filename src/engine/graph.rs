// Copyright © 2024 blitzbeaver contributors

//! Lineage graph of a tracking run.
//!
//! Nodes are addressed by `(frame_idx, record_idx)` and edges are keyed by
//! tracker id, so the graph holds no references and serializes as is. A
//! synthetic root links every tracker to its first record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::diagnostics::{Diagnostics, TrackerDiagnostics};
use super::tracker::TrackerId;

/// Address of a record realizing a tracker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ChainNode {
    pub frame_idx: usize,
    pub record_idx: usize,
}

impl ChainNode {
    pub fn new(frame_idx: usize, record_idx: usize) -> Self {
        Self {
            frame_idx,
            record_idx,
        }
    }
}

/// Edges of one record, or of the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Previous node of every tracker continuing through this record.
    pub ins: SmallVec<[(TrackerId, ChainNode); 1]>,
    /// Next node of every tracker leaving this record.
    pub outs: SmallVec<[(TrackerId, ChainNode); 1]>,
}

impl GraphNode {
    fn next(&self, id: TrackerId) -> Option<ChainNode> {
        self.outs
            .iter()
            .find(|(out_id, _)| *out_id == id)
            .map(|(_, node)| *node)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingGraph {
    pub root: GraphNode,
    /// `matrix[frame_idx][record_idx]`.
    pub matrix: Vec<Vec<GraphNode>>,
    pub diagnostics: Option<Diagnostics>,
}

/// Ordered records of one tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingChain {
    pub id: TrackerId,
    pub nodes: Vec<ChainNode>,
}

impl TrackingChain {
    /// Number of matched frames.
    pub fn length(&self) -> usize {
        self.nodes.len()
    }

    /// Frames from the first to the last match, gaps included.
    pub fn lifespan(&self) -> usize {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => last.frame_idx - first.frame_idx + 1,
            _ => 0,
        }
    }

    pub fn first_frame(&self) -> Option<usize> {
        self.nodes.first().map(|node| node.frame_idx)
    }

    pub fn last_frame(&self) -> Option<usize> {
        self.nodes.last().map(|node| node.frame_idx)
    }

    /// Record matched in `frame_idx`, if any.
    pub fn record_at(&self, frame_idx: usize) -> Option<usize> {
        self.nodes
            .binary_search_by_key(&frame_idx, |node| node.frame_idx)
            .ok()
            .map(|pos| self.nodes[pos].record_idx)
    }
}

impl TrackingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_frames(&self) -> usize {
        self.matrix.len()
    }

    pub fn num_trackers(&self) -> usize {
        self.root.outs.len()
    }

    /// Tracker ids in creation order.
    pub fn tracker_ids(&self) -> impl Iterator<Item = TrackerId> + '_ {
        self.root.outs.iter().map(|(id, _)| *id)
    }

    pub fn node(&self, node: ChainNode) -> Option<&GraphNode> {
        self.matrix.get(node.frame_idx)?.get(node.record_idx)
    }

    /// Walks the chain of `id` from the root. `None` for an unknown tracker.
    pub fn chain(&self, id: TrackerId) -> Option<TrackingChain> {
        let mut nodes = Vec::new();
        let mut next = Some(self.root.next(id)?);
        while let Some(node) = next {
            nodes.push(node);
            next = self.node(node).and_then(|graph_node| graph_node.next(id));
        }
        Some(TrackingChain { id, nodes })
    }

    pub fn chains(&self) -> impl Iterator<Item = TrackingChain> + '_ {
        self.tracker_ids().filter_map(|id| self.chain(id))
    }

    /// Trackers realized by the given record: the one it spawned, if any,
    /// and those continuing through it.
    pub fn trackers_at(&self, frame_idx: usize, record_idx: usize) -> Vec<TrackerId> {
        let at = ChainNode::new(frame_idx, record_idx);
        let Some(node) = self.node(at) else {
            return Vec::new();
        };
        let spawned = self
            .root
            .outs
            .iter()
            .filter(|(_, first)| *first == at)
            .map(|(id, _)| *id);
        let continued = node.ins.iter().map(|(id, _)| *id);
        let mut ids: Vec<TrackerId> = spawned.chain(continued).collect();
        ids.sort_unstable();
        ids
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }

    pub fn tracker_diagnostics(&self, id: TrackerId) -> Option<&TrackerDiagnostics> {
        self.diagnostics.as_ref()?.tracker(id)
    }

    pub(crate) fn push_frame(&mut self, num_records: usize) {
        self.matrix.push(vec![GraphNode::default(); num_records]);
    }

    pub(crate) fn start_chain(&mut self, id: TrackerId, node: ChainNode) {
        self.root.outs.push((id, node));
    }

    pub(crate) fn extend_chain(&mut self, id: TrackerId, from: ChainNode, to: ChainNode) {
        self.matrix[from.frame_idx][from.record_idx]
            .outs
            .push((id, to));
        self.matrix[to.frame_idx][to.record_idx].ins.push((id, from));
    }

    /// Checks that every tracker starts once, in its creation frame, and that
    /// every edge points inside the matrix, forward in time, and is recorded
    /// on both of its ends.
    pub(crate) fn find_invalid_edge(&self) -> Option<String> {
        let in_bounds = |node: &ChainNode| self.node(*node).is_some();
        let mut started = HashSet::new();
        for (id, node) in &self.root.outs {
            if !in_bounds(node) {
                return Some(format!("tracker {id} starts at {node:?} outside the matrix"));
            }
            if node.frame_idx != id.frame_idx {
                return Some(format!("tracker {id} starts at {node:?}, not in its own frame"));
            }
            if !started.insert(*id) {
                return Some(format!("tracker {id} starts more than once"));
            }
        }
        for (frame_idx, frame) in self.matrix.iter().enumerate() {
            for (record_idx, graph_node) in frame.iter().enumerate() {
                let here = ChainNode::new(frame_idx, record_idx);
                let mut leaving = HashSet::new();
                for (id, node) in &graph_node.outs {
                    let linked = self
                        .node(*node)
                        .is_some_and(|next| next.ins.contains(&(*id, here)));
                    if node.frame_idx <= frame_idx || !linked || !leaving.insert(*id) {
                        return Some(format!(
                            "tracker {id} links ({frame_idx}, {record_idx}) to {node:?}"
                        ));
                    }
                }
                for (id, node) in &graph_node.ins {
                    let linked = self
                        .node(*node)
                        .is_some_and(|previous| previous.outs.contains(&(*id, here)));
                    if node.frame_idx >= frame_idx || !linked {
                        return Some(format!(
                            "tracker {id} links {node:?} to ({frame_idx}, {record_idx})"
                        ));
                    }
                }
            }
        }
        None
    }
}
