// Copyright © 2024 blitzbeaver contributors

//! Quality indicators of a finished tracking graph.

use serde::{Deserialize, Serialize};

use super::distance::levenshtein::cast_len;
use super::graph::TrackingGraph;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChainLengthMetrics {
    pub average: f32,
    pub median: f32,
    pub min: usize,
    pub max: usize,
}

/// Per frame ratios of records continuing a chain, and of records claimed by
/// several chains.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphPropertiesMetrics {
    pub match_ratios: Vec<f32>,
    pub conflict_ratios: Vec<f32>,
}

pub fn eval_chain_length(graph: &TrackingGraph) -> ChainLengthMetrics {
    let mut lengths: Vec<usize> = graph.chains().map(|chain| chain.length()).collect();
    if lengths.is_empty() {
        return ChainLengthMetrics::default();
    }
    lengths.sort_unstable();

    let mid = lengths.len() / 2;
    let median = if lengths.len() % 2 == 0 {
        cast_len(lengths[mid - 1] + lengths[mid]) / 2.0
    } else {
        cast_len(lengths[mid])
    };
    ChainLengthMetrics {
        average: cast_len(lengths.iter().sum()) / cast_len(lengths.len()),
        median,
        min: lengths[0],
        max: lengths[lengths.len() - 1],
    }
}

pub fn eval_graph_properties(graph: &TrackingGraph) -> GraphPropertiesMetrics {
    let mut metrics = GraphPropertiesMetrics::default();
    for frame in &graph.matrix {
        let (matches, conflicts) = frame.iter().fold((0, 0), |(matches, conflicts), node| {
            (
                matches + usize::from(!node.ins.is_empty()),
                conflicts + usize::from(node.ins.len() > 1),
            )
        });
        let ratio = |count: usize| {
            if frame.is_empty() {
                0.0
            } else {
                cast_len(count) / cast_len(frame.len())
            }
        };
        metrics.match_ratios.push(ratio(matches));
        metrics.conflict_ratios.push(ratio(conflicts));
    }
    metrics
}
