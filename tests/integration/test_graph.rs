// Copyright © 2024 blitzbeaver contributors

use super::helpers::{assert_close, name_frames, names_config, names_schema};

use blitzbeaver_engine::engine::evaluation::{eval_chain_length, eval_graph_properties};
use blitzbeaver_engine::engine::{
    execute_tracking_process, ChainNode, MemoryStrategy, TrackerId, TrackingChain, TrackingGraph,
};

fn gap_graph() -> eyre::Result<TrackingGraph> {
    let frames = name_frames(&[&["alice"], &["xxxxx"], &["alice"]]);
    Ok(execute_tracking_process(
        names_config(0.3, MemoryStrategy::BruteForce),
        names_schema(),
        &frames,
    )?)
}

#[test]
fn test_lifespan_is_at_least_length() -> eyre::Result<()> {
    let frames = name_frames(&[
        &["martin", "paul", "jean"],
        &["paul"],
        &["martine", "jeanne"],
        &[],
        &["martin", "jean", "pauline"],
    ]);
    let graph = execute_tracking_process(
        names_config(0.35, MemoryStrategy::MostFrequent),
        names_schema(),
        &frames,
    )?;
    assert!(graph.num_trackers() > 0);
    for chain in graph.chains() {
        assert!(chain.length() > 0);
        assert!(chain.lifespan() >= chain.length(), "{chain:?}");
    }
    Ok(())
}

#[test]
fn test_empty_chain() {
    let chain = TrackingChain {
        id: TrackerId::new(0, 0),
        nodes: Vec::new(),
    };
    assert_eq!(chain.length(), 0);
    assert_eq!(chain.lifespan(), 0);
    assert_eq!(chain.first_frame(), None);
}

#[test]
fn test_graph_is_addressable_from_records() -> eyre::Result<()> {
    let graph = gap_graph()?;
    assert_eq!(graph.num_frames(), 3);
    assert_eq!(graph.trackers_at(0, 0), vec![TrackerId::new(0, 0)]);
    assert_eq!(graph.trackers_at(1, 0), vec![TrackerId::new(1, 0)]);
    assert_eq!(graph.trackers_at(2, 0), vec![TrackerId::new(0, 0)]);
    assert!(graph.trackers_at(5, 0).is_empty());

    let node = graph.node(ChainNode::new(2, 0)).expect("node exists");
    assert_eq!(
        node.ins.as_slice(),
        &[(TrackerId::new(0, 0), ChainNode::new(0, 0))]
    );
    assert!(graph.chain(TrackerId::new(7, 0)).is_none());
    Ok(())
}

#[test]
fn test_diagnostics_cover_every_live_frame() -> eyre::Result<()> {
    let graph = gap_graph()?;
    let diagnostics = graph.diagnostics().expect("diagnostics are recorded");
    assert_eq!(diagnostics.len(), 2);
    for tracker in diagnostics.trackers() {
        let frames: Vec<usize> = tracker.frames.iter().map(|frame| frame.frame_idx).collect();
        let first = tracker.id.frame_idx;
        assert_eq!(frames, (first..graph.num_frames()).collect::<Vec<_>>());
        assert_eq!(
            tracker.matched_frames().count(),
            graph.chain(tracker.id).expect("tracker exists").length()
        );
    }
    Ok(())
}

#[test]
fn test_chain_length_metrics() -> eyre::Result<()> {
    let metrics = eval_chain_length(&gap_graph()?);
    assert_close(metrics.average, 1.5);
    assert_close(metrics.median, 1.5);
    assert_eq!(metrics.min, 1);
    assert_eq!(metrics.max, 2);

    let empty = eval_chain_length(&TrackingGraph::new());
    assert_eq!(empty.max, 0);
    Ok(())
}

#[test]
fn test_graph_properties() -> eyre::Result<()> {
    let metrics = eval_graph_properties(&gap_graph()?);
    assert_eq!(metrics.match_ratios, vec![0.0, 0.0, 1.0]);
    assert_eq!(metrics.conflict_ratios, vec![0.0, 0.0, 0.0]);
    Ok(())
}
