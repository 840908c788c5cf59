// Copyright © 2024 blitzbeaver contributors

use std::collections::BTreeSet;

use itertools::Itertools as _;
use rayon::prelude::*;

use super::distance::DistanceMetric;
use super::median::compute_median_word;
use super::value::Word;

/// Group of near-duplicate tokens and the word standing in for all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCluster {
    pub representative: Word,
    /// Distinct members, sorted.
    pub members: Vec<Word>,
}

/// Clusters the distinct tokens of `words`.
///
/// Two tokens end up in the same cluster when a chain of pairs at distance at
/// most `threshold` links them. Clusters smaller than `min_cluster_size` are
/// dropped. The representative is the median word of every occurrence of the
/// members, so frequent spellings weigh more. Clusters are ordered by their
/// smallest member.
pub fn compute_words_clusters(
    words: &[Word],
    metric: &DistanceMetric,
    threshold: f32,
    min_cluster_size: usize,
) -> Vec<WordCluster> {
    let distinct: Vec<&Word> = words.iter().collect::<BTreeSet<_>>().into_iter().collect();

    let close_pairs: Vec<(usize, usize)> = (0..distinct.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let distinct = &distinct;
            (i + 1..distinct.len())
                .filter(move |&j| metric.word_distance(distinct[i], distinct[j]) <= threshold)
                .map(move |j| (i, j))
        })
        .collect();

    let mut sets = DisjointSets::new(distinct.len());
    for (i, j) in close_pairs {
        sets.union(i, j);
    }

    let groups = (0..distinct.len()).into_group_map_by(|&i| sets.find(i));
    groups
        .into_values()
        .filter(|members| members.len() >= min_cluster_size)
        .sorted_by_key(|members| members.iter().min().copied())
        .filter_map(|members| {
            let members: Vec<Word> = members
                .into_iter()
                .sorted()
                .map(|i| distinct[i].clone())
                .collect();
            let occurrences: Vec<Word> = words
                .iter()
                .filter(|word| members.binary_search(*word).is_ok())
                .cloned()
                .collect();
            let representative = compute_median_word(&occurrences)?;
            Some(WordCluster {
                representative,
                members,
            })
        })
        .collect()
}

/// Union-find with path halving, the root is always the smallest index.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut idx: usize) -> usize {
        while self.parent[idx] != idx {
            self.parent[idx] = self.parent[self.parent[idx]];
            idx = self.parent[idx];
        }
        idx
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}
