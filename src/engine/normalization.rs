// Copyright © 2024 blitzbeaver contributors

use std::collections::HashMap;

use log::{debug, warn};

use super::clustering::compute_words_clusters;
use super::config::{NormalizationConfig, NormalizationScope};
use super::distance::DistanceMetric;
use super::value::{Element, Frame, Word};

/// Token replacements of one field.
type Replacements = HashMap<Word, Word>;

/// Replaces near-duplicate tokens with the representative of their cluster.
///
/// Only the values used for scoring and memory updates are rewritten; record
/// indices stay those of the input frame.
#[derive(Debug)]
pub struct Normalizer {
    config: NormalizationConfig,
    metrics: Vec<DistanceMetric>,
    global: Option<Vec<Replacements>>,
}

impl Normalizer {
    pub fn new(config: NormalizationConfig, metrics: Vec<DistanceMetric>) -> Self {
        Self {
            config,
            metrics,
            global: None,
        }
    }

    pub fn scope(&self) -> NormalizationScope {
        self.config.scope
    }

    pub fn is_primed(&self) -> bool {
        self.global.is_some()
    }

    /// Clusters the tokens of all `frames` at once, for the global scope.
    pub fn prime<'a>(&mut self, frames: impl IntoIterator<Item = &'a Frame> + Clone) {
        let replacements = (0..self.metrics.len())
            .map(|field_idx| {
                let tokens: Vec<Word> = frames
                    .clone()
                    .into_iter()
                    .flat_map(|frame| frame.column(field_idx))
                    .flat_map(Element::words)
                    .cloned()
                    .collect();
                self.replacements(field_idx, &tokens)
            })
            .collect();
        self.global = Some(replacements);
    }

    pub fn normalize(&self, frame: &Frame) -> Frame {
        let columns = (0..frame.num_fields())
            .map(|field_idx| {
                let column = frame.column(field_idx);
                let local;
                let replacements = match &self.global {
                    Some(global) => &global[field_idx],
                    None => {
                        let tokens: Vec<Word> =
                            column.iter().flat_map(Element::words).cloned().collect();
                        local = self.replacements(field_idx, &tokens);
                        &local
                    }
                };
                column
                    .iter()
                    .map(|element| {
                        element.map_words(|word| {
                            replacements.get(word).unwrap_or(word).clone()
                        })
                    })
                    .collect()
            })
            .collect();
        frame.with_columns(columns)
    }

    fn replacements(&self, field_idx: usize, tokens: &[Word]) -> Replacements {
        let clusters = compute_words_clusters(
            tokens,
            &self.metrics[field_idx],
            self.config.threshold_cluster_match,
            self.config.min_cluster_size,
        );
        if clusters.is_empty() && !tokens.is_empty() {
            warn!("Normalization of field {field_idx} found no cluster");
        }
        debug!(
            "Normalization of field {field_idx}: {} tokens, {} clusters",
            tokens.len(),
            clusters.len()
        );
        clusters
            .into_iter()
            .flat_map(|cluster| {
                let representative = cluster.representative;
                let kept = representative.clone();
                cluster
                    .members
                    .into_iter()
                    .filter(move |member| *member != kept)
                    .map(move |member| (member, representative.clone()))
            })
            .collect()
    }
}
