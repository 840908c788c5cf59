// Copyright © 2024 blitzbeaver contributors

//! Field level distances, normalized to `[0, 1]` with 0 for identical values.

pub mod cache;
pub mod levenshtein;
pub mod multiword;

use crate::engine::config::{AbsentPolicy, DistanceMetricConfig, DistanceMetricKind, EditWeights};
use crate::engine::value::{Element, Word};

pub use self::cache::DistanceCache;
use self::levenshtein::{
    bounded_edits, cast_len, edits, edits_and_longest_common_substring, weighted_edits,
    weighted_edits_upper_bound,
};
use self::multiword::token_alignment_distance;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMetric {
    Lv,
    LvOpti { cutoff: f32 },
    LvEdit { weights: EditWeights },
    LvSubstring { weight: f32 },
    LvMultiword,
}

impl DistanceMetric {
    pub fn from_config(config: &DistanceMetricConfig) -> Self {
        match config.metric {
            DistanceMetricKind::Lv => Self::Lv,
            DistanceMetricKind::LvOpti => Self::LvOpti {
                cutoff: config.lv_opti_cutoff(),
            },
            DistanceMetricKind::LvEdit => Self::LvEdit {
                weights: config.lv_edit_weights(),
            },
            DistanceMetricKind::LvSubstring => Self::LvSubstring {
                weight: config.lv_substring_weight(),
            },
            DistanceMetricKind::LvMultiword => Self::LvMultiword,
        }
    }

    pub fn kind(&self) -> DistanceMetricKind {
        match self {
            Self::Lv => DistanceMetricKind::Lv,
            Self::LvOpti { .. } => DistanceMetricKind::LvOpti,
            Self::LvEdit { .. } => DistanceMetricKind::LvEdit,
            Self::LvSubstring { .. } => DistanceMetricKind::LvSubstring,
            Self::LvMultiword => DistanceMetricKind::LvMultiword,
        }
    }

    /// Distance between two single words.
    ///
    /// The multiword metric compares its tokens with plain `lv`, so this is
    /// also the token cost of the alignment.
    pub fn word_distance(&self, a: &Word, b: &Word) -> f32 {
        if a == b {
            return 0.0;
        }
        let longest = a.len().max(b.len());
        if longest == 0 {
            return 0.0;
        }
        match *self {
            Self::Lv | Self::LvMultiword => {
                cast_len(edits(a.graphemes(), b.graphemes())) / cast_len(longest)
            }
            Self::LvOpti { cutoff } => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let bound = (cutoff * cast_len(longest)).floor() as usize;
                match bounded_edits(a.graphemes(), b.graphemes(), bound) {
                    Some(edits) => cast_len(edits) / cast_len(longest),
                    None => 1.0,
                }
            }
            Self::LvEdit { weights } => {
                let cost = weighted_edits(a.graphemes(), b.graphemes(), weights)
                    .min(weighted_edits(b.graphemes(), a.graphemes(), weights));
                let bound = weighted_edits_upper_bound(a.len(), b.len(), weights)
                    .min(weighted_edits_upper_bound(b.len(), a.len(), weights));
                (cost / bound).min(1.0)
            }
            Self::LvSubstring { weight } => {
                let (edits, common) = edits_and_longest_common_substring(a.graphemes(), b.graphemes());
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let bonus = (cast_len(common) * weight).floor() as usize;
                cast_len(edits.saturating_sub(bonus)) / cast_len(longest)
            }
        }
    }

    /// Distance between two present elements.
    pub fn element_distance(&self, a: &Element, b: &Element) -> f32 {
        match (a, b) {
            (Element::Word(a), Element::Word(b)) if *self != Self::LvMultiword => {
                self.word_distance(a, b)
            }
            _ => token_alignment_distance(a.words(), b.words(), |x, y| {
                Self::Lv.word_distance(x, y)
            }),
        }
    }
}

/// Distance of one field, with the absent value policy and the per frame
/// cache applied.
#[derive(Debug)]
pub struct DistanceCalculator {
    metric: DistanceMetric,
    absent_policy: AbsentPolicy,
    caching_threshold: u32,
    cache: DistanceCache,
}

impl DistanceCalculator {
    pub fn new(config: &DistanceMetricConfig, absent_policy: AbsentPolicy) -> Self {
        Self {
            metric: DistanceMetric::from_config(config),
            absent_policy,
            caching_threshold: config.caching_threshold,
            cache: DistanceCache::new(),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn cache(&self) -> &DistanceCache {
        &self.cache
    }

    /// Refills the cache with the frequent pairs between the values held in
    /// tracker memories and the values of the incoming frame.
    pub fn prepare<'a>(
        &mut self,
        memory_values: impl IntoIterator<Item = &'a Element>,
        frame_values: impl IntoIterator<Item = &'a Element>,
    ) {
        self.cache.clear();
        if self.metric == DistanceMetric::LvMultiword {
            return;
        }
        let metric = self.metric;
        self.cache.precompute(
            memory_values.into_iter().filter_map(as_word),
            frame_values.into_iter().filter_map(as_word),
            self.caching_threshold,
            |a, b| metric.word_distance(a, b),
        );
    }

    /// Distance between two elements, `None` when the field has to be left
    /// out of the record score.
    pub fn distance(&self, a: &Element, b: &Element) -> Option<f32> {
        match (a.is_none(), b.is_none()) {
            (false, false) => Some(self.present_distance(a, b)),
            (true, true) => match self.absent_policy {
                AbsentPolicy::Exclude => None,
                AbsentPolicy::Fixed(_) => Some(0.0),
            },
            _ => match self.absent_policy {
                AbsentPolicy::Exclude => None,
                AbsentPolicy::Fixed(value) => Some(value),
            },
        }
    }

    /// Smallest distance between `value` and any element of `set`.
    ///
    /// An empty set behaves as an absent value.
    pub fn distance_to_set(&self, set: &[Element], value: &Element) -> Option<f32> {
        if set.is_empty() {
            return self.distance(&Element::None, value);
        }
        set.iter()
            .filter_map(|candidate| self.distance(candidate, value))
            .min_by(f32::total_cmp)
    }

    fn present_distance(&self, a: &Element, b: &Element) -> f32 {
        if let (Element::Word(wa), Element::Word(wb)) = (a, b) {
            if let Some(dist) = self.cache.get(wa, wb) {
                return dist;
            }
        }
        self.metric.element_distance(a, b)
    }
}

fn as_word(element: &Element) -> Option<&Word> {
    match element {
        Element::Word(word) => Some(word),
        _ => None,
    }
}
